use thiserror::Error;

/// Errors that can occur while talking to the Kubernetes API.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("Failed to connect to Kubernetes API: {message}")]
    ConnectionFailed { message: String },
    #[error("Failed to list pods in namespace {namespace}")]
    ListPodsFailed { namespace: String },
    #[error("Failed to read pod {pod_name} in namespace {namespace}")]
    ReadPodFailed { pod_name: String, namespace: String },
    #[error("Failed to exec in {pod_name}/{container}: {message}")]
    ExecFailed {
        pod_name: String,
        container: String,
        message: String,
    },
}
