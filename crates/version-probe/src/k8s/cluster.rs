use async_trait::async_trait;
use error_stack::Report;
use error_stack::ResultExt;
use k8s_openapi::api::core::v1::Pod;
use kube::api::AttachParams;
use kube::api::ListParams;
use kube::Api;
use kube::Client;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;

use crate::k8s::ClusterError;
use crate::probe::ContainerResolver;
use crate::probe::PodRef;
use crate::probe::PodResolver;
use crate::probe::RemoteExecutor;

/// Per-stream cap on captured exec output; the rest is read and discarded.
pub(crate) const MAX_OUTPUT_BYTES: u64 = 64 * 1024;

/// Cluster adapter backed by the Kubernetes API.
///
/// The wrapped [`Client`] is a cheap handle; every call builds its own
/// namespaced [`Api`] from a clone of it.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// First name in `names` that starts with `component`.
pub(crate) fn first_matching<'a, I>(names: I, component: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    names.into_iter().find(|name| name.starts_with(component))
}

/// Primary container of a pod: the first one declared in its spec.
pub(crate) fn primary_container(pod: &Pod) -> Option<String> {
    pod.spec
        .as_ref()
        .and_then(|spec| spec.containers.first())
        .map(|container| container.name.clone())
}

async fn read_all<R>(reader: Option<R>) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok(String::new());
    };
    let mut buf = Vec::new();
    (&mut reader).take(MAX_OUTPUT_BYTES).read_to_end(&mut buf).await?;

    let discarded = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
    if discarded > 0 {
        tracing::debug!(discarded, "Exec output exceeded {MAX_OUTPUT_BYTES} bytes, truncated");
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[async_trait]
impl PodResolver for KubeCluster {
    #[tracing::instrument(skip(self))]
    async fn resolve_pod(
        &self,
        namespace: &str,
        component: &str,
    ) -> Result<Option<PodRef>, Report<ClusterError>> {
        let pods = self
            .pods(namespace)
            .list(&ListParams::default())
            .await
            .change_context(ClusterError::ListPodsFailed {
                namespace: namespace.to_string(),
            })?;

        let name = first_matching(
            pods.items
                .iter()
                .filter_map(|pod| pod.metadata.name.as_deref()),
            component,
        );

        Ok(name.map(|name| PodRef {
            name: name.to_string(),
            namespace: namespace.to_string(),
        }))
    }
}

#[async_trait]
impl ContainerResolver for KubeCluster {
    #[tracing::instrument(skip(self), fields(pod_name = %pod.name))]
    async fn resolve_container(
        &self,
        pod: &PodRef,
    ) -> Result<Option<String>, Report<ClusterError>> {
        let spec = self
            .pods(&pod.namespace)
            .get(&pod.name)
            .await
            .change_context(ClusterError::ReadPodFailed {
                pod_name: pod.name.clone(),
                namespace: pod.namespace.clone(),
            })?;

        Ok(primary_container(&spec))
    }
}

#[async_trait]
impl RemoteExecutor for KubeCluster {
    #[tracing::instrument(skip(self, command), fields(pod_name = %pod.name))]
    async fn exec(
        &self,
        pod: &PodRef,
        container: &str,
        command: &str,
    ) -> Result<String, Report<ClusterError>> {
        let exec_error = |message: &str| ClusterError::ExecFailed {
            pod_name: pod.name.clone(),
            container: container.to_string(),
            message: message.to_string(),
        };

        let params = AttachParams::default()
            .container(container)
            .stdin(false)
            .stdout(true)
            .stderr(true);

        let mut attached = self
            .pods(&pod.namespace)
            .exec(&pod.name, vec!["sh", "-c", command], &params)
            .await
            .change_context_lazy(|| exec_error("failed to open exec channel"))?;

        let stdout = attached.stdout();
        let stderr = attached.stderr();
        let (stdout, stderr) = tokio::join!(read_all(stdout), read_all(stderr));
        let stdout = stdout.change_context_lazy(|| exec_error("failed to read stdout"))?;
        let stderr = stderr.change_context_lazy(|| exec_error("failed to read stderr"))?;

        attached
            .join()
            .await
            .change_context_lazy(|| exec_error("exec channel terminated abnormally"))?;

        tracing::debug!(
            stdout_len = stdout.len(),
            stderr_len = stderr.len(),
            "Exec finished"
        );

        Ok(stdout + &stderr)
    }
}
