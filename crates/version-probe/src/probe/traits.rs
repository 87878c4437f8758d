//! Seams between the reconciliation cycle and the cluster.

use async_trait::async_trait;
use error_stack::Report;

use super::types::PodRef;
use crate::k8s::ClusterError;

/// Maps a component name to a live pod.
#[async_trait]
pub trait PodResolver: Send + Sync {
    /// First pod in listing order whose name starts with `component`.
    ///
    /// `Ok(None)` means no pod matched; `Err` is a transport or auth failure.
    async fn resolve_pod(
        &self,
        namespace: &str,
        component: &str,
    ) -> Result<Option<PodRef>, Report<ClusterError>>;
}

/// Finds the primary container of a pod.
#[async_trait]
pub trait ContainerResolver: Send + Sync {
    /// Name of the first declared container, `Ok(None)` if the pod has none.
    async fn resolve_container(
        &self,
        pod: &PodRef,
    ) -> Result<Option<String>, Report<ClusterError>>;
}

/// Runs a shell command in a container and captures its output.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Runs `sh -c <command>`; the exit code is not inspected.
    async fn exec(
        &self,
        pod: &PodRef,
        container: &str,
        command: &str,
    ) -> Result<String, Report<ClusterError>>;
}

/// Everything the reconciliation cycle needs from the cluster.
pub trait Cluster: PodResolver + ContainerResolver + RemoteExecutor + 'static {}

impl<T> Cluster for T where T: PodResolver + ContainerResolver + RemoteExecutor + 'static {}
