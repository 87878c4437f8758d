use std::sync::Arc;

use anyhow::Result;

use crate::app::core::Application;
use crate::app::services::ApplicationServices;
use crate::config::Catalog;
use crate::config::ClusterArgs;
use crate::config::DaemonArgs;
use crate::k8s::init_kube_client;
use crate::k8s::KubeCluster;
use crate::metrics::build_registry;
use crate::metrics::VersionInfoSink;
use crate::probe::Reconciler;

/// Application builder
pub struct ApplicationBuilder {
    daemon_args: DaemonArgs,
}

impl ApplicationBuilder {
    /// Create new application builder
    pub fn new(daemon_args: DaemonArgs) -> Self {
        Self { daemon_args }
    }

    /// Build complete application
    pub async fn build(self) -> Result<Application> {
        tracing::info!("Building application components...");

        let sink = VersionInfoSink::new()
            .map_err(|e| anyhow::anyhow!("Failed to create version gauge: {e:?}"))?;
        let registry = build_registry(&sink)
            .map_err(|e| anyhow::anyhow!("Failed to build metrics registry: {e:?}"))?;

        let reconciler = Arc::new(build_reconciler(&self.daemon_args.cluster, sink.clone()).await?);

        let services = ApplicationServices {
            reconciler,
            sink,
            registry,
        };

        Ok(Application::new(services, self.daemon_args))
    }
}

/// Load the catalog, connect to the cluster and wire up a [`Reconciler`].
///
/// Any failure here is fatal for the process.
pub async fn build_reconciler(
    cluster_args: &ClusterArgs,
    sink: VersionInfoSink,
) -> Result<Reconciler<KubeCluster>> {
    let catalog = Catalog::load(cluster_args.catalog.catalog_path.as_deref()).map_err(|e| {
        tracing::error!("Failed to load component catalog: {e:?}");
        anyhow::anyhow!("Failed to load component catalog: {e:?}")
    })?;
    tracing::info!(components = catalog.len(), "Component catalog loaded");

    let client = init_kube_client(cluster_args.kubeconfig.clone())
        .await
        .map_err(|e| {
            tracing::error!("Failed to initialize Kubernetes client: {e:?}");
            anyhow::anyhow!("Failed to initialize Kubernetes client: {e:?}")
        })?;

    Ok(Reconciler::new(
        Arc::new(KubeCluster::new(client)),
        Arc::new(catalog),
        cluster_args.namespace.clone(),
        cluster_args.exec_timeout(),
        sink,
    ))
}
