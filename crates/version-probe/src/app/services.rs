use std::sync::Arc;

use prometheus::Registry;

use crate::k8s::KubeCluster;
use crate::metrics::VersionInfoSink;
use crate::probe::Reconciler;

/// Long-lived components shared by the application tasks
#[derive(Clone)]
pub struct ApplicationServices {
    pub reconciler: Arc<Reconciler<KubeCluster>>,
    pub sink: VersionInfoSink,
    pub registry: Registry,
}
