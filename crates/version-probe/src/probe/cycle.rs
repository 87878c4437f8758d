//! Reconciliation cycle: catalog -> pods -> versions -> published snapshot.

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::extract::extract_version;
use super::traits::Cluster;
use super::types::CycleReport;
use super::types::MetricObservation;
use crate::config::Catalog;
use crate::config::ComponentEntry;
use crate::metrics::VersionInfoSink;
use crate::metrics::VersionSnapshot;

/// How a single component fared in a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// Command dispatched and output (possibly empty) captured.
    Probed,
    /// Pod or container could not be resolved.
    Unresolved,
    /// Exec failed or timed out after the container was resolved.
    ExecFailed,
}

/// Drives one probe per catalog entry and publishes the results.
pub struct Reconciler<C> {
    cluster: Arc<C>,
    catalog: Arc<Catalog>,
    namespace: String,
    exec_timeout: Duration,
    sink: VersionInfoSink,
}

impl<C: Cluster> Reconciler<C> {
    pub fn new(
        cluster: Arc<C>,
        catalog: Arc<Catalog>,
        namespace: impl Into<String>,
        exec_timeout: Duration,
        sink: VersionInfoSink,
    ) -> Self {
        Self {
            cluster,
            catalog,
            namespace: namespace.into(),
            exec_timeout,
            sink,
        }
    }

    pub fn sink(&self) -> &VersionInfoSink {
        &self.sink
    }

    /// Probe every catalog entry and build a fresh snapshot without publishing it.
    ///
    /// Entries are processed sequentially; a failure on one entry never
    /// prevents the others from being probed.
    pub async fn collect(&self) -> (VersionSnapshot, CycleReport) {
        let started = Instant::now();
        let mut snapshot = VersionSnapshot::new();
        let mut report = CycleReport::default();

        for entry in self.catalog.entries() {
            let (observation, outcome) = self.probe_component(entry).await;
            match outcome {
                Outcome::Probed => report.resolved += 1,
                Outcome::Unresolved => report.unresolved += 1,
                Outcome::ExecFailed => {
                    report.resolved += 1;
                    report.exec_failures += 1;
                }
            }
            snapshot.observe(observation);
        }

        report.observations = snapshot.len();
        report.elapsed = started.elapsed();
        (snapshot, report)
    }

    /// Run one full cycle and swap its snapshot into the sink.
    pub async fn reconcile(&self) -> CycleReport {
        info!(
            namespace = %self.namespace,
            components = self.catalog.len(),
            "Starting version probe cycle"
        );

        let (snapshot, report) = self.collect().await;
        self.sink.publish(snapshot);

        info!(
            observations = report.observations,
            resolved = report.resolved,
            unresolved = report.unresolved,
            exec_failures = report.exec_failures,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Version probe cycle completed"
        );
        report
    }

    async fn probe_component(&self, entry: &ComponentEntry) -> (MetricObservation, Outcome) {
        let component = entry.name.as_str();

        let pod = match self.cluster.resolve_pod(&self.namespace, component).await {
            Ok(Some(pod)) => pod,
            Ok(None) => {
                warn!(component, namespace = %self.namespace, "Pod not found");
                return (MetricObservation::pod_missing(component), Outcome::Unresolved);
            }
            Err(e) => {
                warn!(component, namespace = %self.namespace, "Pod lookup failed: {e:?}");
                return (MetricObservation::pod_missing(component), Outcome::Unresolved);
            }
        };

        let container = match self.cluster.resolve_container(&pod).await {
            Ok(Some(container)) => container,
            Ok(None) => {
                warn!(component, pod_name = %pod.name, "Container not found in pod");
                return (
                    MetricObservation::container_missing(component, &pod),
                    Outcome::Unresolved,
                );
            }
            Err(e) => {
                warn!(component, pod_name = %pod.name, "Failed to read pod spec: {e:?}");
                return (
                    MetricObservation::container_missing(component, &pod),
                    Outcome::Unresolved,
                );
            }
        };

        let exec = self.cluster.exec(&pod, &container, &entry.command);
        let (output, outcome) = match tokio::time::timeout(self.exec_timeout, exec).await {
            Ok(Ok(output)) => (Some(output), Outcome::Probed),
            Ok(Err(e)) => {
                error!(component, pod_name = %pod.name, %container, "Command execution failed: {e:?}");
                (None, Outcome::ExecFailed)
            }
            Err(_) => {
                error!(
                    component,
                    pod_name = %pod.name,
                    %container,
                    timeout_secs = self.exec_timeout.as_secs_f64(),
                    "Command execution timed out"
                );
                (None, Outcome::ExecFailed)
            }
        };

        let version = extract_version(output.as_deref());
        info!(component, pod_name = %pod.name, %version, "Component version probed");

        (MetricObservation::probed(component, &pod, version), outcome)
    }

    /// Reconcile immediately, then every `interval`, until cancelled.
    ///
    /// Each cycle runs in its own task: a panicking cycle is logged and
    /// publishes nothing, and the next cycle still runs on schedule.
    pub async fn run(self: Arc<Self>, interval: Duration, cancellation_token: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    info!("Version probe shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    let this = Arc::clone(&self);
                    let mut cycle = tokio::spawn(async move { this.reconcile().await });

                    tokio::select! {
                        _ = cancellation_token.cancelled() => {
                            cycle.abort();
                            info!("Version probe shutdown requested, abandoning running cycle");
                            break;
                        }
                        result = &mut cycle => {
                            if let Err(e) = result {
                                error!("Version probe cycle failed: {e}");
                            }
                        }
                    }
                }
            }
        }
    }
}
