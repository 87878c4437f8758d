//! `pod_version_info` gauge family with whole-snapshot replacement.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use error_stack::Report;
use error_stack::ResultExt;
use prometheus::core::Collector;
use prometheus::core::Desc;
use prometheus::core::Describer;
use prometheus::proto::MetricFamily;
use prometheus::GaugeVec;
use prometheus::Opts;

use super::MetricsError;
use crate::probe::MetricObservation;

pub const METRIC_NAME: &str = "pod_version_info";
const METRIC_HELP: &str = "Version information of Kubernetes pods";
pub const LABEL_NAMES: [&str; 3] = ["pod_name", "component", "version"];

/// Set of observations produced by one cycle.
///
/// Keyed by the full label triple, so observing the same triple twice
/// overwrites the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSnapshot {
    observations: BTreeSet<MetricObservation>,
}

impl VersionSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, observation: MetricObservation) {
        self.observations.retain(|existing| {
            !(existing.pod_name == observation.pod_name
                && existing.component == observation.component
                && existing.version == observation.version)
        });
        self.observations.insert(observation);
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricObservation> {
        self.observations.iter()
    }
}

impl FromIterator<MetricObservation> for VersionSnapshot {
    fn from_iter<T: IntoIterator<Item = MetricObservation>>(iter: T) -> Self {
        let mut snapshot = Self::new();
        for observation in iter {
            snapshot.observe(observation);
        }
        snapshot
    }
}

struct SinkInner {
    opts: Opts,
    desc: Desc,
    current: RwLock<Arc<VersionSnapshot>>,
}

/// Shared handle to the `pod_version_info` gauge.
///
/// Scrapes read whichever snapshot is current; writers replace it as a whole,
/// so a scrape never observes a half-written label set.
#[derive(Clone)]
pub struct VersionInfoSink {
    inner: Arc<SinkInner>,
}

impl VersionInfoSink {
    pub fn new() -> Result<Self, Report<MetricsError>> {
        let opts = Opts::new(METRIC_NAME, METRIC_HELP)
            .variable_labels(LABEL_NAMES.iter().map(|l| l.to_string()).collect());
        let desc = opts
            .describe()
            .change_context(MetricsError::Registration {
                metric: METRIC_NAME.to_string(),
            })?;

        Ok(Self {
            inner: Arc::new(SinkInner {
                opts,
                desc,
                current: RwLock::new(Arc::new(VersionSnapshot::new())),
            }),
        })
    }

    /// Replace every published label combination with `snapshot`.
    pub fn publish(&self, snapshot: VersionSnapshot) {
        let snapshot = Arc::new(snapshot);
        let mut current = self
            .inner
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *current = snapshot;
    }

    /// Set a single label combination on top of the current snapshot.
    pub fn observe(&self, observation: MetricObservation) {
        let mut current = self
            .inner
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut next = VersionSnapshot::clone(&current);
        next.observe(observation);
        *current = Arc::new(next);
    }

    /// Drop all label combinations.
    pub fn clear(&self) {
        self.publish(VersionSnapshot::new());
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Arc<VersionSnapshot> {
        Arc::clone(
            &self
                .inner
                .current
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Currently published observations in label order.
    pub fn observations(&self) -> Vec<MetricObservation> {
        self.snapshot().iter().cloned().collect()
    }

    fn render(&self, snapshot: &VersionSnapshot) -> Result<GaugeVec, prometheus::Error> {
        let gauge = GaugeVec::new(self.inner.opts.clone(), &LABEL_NAMES)?;
        for observation in snapshot.iter() {
            gauge
                .get_metric_with_label_values(&[
                    observation.pod_name.as_str(),
                    observation.component.as_str(),
                    observation.version.as_str(),
                ])?
                .set(observation.value.as_f64());
        }
        Ok(gauge)
    }
}

impl Collector for VersionInfoSink {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.inner.desc]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let snapshot = self.snapshot();
        match self.render(&snapshot) {
            Ok(gauge) => gauge.collect(),
            Err(e) => {
                tracing::error!(metric = METRIC_NAME, "Failed to render metric family: {e}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use prometheus::Encoder as _;
    use prometheus::Registry;
    use prometheus::TextEncoder;
    use similar_asserts::assert_eq;

    use super::*;
    use crate::probe::GaugeValue;
    use crate::probe::PodRef;
    use crate::probe::VersionLabel;

    fn pod(name: &str) -> PodRef {
        PodRef {
            name: name.to_string(),
            namespace: "os".to_string(),
        }
    }

    fn encode(registry: &Registry) -> String {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&registry.gather(), &mut buffer)
            .expect("should encode");
        String::from_utf8(buffer).expect("should be utf8")
    }

    fn sample_line<'a>(text: &'a str, needle: &str) -> &'a str {
        text.lines()
            .find(|line| line.starts_with("pod_version_info{") && line.contains(needle))
            .unwrap_or_else(|| panic!("no sample with {needle} in:\n{text}"))
    }

    #[test]
    fn observe_overwrites_same_label_triple() {
        let mut snapshot = VersionSnapshot::new();
        let mut observation =
            MetricObservation::probed("glance", &pod("glance-0"), VersionLabel::unknown());
        snapshot.observe(observation.clone());
        observation.value = GaugeValue::Unresolved;
        snapshot.observe(observation.clone());

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.iter().next(), Some(&observation));
    }

    #[test]
    fn publish_replaces_previous_labels() {
        let sink = VersionInfoSink::new().expect("should create sink");
        sink.publish(
            [
                MetricObservation::pod_missing("nova-api"),
                MetricObservation::probed(
                    "glance",
                    &pod("glance-0"),
                    VersionLabel::matched("27.0.0"),
                ),
            ]
            .into_iter()
            .collect(),
        );
        assert_eq!(sink.observations().len(), 2);

        sink.publish(
            [MetricObservation::probed(
                "glance",
                &pod("glance-1"),
                VersionLabel::matched("28.0.0"),
            )]
            .into_iter()
            .collect(),
        );

        let observations = sink.observations();
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].pod_name, "glance-1");
    }

    #[test]
    fn clear_drops_everything() {
        let sink = VersionInfoSink::new().expect("should create sink");
        sink.observe(MetricObservation::pod_missing("haproxy"));
        assert_eq!(sink.observations().len(), 1);

        sink.clear();
        assert!(sink.observations().is_empty());
    }

    #[test]
    fn held_snapshot_is_unaffected_by_publish() {
        let sink = VersionInfoSink::new().expect("should create sink");
        sink.observe(MetricObservation::pod_missing("haproxy"));
        let before = sink.snapshot();

        sink.clear();

        assert_eq!(before.len(), 1);
        assert!(sink.snapshot().is_empty());
    }

    #[test]
    fn exposition_contains_labels_and_values() {
        let sink = VersionInfoSink::new().expect("should create sink");
        let registry = Registry::new();
        registry
            .register(Box::new(sink.clone()))
            .expect("should register");

        sink.publish(
            [
                MetricObservation::pod_missing("nova-api"),
                MetricObservation::probed(
                    "cinder-api",
                    &pod("cinder-api-5c7b"),
                    VersionLabel::matched("21.4.0"),
                ),
            ]
            .into_iter()
            .collect(),
        );

        let text = encode(&registry);
        assert!(text.contains("# TYPE pod_version_info gauge"), "{text}");

        let cinder = sample_line(&text, r#"component="cinder-api""#);
        assert!(cinder.contains(r#"pod_name="cinder-api-5c7b""#), "{cinder}");
        assert!(cinder.contains(r#"version="21.4.0""#), "{cinder}");
        assert!(cinder.ends_with(" 1"), "{cinder}");

        let nova = sample_line(&text, r#"component="nova-api""#);
        assert!(nova.contains(r#"pod_name="unknown""#), "{nova}");
        assert!(nova.contains(r#"version="unknown""#), "{nova}");
        assert!(nova.ends_with(" 0"), "{nova}");
    }

    #[test]
    fn concurrent_scrapes_see_whole_snapshots() {
        const COMPONENTS: [&str; 4] = ["cinder-api", "glance", "keystone", "nova-api"];

        fn cycle(version: &str) -> VersionSnapshot {
            COMPONENTS
                .iter()
                .map(|component| {
                    MetricObservation::probed(
                        component,
                        &pod(&format!("{component}-0")),
                        VersionLabel::matched(version),
                    )
                })
                .collect()
        }

        let sink = VersionInfoSink::new().expect("should create sink");
        let registry = Registry::new();
        registry
            .register(Box::new(sink.clone()))
            .expect("should register");
        sink.publish(cycle("1.0.0"));

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for round in 0..500 {
                    let version = if round % 2 == 0 { "2.0.0" } else { "1.0.0" };
                    sink.publish(cycle(version));
                }
            });

            for _ in 0..500 {
                let families = registry.gather();
                assert_eq!(families.len(), 1);
                let metrics = families[0].get_metric();
                assert_eq!(metrics.len(), COMPONENTS.len());

                let versions: BTreeSet<&str> = metrics
                    .iter()
                    .flat_map(|metric| metric.get_label())
                    .filter(|label| label.get_name() == "version")
                    .map(|label| label.get_value())
                    .collect();
                assert_eq!(versions.len(), 1, "mixed snapshot: {versions:?}");
            }
        });
    }

    #[test]
    fn empty_snapshot_exposes_no_samples() {
        let sink = VersionInfoSink::new().expect("should create sink");
        let registry = Registry::new();
        registry
            .register(Box::new(sink.clone()))
            .expect("should register");

        assert!(!encode(&registry).contains("pod_version_info{"));
    }
}
