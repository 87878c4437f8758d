use std::fmt;
use std::time::Duration;

/// Sentinel used for labels whose real value could not be determined.
pub const UNKNOWN: &str = "unknown";

/// A pod resolved for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodRef {
    pub name: String,
    pub namespace: String,
}

/// Either a `major.minor.patch` token or [`UNKNOWN`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionLabel(String);

impl VersionLabel {
    pub fn unknown() -> Self {
        Self(UNKNOWN.to_string())
    }

    pub(crate) fn matched(token: &str) -> Self {
        Self(token.to_string())
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value of one `pod_version_info` series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GaugeValue {
    /// Pod or container could not be resolved.
    Unresolved = 0,
    /// The version command was dispatched to a resolved container.
    Present = 1,
}

impl GaugeValue {
    pub fn as_f64(self) -> f64 {
        self as u8 as f64
    }
}

/// One labelled gauge sample.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricObservation {
    pub pod_name: String,
    pub component: String,
    pub version: VersionLabel,
    pub value: GaugeValue,
}

impl MetricObservation {
    /// No pod matched the component.
    pub fn pod_missing(component: &str) -> Self {
        Self {
            pod_name: UNKNOWN.to_string(),
            component: component.to_string(),
            version: VersionLabel::unknown(),
            value: GaugeValue::Unresolved,
        }
    }

    /// The pod was found but its primary container was not.
    pub fn container_missing(component: &str, pod: &PodRef) -> Self {
        Self {
            pod_name: pod.name.clone(),
            component: component.to_string(),
            version: VersionLabel::unknown(),
            value: GaugeValue::Unresolved,
        }
    }

    pub fn probed(component: &str, pod: &PodRef, version: VersionLabel) -> Self {
        Self {
            pod_name: pod.name.clone(),
            component: component.to_string(),
            version,
            value: GaugeValue::Present,
        }
    }
}

/// Outcome counters of a single reconciliation cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub observations: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub exec_failures: usize,
    pub elapsed: Duration,
}
