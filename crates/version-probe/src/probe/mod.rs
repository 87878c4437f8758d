//! Version probing of catalog components.
//!
//! - [`Reconciler`]: runs one probe per catalog entry and publishes the result
//! - [`extract_version`]: pulls the first `major.minor.patch` token from command output
//! - [`PodResolver`], [`ContainerResolver`], [`RemoteExecutor`]: cluster seams

pub mod cycle;
pub mod extract;
pub mod traits;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use cycle::Reconciler;
pub use extract::extract_version;
pub use traits::Cluster;
pub use traits::ContainerResolver;
pub use traits::PodResolver;
pub use traits::RemoteExecutor;
pub use types::CycleReport;
pub use types::GaugeValue;
pub use types::MetricObservation;
pub use types::PodRef;
pub use types::VersionLabel;
pub use types::UNKNOWN;
