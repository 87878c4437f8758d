//! Prometheus exposition of probe results.

use core::error::Error;

use error_stack::Report;
use error_stack::ResultExt;
use prometheus::Registry;
use prometheus::TextEncoder;

pub mod server;
pub mod sink;

pub use server::MetricsServer;
pub use sink::VersionInfoSink;
pub use sink::VersionSnapshot;

/// Metrics errors
#[derive(Debug, derive_more::Display)]
pub enum MetricsError {
    #[display("Failed to register metric {metric}")]
    Registration { metric: String },
    #[display("Failed to encode metrics")]
    Encode,
    #[display("Metrics server error: {message}")]
    ServerError { message: String },
}

impl Error for MetricsError {}

/// Registry exposing the version gauge.
pub fn build_registry(sink: &VersionInfoSink) -> Result<Registry, Report<MetricsError>> {
    let registry = Registry::new();
    registry
        .register(Box::new(sink.clone()))
        .change_context(MetricsError::Registration {
            metric: sink::METRIC_NAME.to_string(),
        })?;
    Ok(registry)
}

/// Prometheus text exposition of everything in `registry`.
pub fn encode_text(registry: &Registry) -> Result<String, Report<MetricsError>> {
    TextEncoder::new()
        .encode_to_string(&registry.gather())
        .change_context(MetricsError::Encode)
}
