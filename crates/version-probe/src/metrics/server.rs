use std::net::SocketAddr;

use error_stack::Report;
use poem::get;
use poem::handler;
use poem::http::StatusCode;
use poem::listener::TcpListener;
use poem::middleware::Tracing;
use poem::web::Data;
use poem::Endpoint;
use poem::EndpointExt;
use poem::Response;
use poem::Route;
use poem::Server;
use prometheus::Registry;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;

use super::encode_text;
use super::MetricsError;

const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Prometheus text exposition of the registry
#[handler]
async fn metrics(registry: Data<&Registry>) -> Response {
    match encode_text(registry.0) {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .content_type(TEXT_CONTENT_TYPE)
            .body(body),
        Err(e) => {
            error!("Failed to encode metrics: {e:?}");
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body("Failed to encode metrics")
        }
    }
}

#[handler]
async fn health() -> &'static str {
    "OK"
}

pub(crate) fn routes(registry: Registry) -> impl Endpoint {
    Route::new()
        .at("/metrics", get(metrics))
        .at("/health", get(health))
        .data(registry)
        .with(Tracing)
}

/// HTTP server scraped by Prometheus
pub struct MetricsServer {
    registry: Registry,
    listen_addr: SocketAddr,
}

impl MetricsServer {
    pub fn new(registry: Registry, listen_addr: SocketAddr) -> Self {
        Self {
            registry,
            listen_addr,
        }
    }

    /// Serve until `cancellation_token` is cancelled.
    ///
    /// # Errors
    ///
    /// - [`MetricsError::ServerError`] if the server fails to start or bind to the address
    pub async fn run(
        self,
        cancellation_token: CancellationToken,
    ) -> Result<(), Report<MetricsError>> {
        info!("Starting metrics server on {}", self.listen_addr);

        let app = routes(self.registry);
        let server = Server::new(TcpListener::bind(self.listen_addr));

        tokio::select! {
            result = server.run(app) => {
                match result {
                    Ok(()) => {
                        info!("Metrics server stopped normally");
                        Ok(())
                    }
                    Err(e) => {
                        error!("Metrics server failed: {e}");
                        Err(Report::new(MetricsError::ServerError {
                            message: format!("Server failed: {e}"),
                        }))
                    }
                }
            }
            _ = cancellation_token.cancelled() => {
                info!("Metrics server shutdown requested");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use poem::test::TestClient;
    use test_log::test;

    use super::*;
    use crate::metrics::build_registry;
    use crate::metrics::VersionInfoSink;
    use crate::probe::MetricObservation;

    #[test(tokio::test)]
    async fn metrics_route_exposes_version_gauge() {
        let sink = VersionInfoSink::new().expect("should create sink");
        let registry = build_registry(&sink).expect("should build registry");
        sink.observe(MetricObservation::pod_missing("keystone"));

        let client = TestClient::new(routes(registry));
        let resp = client.get("/metrics").send().await;

        resp.assert_status_is_ok();
        resp.assert_content_type(TEXT_CONTENT_TYPE);
        let body = resp.0.into_body().into_string().await.expect("should read body");
        assert!(body.contains("pod_version_info{"), "{body}");
        assert!(body.contains(r#"component="keystone""#), "{body}");
    }

    #[test(tokio::test)]
    async fn health_route_answers_ok() {
        let sink = VersionInfoSink::new().expect("should create sink");
        let registry = build_registry(&sink).expect("should build registry");

        let client = TestClient::new(routes(registry));
        let resp = client.get("/health").send().await;

        resp.assert_status_is_ok();
        resp.assert_text("OK").await;
    }

    #[test(tokio::test)]
    async fn server_stops_on_cancellation() {
        let sink = VersionInfoSink::new().expect("should create sink");
        let registry = build_registry(&sink).expect("should build registry");
        let server = MetricsServer::new(registry, "127.0.0.1:0".parse().expect("valid addr"));

        let token = CancellationToken::new();
        token.cancel();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), server.run(token))
            .await
            .expect("server should stop promptly");
        assert!(result.is_ok());
    }
}
