use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::app::core::Application;
use crate::metrics::MetricsServer;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Task manager, responsible for starting and managing all background tasks
pub struct Tasks {
    pub tasks: Vec<JoinHandle<()>>,
    cancellation_token: CancellationToken,
}

impl Default for Tasks {
    fn default() -> Self {
        Self::new()
    }
}

impl Tasks {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start all background tasks
    pub fn spawn_all_tasks(&mut self, app: &Application) {
        let metrics_server_task = self.spawn_metrics_server_task(app);
        self.tasks.push(metrics_server_task);

        let probe_task = self.spawn_probe_task(app);
        self.tasks.push(probe_task);
    }

    /// Wait for a shutdown signal or for any task to stop on its own.
    ///
    /// Both tasks are meant to run until cancelled, so a task finishing first
    /// is reported as an error after the others have been stopped.
    pub async fn wait_for_completion(&mut self) -> Result<()> {
        let signal_handler = {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};
                let mut sigterm = signal(SignalKind::terminate())?;
                let mut sigint = signal(SignalKind::interrupt())?;

                tokio::spawn(async move {
                    tokio::select! {
                        _ = sigterm.recv() => {
                            tracing::info!("Received SIGTERM, initiating graceful shutdown");
                        }
                        _ = sigint.recv() => {
                            tracing::info!("Received SIGINT, initiating graceful shutdown");
                        }
                    }
                })
            }
            #[cfg(not(unix))]
            {
                tokio::spawn(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!("Failed to listen for Ctrl+C: {e}");
                        return;
                    }
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                })
            }
        };

        if self.tasks.is_empty() {
            anyhow::bail!("No background task to wait for");
        }

        tokio::select! {
            _ = signal_handler => {
                tracing::info!("Shutdown signal received, cancelling all tasks");
                self.cancellation_token.cancel();
                self.wait_for_tasks_with_timeout(SHUTDOWN_TIMEOUT).await;
                Ok(())
            }
            result = futures::future::select_all(&mut self.tasks) => {
                let (result, index, _remaining) = result;
                self.tasks.remove(index);
                self.cancellation_token.cancel();
                self.wait_for_tasks_with_timeout(SHUTDOWN_TIMEOUT).await;

                if let Err(e) = result {
                    tracing::error!("Task completed with error: {e}");
                    return Err(e.into());
                }
                tracing::warn!("Task completed unexpectedly");
                Err(anyhow::anyhow!("Background task exited unexpectedly"))
            }
        }
    }

    async fn wait_for_tasks_with_timeout(&mut self, timeout: Duration) {
        tokio::time::timeout(timeout, async {
            for task in &mut self.tasks {
                if let Err(e) = task.await {
                    tracing::error!("Task failed during shutdown: {e}");
                }
            }
        })
        .await
        .unwrap_or_else(|_| {
            tracing::warn!("Task shutdown timed out after {:?}", timeout);
        });
    }

    fn spawn_metrics_server_task(&self, app: &Application) -> JoinHandle<()> {
        let listen_addr = app.daemon_args().listen_addr();
        let registry = app.services().registry.clone();
        let token = self.cancellation_token.clone();

        tokio::spawn(async move {
            let server = MetricsServer::new(registry, listen_addr);
            if let Err(e) = server.run(token).await {
                tracing::error!("Metrics server failed: {e:?}");
            } else {
                tracing::info!("Metrics server completed");
            }
        })
    }

    fn spawn_probe_task(&self, app: &Application) -> JoinHandle<()> {
        let reconciler = app.services().reconciler.clone();
        let interval = app.daemon_args().interval();
        let token = self.cancellation_token.clone();

        tokio::spawn(async move {
            tracing::info!(
                interval_secs = interval.as_secs(),
                "Starting version probe task"
            );
            reconciler.run(interval, token).await;
            tracing::info!("Version probe task completed");
        })
    }
}
