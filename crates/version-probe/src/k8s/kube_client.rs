use std::path::PathBuf;

use error_stack::Report;
use error_stack::ResultExt;
use kube::config::KubeConfigOptions;
use kube::config::Kubeconfig;
use kube::Client;
use kube::Config;

use crate::k8s::ClusterError;

/// Build the API client from `kubeconfig`, or from the in-cluster service
/// account (falling back to `~/.kube/config`) when no path is given.
pub async fn init_kube_client(
    kubeconfig: Option<PathBuf>,
) -> Result<Client, Report<ClusterError>> {
    let client = match kubeconfig {
        Some(kubeconfig_path) => {
            let kubeconfig = Kubeconfig::read_from(&kubeconfig_path).change_context(
                ClusterError::ConnectionFailed {
                    message: format!(
                        "Failed to read kubeconfig file: {}",
                        kubeconfig_path.display()
                    ),
                },
            )?;

            let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .change_context(ClusterError::ConnectionFailed {
                    message: format!(
                        "Failed to create config from kubeconfig: {}",
                        kubeconfig_path.display()
                    ),
                })?;

            Client::try_from(config).change_context(ClusterError::ConnectionFailed {
                message: "Failed to create Kubernetes client from custom kubeconfig".to_string(),
            })?
        }
        None => {
            let config = default_config().await?;
            Client::try_from(config).change_context(ClusterError::ConnectionFailed {
                message: "Failed to create Kubernetes client from default config".to_string(),
            })?
        }
    };
    Ok(client)
}

/// In-cluster service account first, then `~/.kube/config`.
async fn default_config() -> Result<Config, Report<ClusterError>> {
    match Config::incluster() {
        Ok(config) => {
            tracing::info!("Using in-cluster service account credentials");
            Ok(config)
        }
        Err(in_cluster) => {
            tracing::info!("No in-cluster credentials ({in_cluster}), trying local kubeconfig");
            let config = Config::from_kubeconfig(&KubeConfigOptions::default())
                .await
                .change_context(ClusterError::ConnectionFailed {
                    message: "No in-cluster service account and no usable local kubeconfig"
                        .to_string(),
                })
                .attach_printable(format!("in-cluster config: {in_cluster}"))?;
            tracing::info!("Using local kubeconfig credentials");
            Ok(config)
        }
    }
}
