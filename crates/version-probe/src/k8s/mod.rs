//! Kubernetes integration module.
//!
//! - [`init_kube_client`]: builds the shared API client at startup
//! - [`KubeCluster`]: pod lookup, container lookup and in-container exec

pub mod cluster;
pub mod kube_client;
pub mod types;

pub use cluster::KubeCluster;
pub use kube_client::init_kube_client;
pub use types::ClusterError;
