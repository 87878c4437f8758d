use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

pub const DEFAULT_NAMESPACE: &str = "os";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_INTERVAL_SECONDS: u64 = 43_200;
pub const DEFAULT_EXEC_TIMEOUT_SECONDS: u64 = 60;

/// Options shared by every command that talks to the cluster.
#[derive(Parser, Clone, Debug)]
pub struct ClusterArgs {
    #[arg(
        long,
        env = "PROBE_NAMESPACE",
        default_value = DEFAULT_NAMESPACE,
        help = "Namespace in which component pods are looked up"
    )]
    pub namespace: String,

    #[command(flatten)]
    pub catalog: CatalogArgs,

    #[arg(
        long,
        env = "PROBE_EXEC_TIMEOUT_SECONDS",
        default_value_t = DEFAULT_EXEC_TIMEOUT_SECONDS,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Upper bound for a single in-container version command"
    )]
    pub exec_timeout_seconds: u64,

    #[arg(
        long,
        env = "KUBECONFIG",
        value_hint = clap::ValueHint::FilePath,
        help = "Path to kubeconfig file (defaults to cluster config or ~/.kube/config)"
    )]
    pub kubeconfig: Option<PathBuf>,
}

impl ClusterArgs {
    pub fn exec_timeout(&self) -> Duration {
        Duration::from_secs(self.exec_timeout_seconds)
    }
}

#[derive(Parser, Clone, Debug, Default)]
pub struct CatalogArgs {
    #[arg(
        long = "catalog",
        env = "PROBE_CATALOG",
        value_hint = clap::ValueHint::FilePath,
        help = "YAML file mapping component names to version commands (defaults to the built-in catalog)"
    )]
    pub catalog_path: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
pub struct DaemonArgs {
    #[command(flatten)]
    pub cluster: ClusterArgs,

    #[arg(
        long,
        env = "PROBE_LISTEN_HOST",
        default_value = "0.0.0.0",
        help = "Address the metrics endpoint binds to"
    )]
    pub listen_host: std::net::IpAddr,

    #[arg(
        long,
        env = "PROBE_PORT",
        default_value_t = DEFAULT_PORT,
        help = "Port of the metrics endpoint"
    )]
    pub port: u16,

    #[arg(
        long,
        env = "PROBE_INTERVAL_SECONDS",
        default_value_t = DEFAULT_INTERVAL_SECONDS,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Seconds between two probe cycles"
    )]
    pub interval_seconds: u64,
}

impl DaemonArgs {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_host, self.port)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

#[derive(Parser, Clone, Debug)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub cluster: ClusterArgs,
}
