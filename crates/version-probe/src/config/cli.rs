use clap::Parser;
use clap::Subcommand;
use utils::version;

use crate::config::daemon::CatalogArgs;
use crate::config::daemon::DaemonArgs;
use crate::config::daemon::ProbeArgs;

#[derive(Parser)]
#[command(about, long_about, version = &**version::VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the version probe loop and serve the metrics endpoint
    Daemon(DaemonArgs),
    /// Run a single probe cycle and print the exposition text
    Probe(ProbeArgs),
    /// Print the effective command catalog
    Catalog(CatalogArgs),
}
