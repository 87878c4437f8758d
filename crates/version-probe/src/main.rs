use anyhow::Result;
use clap::Parser;
use utils::logging;
use utils::version;
use version_probe::app::build_reconciler;
use version_probe::app::ApplicationBuilder;
use version_probe::config::Catalog;
use version_probe::config::CatalogArgs;
use version_probe::config::Cli;
use version_probe::config::Commands;
use version_probe::config::DaemonArgs;
use version_probe::config::ProbeArgs;
use version_probe::metrics::build_registry;
use version_probe::metrics::encode_text;
use version_probe::metrics::VersionInfoSink;

/// Sets up global panic hooks.
fn setup_global_hooks() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        tracing::error!("Thread panicked: {}", panic_info);
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_global_hooks();

    let cli = Cli::parse();

    logging::init();

    match cli.command {
        Commands::Daemon(daemon_args) => run_daemon(daemon_args).await,
        Commands::Probe(probe_args) => run_probe(probe_args).await,
        Commands::Catalog(catalog_args) => run_catalog(catalog_args),
    }
}

async fn run_daemon(daemon_args: DaemonArgs) -> Result<()> {
    tracing::info!("Starting version probe daemon {}", &**version::VERSION);
    tracing::info!(
        namespace = %daemon_args.cluster.namespace,
        listen_addr = %daemon_args.listen_addr(),
        interval_secs = daemon_args.interval_seconds,
        exec_timeout_secs = daemon_args.cluster.exec_timeout_seconds,
        "Daemon configuration"
    );

    let app = ApplicationBuilder::new(daemon_args).build().await?;

    app.run().await?;
    app.shutdown().await?;

    Ok(())
}

async fn run_probe(probe_args: ProbeArgs) -> Result<()> {
    tracing::info!("Running a single version probe cycle {}", &**version::VERSION);

    let sink = VersionInfoSink::new()
        .map_err(|e| anyhow::anyhow!("Failed to create version gauge: {e:?}"))?;
    let registry = build_registry(&sink)
        .map_err(|e| anyhow::anyhow!("Failed to build metrics registry: {e:?}"))?;

    let reconciler = build_reconciler(&probe_args.cluster, sink).await?;
    reconciler.reconcile().await;

    let text = encode_text(&registry).map_err(|e| anyhow::anyhow!("{e:?}"))?;
    print!("{text}");
    Ok(())
}

fn run_catalog(catalog_args: CatalogArgs) -> Result<()> {
    let catalog = Catalog::load(catalog_args.catalog_path.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load component catalog: {e:?}"))?;
    let yaml = catalog
        .to_yaml()
        .map_err(|e| anyhow::anyhow!("Failed to render component catalog: {e:?}"))?;
    print!("{yaml}");
    Ok(())
}
