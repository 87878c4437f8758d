//! provides logging helpers

use std::env;
use std::path::Path;

use tracing::Subscriber;
use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::filter::{self};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// When set, logs go to a daily rotated file under this path instead of stderr.
pub const LOG_PATH_ENV_VAR: &str = "PROBE_LOG_PATH";

/// Build the fmt layer, writing to `log_path` if given, stderr otherwise.
pub fn get_fmt_layer<S>(log_path: Option<String>) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let file_appender = log_path.and_then(|log_path| {
        let path = Path::new(&log_path);
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty())?;
        let prefix = path.file_name()?.to_str()?.to_string();
        match RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(prefix)
            .max_log_files(3)
            .build(dir)
        {
            Ok(appender) => Some(appender),
            Err(e) => {
                eprintln!("failed to create log file appender for {log_path}: {e}, falling back to stderr");
                None
            }
        }
    });

    match file_appender {
        Some(appender) => layer()
            .with_writer(appender)
            .with_ansi(false)
            .with_target(true)
            .boxed(),
        None => layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    }
}

/// initiate the global tracing subscriber
pub fn init() {
    let env_filter = filter::EnvFilter::builder()
        .with_default_directive(filter::LevelFilter::INFO.into())
        .from_env_lossy();

    let log_path = env::var(LOG_PATH_ENV_VAR).ok();
    let fmt_layer = get_fmt_layer(log_path).with_filter(env_filter);

    registry().with(fmt_layer).init();
}
