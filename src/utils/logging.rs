//! Logging setup and output directories

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_DIR: &str = "output/logs";
pub const LOG_FILE_PREFIX: &str = "flashloan-orchestrator.log";

pub struct LoggingGuard {
    pub _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Console plus hourly-rolled file output. `RUST_LOG` replaces the `info` default.
pub fn setup_logging() -> Result<Arc<LoggingGuard>> {
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::hourly(LOG_DIR, LOG_FILE_PREFIX));
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false).compact())
        .try_init()?;

    Ok(Arc::new(LoggingGuard { _guard: guard }))
}

/// Creates the log directory and the parent directories of every configured output file.
pub fn setup_output_directories(
    executions_dir: &Path,
    deployment_log: &Path,
    snapshot_file: &Path,
) -> Result<()> {
    use std::fs;

    fs::create_dir_all(LOG_DIR)?;
    fs::create_dir_all(executions_dir)?;
    for file in [deployment_log, snapshot_file] {
        if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
    }

    Ok(())
}
