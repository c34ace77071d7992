//! Tracing subscriber setup.

use std::path::Path;

use anyhow::{Context, Result};
use coursehub_core::config::Config;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber. Logs go to stderr, or to `log.file`
/// when configured.
///
/// The returned guard flushes the file writer on drop and must be held
/// until exit.
pub fn init(config: &Config) -> Result<Option<WorkerGuard>> {
    let directive = config.log_filter();
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("Invalid log filter: {directive}"))?;

    let Some(file) = config.log.file.as_deref().filter(|f| !f.trim().is_empty()) else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .context("install tracing subscriber")?;
        return Ok(None);
    };

    let path = Path::new(file);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .with_context(|| format!("Invalid log file path: {file}"))?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .context("install tracing subscriber")?;

    Ok(Some(guard))
}
