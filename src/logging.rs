use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Sends log output to `path`, appending. The TUI owns the terminal, so
/// nothing is written to stdout or stderr.
///
/// `RUST_LOG` wins when set; otherwise `level` applies to this crate only.
pub(crate) fn init(path: &Path, level: &str) -> Result<()> {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::try_new(format!("{}={}", env!("CARGO_CRATE_NAME"), level))
            .with_context(|| format!("Invalid log level: {level}"))?,
    };

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Could not open log file: {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {e}"))?;

    tracing::debug!("Logging to {}", path.display());
    Ok(())
}
