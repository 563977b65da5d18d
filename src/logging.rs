//! File based tracing setup. The dashboard owns the terminal, so log output
//! goes to a file instead of stderr.

use anyhow::{anyhow, Result};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const APP_DIR: &str = "skycast";
const LOG_FILE: &str = "skycast.log";

/// `<cache dir>/skycast/skycast.log`, when the platform has one.
pub fn default_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join(APP_DIR).join(LOG_FILE))
}

/// Build the filter: `RUST_LOG` wins, otherwise `level`.
pub fn filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|err| anyhow!("invalid log level {level:?}: {err}"))
}

/// Install the global subscriber. With no path, logging stays disabled.
pub fn init(path: Option<&Path>, level: &str) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let filter = filter(level)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!(err))?;

    tracing::info!(path = %path.display(), "logging initialized");
    Ok(())
}
