use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing::info;

use crate::config::Settings;

/// Install the global `tracing` subscriber. The TUI owns the terminal, so
/// events are appended to the configured log file without ANSI colors.
pub fn init(settings: &Settings) -> Result<()> {
    if let Some(parent) = settings.log_file.parent() {
        fs::create_dir_all(parent).context("failed to create log directory")?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.log_file)
        .with_context(|| format!("failed to open log file '{}'", settings.log_file.display()))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_max_level(settings.log_level)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow!("failed to install log subscriber: {err}"))?;

    info!(log_file = %settings.log_file.display(), level = %settings.log_level, "logging started");
    Ok(())
}
