//! Logging configuration using the tracing ecosystem.
//!
//! Log output goes to a daily-rotated file so it never interleaves with the
//! command output printed to the terminal. The directory and the default
//! filter come from [`Settings`]; `RUST_LOG` still takes precedence.

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::config::Settings;

/// Filter used when neither `RUST_LOG` nor the settings name one.
const DEFAULT_LOG_FILTER: &str = "digiworkhub=info,warn";

/// File name prefix of the rotated log files.
const LOG_FILE_PREFIX: &str = "digiworkhub.log";

/// Initialize the logging system.
///
/// Logs go to `settings.log_dir` when set, otherwise to:
///
/// - Linux: `~/.local/share/digiworkhub/logs/`
/// - macOS: `~/Library/Application Support/digiworkhub/logs/`
/// - Windows: `C:\Users\<User>\AppData\Local\digiworkhub\logs\`
///
/// # Errors
///
/// Returns an error if the log directory cannot be determined or created,
/// if the configured filter does not parse, or if a global subscriber is
/// already installed.
pub fn init(settings: &Settings) -> anyhow::Result<()> {
    let log_dir = resolve_log_directory(settings)?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(configured_filter(settings))?,
    };

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter);

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %settings.base_url,
        "DigiWorkHub starting up"
    );
    tracing::debug!(log_dir = %log_dir.display(), "Log directory");

    Ok(())
}

/// The filter directive from the settings, or the built-in default.
fn configured_filter(settings: &Settings) -> &str {
    settings
        .log_filter
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or(DEFAULT_LOG_FILTER)
}

fn resolve_log_directory(settings: &Settings) -> anyhow::Result<PathBuf> {
    match &settings.log_dir {
        Some(dir) => Ok(dir.clone()),
        None => default_log_directory(),
    }
}

fn default_log_directory() -> anyhow::Result<PathBuf> {
    let base_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(base_dir.join("digiworkhub").join("logs"))
}

/// Where logs are written for these settings.
pub fn log_directory(settings: &Settings) -> Option<PathBuf> {
    resolve_log_directory(settings).ok()
}

/// Log application shutdown.
pub fn shutdown() {
    tracing::info!("DigiWorkHub shutting down");
}
