//! Configuration management for DigiWorkHub.
//!
//! This module handles loading, saving and validating the user's settings
//! file.

mod settings;

use std::path::PathBuf;

use thiserror::Error;

pub use settings::{Settings, BASE_URL_ENV, DEFAULT_BASE_URL};

/// Errors that can occur while handling configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No platform configuration directory.
    #[error("Could not determine configuration directory")]
    NoConfigDir,

    /// The configuration directory could not be created.
    #[error("Failed to create configuration directory: {0}")]
    CreateDirError(std::io::Error),

    /// The configuration file could not be read.
    #[error("Failed to read configuration file: {0}")]
    ReadError(std::io::Error),

    /// The configuration file could not be written.
    #[error("Failed to write configuration file: {0}")]
    WriteError(std::io::Error),

    /// The configuration file is not valid TOML for [`Settings`].
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// The settings could not be encoded.
    #[error("Failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// A setting has an invalid value.
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Path of the configuration file.
///
/// - Linux: `~/.config/digiworkhub/config.toml`
/// - macOS: `~/Library/Application Support/digiworkhub/config.toml`
/// - Windows: `C:\Users\<User>\AppData\Roaming\digiworkhub\config.toml`
pub fn config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(base.join("digiworkhub").join("config.toml"))
}
