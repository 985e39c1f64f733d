//! Application settings.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ConfigError, Result};
use crate::api::transport::DEFAULT_TIMEOUT_SECS;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.digiworkhub.app/api";

/// Environment variable overriding [`Settings::base_url`].
pub const BASE_URL_ENV: &str = "DIGIWORKHUB_BASE_URL";

/// Application-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the DigiWorkHub API.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Where to keep the encrypted session. Defaults to the local data dir.
    pub session_file: Option<PathBuf>,
    /// Push token of this device, sent with logins.
    pub device_token: Option<String>,
    /// Where to write log files. Defaults to the local data dir.
    pub log_dir: Option<PathBuf>,
    /// tracing filter directive used when `RUST_LOG` is not set.
    pub log_filter: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            session_file: None,
            device_token: None,
            log_dir: None,
            log_filter: None,
        }
    }
}

impl Settings {
    /// Load settings from the default location, then apply the environment.
    pub fn load() -> Result<Self> {
        let path = super::config_path()?;
        let mut settings = Self::load_from(&path)?;
        settings.apply_env();
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => {
                debug!("Loaded configuration from {:?}", path);
                Ok(toml::from_str(&content)?)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No configuration file at {:?}, using defaults", path);
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::ReadError(e)),
        }
    }

    /// Write settings to `path`, creating the directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::CreateDirError)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(ConfigError::WriteError)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Record a rotated device push token in the file at `path`.
    ///
    /// Only `device_token` changes; the rest of the file is written back as
    /// it was read, without environment overrides.
    pub fn save_device_token(path: &Path, token: &str) -> Result<()> {
        let mut stored = Self::load_from(path)?;
        stored.device_token = Some(token.trim().to_string()).filter(|t| !t.is_empty());
        stored.save_to(path)
    }

    /// Apply environment overrides.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                debug!("Base URL overridden by {}", BASE_URL_ENV);
                self.base_url = url.trim().to_string();
            }
        }
    }

    /// Validate these settings.
    ///
    /// Checks that:
    /// - The base URL is non-empty and uses http:// or https://
    /// - The timeout is non-zero
    /// - A configured log filter is not blank
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::ValidationError` with details if validation fails.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "base_url cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("https://") && !self.base_url.starts_with("http://") {
            return Err(ConfigError::ValidationError(format!(
                "base_url '{}' must start with http:// or https://",
                self.base_url
            )));
        }

        if matches!(&self.log_filter, Some(filter) if filter.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "log_filter cannot be empty".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.timeout_secs, 30);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load_from(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "base_url = \"http://localhost:8000/api\"\n").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.base_url, "http://localhost:8000/api");
        assert_eq!(settings.timeout_secs, 30);
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "timeout_secs = \"soon\"").unwrap();

        let result = Settings::load_from(&path);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.toml");
        let settings = Settings {
            device_token: Some("device-123".to_string()),
            ..Settings::default()
        };
        settings.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_invalid_scheme_rejected() {
        let settings = Settings {
            base_url: "ftp://example.com".to_string(),
            ..Settings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("must start with http"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let settings = Settings {
            timeout_secs: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_env_overrides_base_url() {
        std::env::set_var(BASE_URL_ENV, "http://localhost:9000/api");
        let mut settings = Settings::default();
        settings.apply_env();
        std::env::remove_var(BASE_URL_ENV);

        assert_eq!(settings.base_url, "http://localhost:9000/api");
    }

    #[test]
    #[serial]
    fn test_blank_env_ignored() {
        std::env::set_var(BASE_URL_ENV, "  ");
        let mut settings = Settings::default();
        settings.apply_env();
        std::env::remove_var(BASE_URL_ENV);

        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_save_device_token_keeps_other_settings() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "base_url = \"http://localhost:8000/api\"\ntimeout_secs = 5\n").unwrap();

        Settings::save_device_token(&path, "rotated-token").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.device_token.as_deref(), Some("rotated-token"));
        assert_eq!(settings.base_url, "http://localhost:8000/api");
        assert_eq!(settings.timeout_secs, 5);
    }

    #[test]
    fn test_save_device_token_creates_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("digiworkhub").join("config.toml");

        Settings::save_device_token(&path, "first-token").unwrap();

        assert_eq!(
            Settings::load_from(&path).unwrap().device_token.as_deref(),
            Some("first-token")
        );
    }

    #[test]
    fn test_blank_log_filter_rejected() {
        let settings = Settings {
            log_filter: Some(" ".to_string()),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_log_settings_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "log_dir = \"/tmp/dwh-logs\"\nlog_filter = \"digiworkhub=debug\"\n").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.log_dir, Some(PathBuf::from("/tmp/dwh-logs")));
        assert_eq!(settings.log_filter.as_deref(), Some("digiworkhub=debug"));
        assert!(settings.validate().is_ok());
    }
}
