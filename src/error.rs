//! Centralized error types for DigiWorkHub.
//!
//! This module provides a unified error hierarchy for the application with
//! user-friendly error messages. All error types use `thiserror` for
//! ergonomic error handling.

use thiserror::Error;

use crate::api::ApiError;
use crate::calendar::CalendarError;
use crate::config::ConfigError;
use crate::session::SessionError;

/// The main application error type.
///
/// This enum aggregates all error types that can occur in DigiWorkHub,
/// providing user-friendly error messages while preserving the underlying
/// error context for debugging.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// API-related errors.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Session storage errors.
    #[error("{0}")]
    Session(#[from] SessionError),

    /// Calendar errors.
    #[error("{0}")]
    Calendar(#[from] CalendarError),

    /// IO errors (file system, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with a message.
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Create a generic error.
    pub fn other(msg: impl Into<String>) -> Self {
        AppError::Other(msg.into())
    }

    /// Get a user-friendly message for display.
    ///
    /// API errors carry the server's own message, which is shown verbatim.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => match e {
                ConfigError::NoConfigDir => {
                    "Could not find configuration directory. Please check your system settings."
                        .to_string()
                }
                ConfigError::CreateDirError(_) => {
                    "Could not create configuration directory. Check file permissions.".to_string()
                }
                ConfigError::ReadError(_) => {
                    "Could not read configuration file. Please check the file exists and is readable.".to_string()
                }
                ConfigError::WriteError(_) => {
                    "Could not save configuration. Please check file permissions.".to_string()
                }
                ConfigError::ParseError(_) => {
                    "Configuration file is invalid. Please check the file format.".to_string()
                }
                ConfigError::SerializeError(_) => {
                    "Could not save configuration. Internal error.".to_string()
                }
                ConfigError::ValidationError(msg) => format!("Configuration error: {}", msg),
            },
            AppError::Api(e) => match e {
                ApiError::Client { message, .. } => message.clone(),
                ApiError::Server { message } => format!("Server error: {}", message),
                ApiError::Generic { message } => message.clone(),
                ApiError::Decode(_) => "Unexpected response from the server. Please try again.".to_string(),
                ApiError::NotAuthenticated => "You are not logged in.".to_string(),
                ApiError::ReauthFailed(_) => {
                    "Your session has expired and could not be renewed. Please log in again."
                        .to_string()
                }
                ApiError::InvalidRequest(msg) => msg.clone(),
            },
            AppError::Session(e) => match e {
                SessionError::Keyring(_) => {
                    "Could not access secure storage. Please check your keyring.".to_string()
                }
                _ => "Could not access the saved session. Please log in again.".to_string(),
            },
            AppError::Calendar(e) => e.to_string(),
            AppError::Io(_) => "A file operation failed. Please check file permissions.".to_string(),
            AppError::Other(msg) => msg.clone(),
        }
    }

    /// Check if this error is critical and requires user acknowledgment.
    ///
    /// Critical errors prevent the client from working at all: bad
    /// configuration, unusable secure storage, or a dead session.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            AppError::Config(_)
                | AppError::Session(SessionError::Keyring(_))
                | AppError::Api(ApiError::ReauthFailed(_))
                | AppError::Api(ApiError::NotAuthenticated)
        )
    }

    /// Check if this error is recoverable.
    ///
    /// Recoverable errors leave the user where they were; they can correct
    /// their input or try again.
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Api(e) => !e.is_auth_failure(),
            AppError::Calendar(_) | AppError::Io(_) => true,
            _ => false,
        }
    }

    /// Get a suggested action for the user.
    pub fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AppError::Config(ConfigError::ParseError(_)) | AppError::Config(ConfigError::ValidationError(_)) => {
                Some("Fix or delete config.toml to fall back to the defaults.")
            }
            AppError::Api(ApiError::NotAuthenticated) | AppError::Api(ApiError::ReauthFailed(_)) => {
                Some("Run 'digiworkhub login' to sign in again.")
            }
            AppError::Api(ApiError::Generic { .. }) => {
                Some("Check your internet connection and the configured base URL.")
            }
            AppError::Api(ApiError::Server { .. }) => Some("Wait a moment and try again."),
            _ => None,
        }
    }
}

/// Result type for application operations.
pub type Result<T> = std::result::Result<T, AppError>;
