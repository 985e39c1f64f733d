//! API error types for the DigiWorkHub client.
//!
//! Every call resolves to an [`Outcome`]: the success payload, or exactly one
//! [`ApiError`]. Each error belongs to one of three categories the UI layer
//! cares about (client, server, generic), see [`ApiError::category`].

use thiserror::Error;

/// The coarse bucket an error falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 4xx responses. Usually user-correctable (validation, bad credentials).
    Client,
    /// 5xx responses. A backend fault.
    Server,
    /// Network failures, malformed responses, anything unclassified.
    Generic,
}

/// Errors that can occur when talking to the DigiWorkHub API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server rejected the request (HTTP 4xx).
    #[error("{message}")]
    Client {
        /// Machine-readable error type reported by the server.
        kind: String,
        /// Human-readable message reported by the server.
        message: String,
    },

    /// The server failed to handle the request (HTTP 5xx).
    #[error("{message}")]
    Server {
        /// The server's error message.
        message: String,
    },

    /// Transport failure or a status outside the known ranges.
    #[error("{message}")]
    Generic {
        /// The failure message or raw body text.
        message: String,
    },

    /// A successful response whose body could not be decoded.
    #[error("Invalid API response: {0}")]
    Decode(String),

    /// An authorized call was attempted without a session token.
    #[error("Not logged in")]
    NotAuthenticated,

    /// The token had expired and logging in again failed.
    #[error("Session expired and re-authentication failed: {0}")]
    ReauthFailed(Box<ApiError>),

    /// The request could not be built (bad URL, unreadable upload).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Result of a single API call.
pub type Outcome<T> = std::result::Result<T, ApiError>;

/// Result type for API operations.
pub type Result<T> = Outcome<T>;

impl ApiError {
    /// Create a client error.
    pub fn client(kind: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Client {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create a server error.
    pub fn server(message: impl Into<String>) -> Self {
        ApiError::Server {
            message: message.into(),
        }
    }

    /// Create a generic error.
    pub fn generic(message: impl Into<String>) -> Self {
        ApiError::Generic {
            message: message.into(),
        }
    }

    /// The category this error is reported under.
    ///
    /// A failed re-login is reported under the category of the failure that
    /// caused it.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ApiError::Client { .. } | ApiError::NotAuthenticated => ErrorCategory::Client,
            ApiError::Server { .. } => ErrorCategory::Server,
            ApiError::Generic { .. } | ApiError::Decode(_) | ApiError::InvalidRequest(_) => {
                ErrorCategory::Generic
            }
            ApiError::ReauthFailed(inner) => inner.category(),
        }
    }

    /// The message to present to the user.
    pub fn message(&self) -> String {
        match self {
            ApiError::Client { message, .. }
            | ApiError::Server { message }
            | ApiError::Generic { message } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether this error means the stored session is no longer usable.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::NotAuthenticated | ApiError::ReauthFailed(_))
    }
}
