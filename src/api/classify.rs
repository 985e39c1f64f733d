//! Response classification.
//!
//! Turns whatever came back from the transport into exactly one [`Outcome`].
//! Classification is pure: the same input always yields the same outcome.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::error::{ApiError, Outcome};
use super::transport::{RawResponse, TransportError};

/// Kind reported when a 4xx body does not carry a `type` field.
pub const UNKNOWN_CLIENT_KIND: &str = "unknown";

/// Error body returned with 4xx responses.
#[derive(Debug, Deserialize)]
struct ClientErrorBody {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

/// Error body returned with 5xx responses.
#[derive(Debug, Deserialize)]
struct ServerErrorBody {
    error: String,
}

/// Classify a raw HTTP response.
pub fn classify<T: DeserializeOwned>(response: &RawResponse) -> Outcome<T> {
    match response.status {
        200..=299 => decode_success(&response.body),
        _ => Err(classify_error_status(response)),
    }
}

/// Classify the result of a transport call.
pub fn classify_result<T: DeserializeOwned>(
    result: std::result::Result<RawResponse, TransportError>,
) -> Outcome<T> {
    match result {
        Ok(response) => classify(&response),
        Err(failure) => Err(classify_failure(&failure)),
    }
}

/// Classify a transport failure.
///
/// A failure that carries an HTTP response goes through the 4xx/5xx rules
/// for that response; anything else is generic.
pub fn classify_failure(failure: &TransportError) -> ApiError {
    match &failure.response {
        Some(response) if matches!(response.status, 400..=599) => classify_error_status(response),
        _ => ApiError::generic(failure.message.clone()),
    }
}

fn classify_error_status(response: &RawResponse) -> ApiError {
    debug!(status = response.status, "Error response body: {}", response.body);

    match response.status {
        400..=499 => match serde_json::from_str::<ClientErrorBody>(&response.body) {
            Ok(body) => ApiError::client(body.kind, body.message),
            Err(_) => ApiError::client(UNKNOWN_CLIENT_KIND, fallback_message(response)),
        },
        500..=599 => match serde_json::from_str::<ServerErrorBody>(&response.body) {
            Ok(body) => ApiError::server(body.error),
            Err(_) => ApiError::server(fallback_message(response)),
        },
        _ => ApiError::generic(fallback_message(response)),
    }
}

/// Decode a 2xx body.
///
/// An empty body decodes as JSON `null`, so unit responses succeed and
/// structured ones fail with [`ApiError::Decode`].
fn decode_success<T: DeserializeOwned>(body: &str) -> Outcome<T> {
    let text = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(text)
        .map_err(|e| ApiError::Decode(format!("failed to parse response: {}", e)))
}

fn fallback_message(response: &RawResponse) -> String {
    let body = response.body.trim();
    if body.is_empty() {
        format!("HTTP {}", response.status)
    } else {
        body.to_string()
    }
}
