//! Session token inspection and login credentials.
//!
//! Tokens issued by the DigiWorkHub API are JWTs. The client never verifies
//! the signature; it only reads the `exp` claim so it can log in again before
//! the server starts rejecting requests.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL, Engine};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

/// Claims read from a session token payload.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Expiry as seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<i64>,
    /// Subject, usually the user id.
    #[serde(default)]
    pub sub: Option<String>,
}

impl TokenClaims {
    /// Decode the payload segment of a JWT.
    ///
    /// Returns `None` if the token is not a three-part JWT or the payload is
    /// not valid base64url JSON.
    pub fn decode(token: &str) -> Option<Self> {
        let mut segments = token.split('.');
        let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
        if segments.next().is_some() {
            return None;
        }

        let bytes = BASE64_URL.decode(payload.trim_end_matches('=')).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// The expiry instant, if the token carries one.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }
}

/// Check whether a token is expired at `now`.
///
/// A token is expired when its `exp` is at or before `now`. A token that
/// cannot be decoded counts as expired, and so does an `exp` outside the
/// representable date range. A token without `exp` never expires.
pub fn is_token_expired(token: &str, now: DateTime<Utc>) -> bool {
    let Some(claims) = TokenClaims::decode(token) else {
        return true;
    };
    match (claims.exp, claims.expires_at()) {
        (None, _) => false,
        (Some(_), Some(expiry)) => expiry <= now,
        (Some(_), None) => true,
    }
}

/// Email and password used to log in.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.trim().to_string(),
            password: password.to_string(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Whether both parts are present.
    pub fn is_complete(&self) -> bool {
        !self.email.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Build an unsigned JWT carrying the given expiry. Test helper.
#[cfg(test)]
pub(crate) fn make_token(exp: Option<i64>) -> String {
    let header = BASE64_URL.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = match exp {
        Some(exp) => format!(r#"{{"sub":"u-1","exp":{}}}"#, exp),
        None => r#"{"sub":"u-1"}"#.to_string(),
    };
    format!("{}.{}.signature", header, BASE64_URL.encode(payload.as_bytes()))
}
