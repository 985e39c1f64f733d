//! DigiWorkHub API client implementation.
//!
//! This module provides the main client for the DigiWorkHub REST API. It
//! builds requests, attaches the session token, runs the auth-token guard
//! before every authorized call, and classifies every response. Endpoint
//! methods live in [`super::endpoints`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use super::auth::Credentials;
use super::classify::classify_result;
use super::error::{ApiError, Outcome, Result};
use super::guard::{self, Clock, GuardDecision, GuardState, SystemClock};
use super::transport::{Body, HttpRequest, Method, ReqwestTransport, Transport};
use super::types::{AuthResponse, LoginRequest};
use crate::config::Settings;
use crate::push::{NoPushToken, PushTokenSource};
use crate::session::SessionStore;

/// Per-call options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    /// Run the auth-token guard and send the bearer header.
    pub requires_auth: bool,
}

impl RequestOptions {
    /// Options for calls that need a session.
    pub const AUTHORIZED: Self = Self { requires_auth: true };
    /// Options for signup, login and password reset.
    pub const UNAUTHORIZED: Self = Self { requires_auth: false };
}

/// The DigiWorkHub API client.
///
/// Cheap to clone; clones share the transport and the session store.
pub struct WorkHubClient<T: Transport = ReqwestTransport> {
    transport: Arc<T>,
    base_url: String,
    session: Arc<SessionStore>,
    push_tokens: Arc<dyn PushTokenSource>,
    clock: Arc<dyn Clock>,
}

impl<T: Transport> Clone for WorkHubClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            base_url: self.base_url.clone(),
            session: Arc::clone(&self.session),
            push_tokens: Arc::clone(&self.push_tokens),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<T: Transport> fmt::Debug for WorkHubClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkHubClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl WorkHubClient<ReqwestTransport> {
    /// Create a client from settings using the `reqwest` transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    #[instrument(skip_all, fields(base_url = %settings.base_url))]
    pub fn from_settings(settings: &Settings, session: Arc<SessionStore>) -> Result<Self> {
        info!("Creating DigiWorkHub client");
        let transport = ReqwestTransport::new(Duration::from_secs(settings.timeout_secs))?;
        Ok(Self::new(&settings.base_url, transport, session))
    }
}

impl<T: Transport> WorkHubClient<T> {
    /// Create a client over an explicit transport.
    pub fn new(base_url: &str, transport: T, session: Arc<SessionStore>) -> Self {
        Self {
            transport: Arc::new(transport),
            base_url: normalize_base_url(base_url),
            session,
            push_tokens: Arc::new(NoPushToken),
            clock: Arc::new(SystemClock),
        }
    }

    /// Use `source` to obtain the device push token sent on login.
    pub fn with_push_tokens(mut self, source: Arc<dyn PushTokenSource>) -> Self {
        self.push_tokens = source;
        self
    }

    /// Use `clock` for token expiry checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The shared session store.
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The transport this client sends through.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Issue one call and classify the result.
    ///
    /// Authorized calls go through the guard first; the request is not sent
    /// until a usable token is in hand.
    #[instrument(skip_all, fields(method = %method, path = %path))]
    pub(crate) async fn call<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Body,
        options: RequestOptions,
    ) -> Outcome<R> {
        let bearer = if options.requires_auth {
            Some(self.authorize().await?)
        } else {
            None
        };
        self.dispatch(method, path, body, bearer).await
    }

    /// Send one request as-is and classify the result. Never runs the guard.
    async fn dispatch<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Body,
        bearer: Option<String>,
    ) -> Outcome<R> {
        let request = HttpRequest {
            method,
            url: self.url(path),
            bearer,
            body,
        };

        let outcome = classify_result(self.transport.send(request).await);
        if let Err(e) = &outcome {
            warn!(category = ?e.category(), "Request failed: {}", e);
        }
        outcome
    }

    pub(crate) async fn get<R: DeserializeOwned>(&self, path: &str) -> Outcome<R> {
        self.call(Method::Get, path, Body::Empty, RequestOptions::AUTHORIZED)
            .await
    }

    pub(crate) async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Outcome<R> {
        self.call(Method::Post, path, json_body(body)?, RequestOptions::AUTHORIZED)
            .await
    }

    pub(crate) async fn put<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Outcome<R> {
        self.call(Method::Put, path, json_body(body)?, RequestOptions::AUTHORIZED)
            .await
    }

    pub(crate) async fn delete<R: DeserializeOwned>(&self, path: &str) -> Outcome<R> {
        self.call(Method::Delete, path, Body::Empty, RequestOptions::AUTHORIZED)
            .await
    }

    /// Produce a usable session token, logging in again if it has expired.
    async fn authorize(&self) -> Result<String> {
        let session = self.session.snapshot();
        match guard::inspect(&session, self.clock.now()) {
            GuardDecision::Proceed(token) => Ok(token),
            GuardDecision::LoggedOut => {
                debug!("Authorized call without a session");
                Err(ApiError::NotAuthenticated)
            }
            GuardDecision::Refresh(credentials) => {
                info!(state = %GuardState::Refreshing, "Session token expired, logging in again");
                let token = self.refresh(&credentials).await.map_err(|e| {
                    error!("Re-authentication failed: {}", e);
                    ApiError::ReauthFailed(Box::new(e))
                })?;
                info!(state = %GuardState::Authorized, "Session token refreshed");
                Ok(token)
            }
        }
    }

    async fn refresh(&self, credentials: &Credentials) -> Result<String> {
        if !credentials.is_complete() {
            return Err(ApiError::NotAuthenticated);
        }

        let auth = self.send_login(credentials).await?;
        let stored = self
            .session
            .set_token_for(credentials.email(), &auth.token)
            .map_err(|e| ApiError::generic(e.to_string()))?;
        if !stored {
            warn!("Session was logged out or replaced while logging in again");
            return Err(ApiError::NotAuthenticated);
        }
        Ok(auth.token)
    }

    /// Record a freshly issued device push token for later logins.
    pub fn remember_push_token(&self, token: &str) {
        self.push_tokens.remember(token);
    }

    /// The device push token, or an empty string when there is none.
    pub(crate) async fn current_push_token(&self) -> String {
        self.push_tokens.current_token().await.unwrap_or_default()
    }

    /// Post the login request without touching the session.
    pub(crate) async fn send_login(&self, credentials: &Credentials) -> Outcome<AuthResponse> {
        let request = LoginRequest {
            email: credentials.email().to_string(),
            password: credentials.password().to_string(),
            fcm_token: self.current_push_token().await,
        };
        self.dispatch(Method::Post, "/auth/login", json_body(&request)?, None)
            .await
    }
}

/// Serialize a request envelope as a JSON body.
pub(crate) fn json_body<B: Serialize>(body: &B) -> Result<Body> {
    serde_json::to_value(body)
        .map(Body::Json)
        .map_err(|e| ApiError::InvalidRequest(format!("failed to encode body: {}", e)))
}

/// Encode one path segment.
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Normalize the base URL by removing trailing slashes and warning on HTTP.
fn normalize_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');

    if !url.starts_with("https://") && !url.contains("localhost") && !url.contains("127.0.0.1") {
        warn!("URL does not use HTTPS: {}. This is insecure for production use.", url);
    }

    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url_removes_trailing_slash() {
        assert_eq!(
            normalize_base_url("https://api.digiworkhub.app/api/"),
            "https://api.digiworkhub.app/api"
        );
    }

    #[test]
    fn test_normalize_base_url_handles_multiple_slashes() {
        assert_eq!(
            normalize_base_url(" https://api.digiworkhub.app/// "),
            "https://api.digiworkhub.app"
        );
    }

    #[test]
    fn test_segment_encodes_reserved_characters() {
        assert_eq!(segment("t-1"), "t-1");
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn test_json_body_wraps_value() {
        let body = json_body(&serde_json::json!({"status": "done"})).unwrap();
        assert_eq!(body, Body::Json(serde_json::json!({"status": "done"})));
    }

    #[test]
    fn test_request_options_constants() {
        assert!(RequestOptions::AUTHORIZED.requires_auth);
        assert!(!RequestOptions::UNAUTHORIZED.requires_auth);
    }

    mod refresh {
        use super::super::*;
        use crate::api::auth::make_token;
        use crate::api::testing::{auth_json, client_with_store, session_with, ScriptedTransport};
        use crate::session::{Session, SessionStore};

        fn expired_store() -> Arc<SessionStore> {
            Arc::new(SessionStore::with_session(session_with(make_token(Some(1)))))
        }

        #[tokio::test]
        async fn test_logout_during_relogin_stays_logged_out() {
            let store = expired_store();
            let during = Arc::clone(&store);
            let transport = ScriptedTransport::default()
                .reply(200, &auth_json(&make_token(None)))
                .on_send(move |request| {
                    if request.url.ends_with("/auth/login") {
                        during.clear().unwrap();
                    }
                });
            let client = client_with_store(transport, Arc::clone(&store));

            let err = client.list_users().await.unwrap_err();

            assert_eq!(err, ApiError::ReauthFailed(Box::new(ApiError::NotAuthenticated)));
            assert!(!store.is_logged_in());
            assert_eq!(store.snapshot(), Session::default());
            // The protected call never went out.
            assert_eq!(client.transport().requests().len(), 1);
        }

        #[tokio::test]
        async fn test_other_login_during_relogin_keeps_new_session() {
            let store = expired_store();
            let during = Arc::clone(&store);
            let mut other = session_with("other.user.token".to_string());
            other.email = "grace@example.com".to_string();
            other.user_id = "u-2".to_string();
            let replacement = other.clone();

            let transport = ScriptedTransport::default()
                .reply(200, &auth_json(&make_token(None)))
                .on_send(move |request| {
                    if request.url.ends_with("/auth/login") {
                        during.replace(replacement.clone()).unwrap();
                    }
                });
            let client = client_with_store(transport, Arc::clone(&store));

            assert!(client.current_user().await.is_err());
            assert_eq!(store.snapshot(), other);
        }

        #[tokio::test]
        async fn test_relogin_stores_token_for_same_account() {
            let fresh = make_token(None);
            let store = expired_store();
            let transport = ScriptedTransport::default()
                .reply(200, &auth_json(&fresh))
                .reply(200, "[]");
            let client = client_with_store(transport, Arc::clone(&store));

            client.list_users().await.unwrap();

            assert_eq!(store.token().as_deref(), Some(fresh.as_str()));
            assert_eq!(store.snapshot().user_id, "u-1");
        }
    }
}
