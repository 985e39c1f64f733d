//! Test helpers: a transport that replays canned responses.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::auth::make_token;
use super::transport::{HttpRequest, RawResponse, Transport, TransportError};
use super::WorkHubClient;
use crate::session::{Session, SessionStore};

type SendHook = Box<dyn Fn(&HttpRequest) + Send + Sync>;

/// Replays queued responses in order and records every request.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    on_send: Option<SendHook>,
}

impl ScriptedTransport {
    pub(crate) fn reply(self, status: u16, body: &str) -> Self {
        self.replies.lock().push_back(Ok(RawResponse::new(status, body)));
        self
    }

    pub(crate) fn fail(self, message: &str) -> Self {
        self.replies.lock().push_back(Err(TransportError::new(message)));
        self
    }

    /// Run `hook` while each request is in flight, before its reply returns.
    pub(crate) fn on_send(mut self, hook: impl Fn(&HttpRequest) + Send + Sync + 'static) -> Self {
        self.on_send = Some(Box::new(hook));
        self
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        if let Some(hook) = &self.on_send {
            hook(&request);
        }
        self.requests.lock().push(request);
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::new("no scripted reply left")))
    }
}

/// The session of the test user, holding `token`.
pub(crate) fn session_with(token: String) -> Session {
    Session {
        token,
        user_id: "u-1".to_string(),
        display_name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        password: "secret".to_string(),
        avatar: None,
    }
}

/// Build a client over `transport` sharing `store`.
pub(crate) fn client_with_store(
    transport: ScriptedTransport,
    store: Arc<SessionStore>,
) -> WorkHubClient<ScriptedTransport> {
    WorkHubClient::new("https://api.test", transport, store)
}

/// Build a client over `transport` with a logged-in, never-expiring session.
pub(crate) fn logged_in_client(transport: ScriptedTransport) -> WorkHubClient<ScriptedTransport> {
    client_with_store(
        transport,
        Arc::new(SessionStore::with_session(session_with(make_token(None)))),
    )
}

/// Build a client over `transport` with no session.
pub(crate) fn logged_out_client(transport: ScriptedTransport) -> WorkHubClient<ScriptedTransport> {
    client_with_store(transport, Arc::new(SessionStore::in_memory()))
}

/// A login/signup reply for the test user carrying `token`.
pub(crate) fn auth_json(token: &str) -> String {
    format!(r#"{{"token":"{}","user":{}}}"#, token, USER_JSON)
}

pub(crate) const USER_JSON: &str =
    r#"{"id":"u-1","name":"Ada","email":"ada@example.com"}"#;
