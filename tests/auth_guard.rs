//! End-to-end behavior of the auth-token guard over a scripted transport.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;

use digiworkhub::api::types::TaskStatus;
use digiworkhub::api::{
    ApiError, Body, ErrorCategory, FixedClock, HttpRequest, Method, RawResponse, TaskFilter,
    Transport, TransportError, WorkHubClient,
};
use digiworkhub::push::DevicePushToken;
use digiworkhub::session::{Session, SessionStore};

/// 2024-01-15T12:00:00Z
const NOW: i64 = 1_705_320_000;

#[derive(Default)]
struct ScriptedTransport {
    replies: Mutex<VecDeque<RawResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    fn reply(self, status: u16, body: &str) -> Self {
        self.replies.lock().push_back(RawResponse::new(status, body));
        self
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    fn logins(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.url.ends_with("/auth/login"))
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        self.requests.lock().push(request);
        self.replies
            .lock()
            .pop_front()
            .ok_or_else(|| TransportError::new("connection refused"))
    }
}

fn token(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"u-1","exp":{}}}"#, exp));
    format!("{}.{}.sig", header, claims)
}

fn session_with(token: String) -> Session {
    Session {
        token,
        user_id: "u-1".to_string(),
        display_name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        password: "secret".to_string(),
        avatar: None,
    }
}

fn client(transport: ScriptedTransport, session: Session) -> WorkHubClient<ScriptedTransport> {
    let now = Utc.timestamp_opt(NOW, 0).single().unwrap();
    WorkHubClient::new(
        "https://api.test/api/",
        transport,
        Arc::new(SessionStore::with_session(session)),
    )
    .with_clock(Arc::new(FixedClock(now)))
    .with_push_tokens(Arc::new(DevicePushToken::new(Some("device-7".to_string()))))
}

fn auth_json(token: &str) -> String {
    format!(
        r#"{{"token":"{}","user":{{"id":"u-1","name":"Ada","email":"ada@example.com"}}}}"#,
        token
    )
}

#[tokio::test]
async fn expired_token_triggers_one_login_before_the_call() {
    let fresh = token(NOW + 3600);
    let transport = ScriptedTransport::default()
        .reply(200, &auth_json(&fresh))
        .reply(200, "[]");
    let client = client(transport, session_with(token(NOW - 60)));

    let tasks = client.list_tasks(TaskFilter::Assigned).await.unwrap();
    assert!(tasks.is_empty());

    let requests = client.transport().requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(client.transport().logins(), 1);

    let login = &requests[0];
    assert_eq!(login.method, Method::Post);
    assert_eq!(login.url, "https://api.test/api/auth/login");
    assert_eq!(login.bearer, None);
    assert_eq!(
        login.body,
        Body::Json(serde_json::json!({
            "email": "ada@example.com",
            "password": "secret",
            "fcmToken": "device-7"
        }))
    );

    let call = &requests[1];
    assert_eq!(call.url, "https://api.test/api/tasks/assigned");
    assert_eq!(call.bearer.as_deref(), Some(fresh.as_str()));

    assert_eq!(client.session().token().as_deref(), Some(fresh.as_str()));
}

#[tokio::test]
async fn fresh_token_skips_login() {
    let current = token(NOW + 3600);
    let transport = ScriptedTransport::default().reply(200, "[]");
    let client = client(transport, session_with(current.clone()));

    client.list_tasks(TaskFilter::All).await.unwrap();

    let requests = client.transport().requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(client.transport().logins(), 0);
    assert_eq!(requests[0].bearer.as_deref(), Some(current.as_str()));
}

#[tokio::test]
async fn failed_relogin_aborts_the_call() {
    let expired = token(NOW - 1);
    let transport = ScriptedTransport::default().reply(
        401,
        r#"{"type":"validation","message":"Invalid credentials"}"#,
    );
    let client = client(transport, session_with(expired.clone()));

    let err = client
        .change_task_status("t-1", TaskStatus::Done)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ApiError::ReauthFailed(Box::new(ApiError::client("validation", "Invalid credentials")))
    );
    assert_eq!(err.category(), ErrorCategory::Client);
    assert!(err.is_auth_failure());

    // Only the login went out.
    assert_eq!(client.transport().requests().len(), 1);
    assert_eq!(client.session().token().as_deref(), Some(expired.as_str()));
}

#[tokio::test]
async fn wrong_password_login_leaves_session_unchanged() {
    let current = token(NOW + 3600);
    let transport = ScriptedTransport::default().reply(
        401,
        r#"{"type":"validation","message":"Invalid credentials"}"#,
    );
    let client = client(transport, session_with(current));
    let before = client.session().snapshot();

    let err = client.login("ada@example.com", "wrong").await.unwrap_err();

    assert_eq!(err, ApiError::client("validation", "Invalid credentials"));
    assert_eq!(client.session().snapshot(), before);
}

#[tokio::test]
async fn login_replaces_session() {
    let fresh = token(NOW + 3600);
    let transport = ScriptedTransport::default().reply(200, &auth_json(&fresh));
    let client = client(transport, Session::default());

    client.login("  ada@example.com ", "secret").await.unwrap();

    let session = client.session().snapshot();
    assert_eq!(session.token, fresh);
    assert_eq!(session.user_id, "u-1");
    assert_eq!(session.email, "ada@example.com");
    assert_eq!(session.password, "secret");
}

#[tokio::test]
async fn logged_out_call_is_not_sent() {
    let client = client(ScriptedTransport::default(), Session::default());

    let err = client.current_user().await.unwrap_err();

    assert_eq!(err, ApiError::NotAuthenticated);
    assert!(client.transport().requests().is_empty());
}

#[tokio::test]
async fn unauthorized_calls_carry_no_bearer() {
    let transport = ScriptedTransport::default().reply(200, r#"{"message":"Email sent"}"#);
    let client = client(transport, session_with(token(NOW + 3600)));

    let ack = client.reset_password("ada@example.com").await.unwrap();

    assert_eq!(ack.message, "Email sent");
    let requests = client.transport().requests();
    assert_eq!(requests[0].url, "https://api.test/api/auth/reset-password");
    assert_eq!(requests[0].bearer, None);
}

#[tokio::test]
async fn network_failure_is_generic() {
    let client = client(ScriptedTransport::default(), session_with(token(NOW + 3600)));

    let err = client.list_users().await.unwrap_err();

    assert_eq!(err, ApiError::generic("connection refused"));
    assert_eq!(err.category(), ErrorCategory::Generic);
}

#[tokio::test]
async fn server_error_is_classified() {
    let transport =
        ScriptedTransport::default().reply(503, r#"{"error":"Service unavailable"}"#);
    let client = client(transport, session_with(token(NOW + 3600)));

    let err = client.get_task("t-1").await.unwrap_err();

    assert_eq!(err, ApiError::server("Service unavailable"));
}
