//! Push notification handling.
//!
//! Two events arrive from the push provider: a new device token, and an
//! inbound data message. New tokens are registered with the server when a
//! session exists; messages become local notifications.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::api::{Outcome, Transport, WorkHubClient};

/// Supplies the push token of this device.
#[async_trait]
pub trait PushTokenSource: Send + Sync {
    /// The current token, or `None` when push is unavailable.
    async fn current_token(&self) -> Option<String>;

    /// Record a token the push provider just issued. Sources that cannot
    /// change ignore it.
    fn remember(&self, _token: &str) {}
}

/// A device without push support.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPushToken;

#[async_trait]
impl PushTokenSource for NoPushToken {
    async fn current_token(&self) -> Option<String> {
        None
    }
}

/// The latest token issued to this device.
///
/// Seeded from configuration at startup and replaced whenever the push
/// provider rotates the token, so the next login carries the current one.
#[derive(Debug, Default)]
pub struct DevicePushToken {
    token: RwLock<Option<String>>,
}

impl DevicePushToken {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token.filter(|t| !t.is_empty())),
        }
    }
}

#[async_trait]
impl PushTokenSource for DevicePushToken {
    async fn current_token(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn remember(&self, token: &str) {
        let token = token.trim();
        if !token.is_empty() {
            *self.token.write() = Some(token.to_string());
        }
    }
}

/// What a notification opens when tapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationTarget {
    Task(String),
    Message(String),
    Inbox,
}

/// A notification to show on this device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalNotification {
    pub title: String,
    pub body: String,
    pub target: NotificationTarget,
}

/// Title used when the payload carries none.
const DEFAULT_TITLE: &str = "DigiWorkHub";

impl LocalNotification {
    /// Build a notification from a push data payload.
    ///
    /// Recognized keys: `title`, `body`, `taskId`, `messageId`.
    pub fn from_payload(data: &HashMap<String, String>) -> Self {
        let field = |key: &str| data.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let target = if let Some(id) = field("taskId") {
            NotificationTarget::Task(id.to_string())
        } else if let Some(id) = field("messageId") {
            NotificationTarget::Message(id.to_string())
        } else {
            NotificationTarget::Inbox
        };

        Self {
            title: field("title").unwrap_or(DEFAULT_TITLE).to_string(),
            body: field("body").unwrap_or_default().to_string(),
            target,
        }
    }
}

/// Displays local notifications.
pub trait NotificationSink: Send + Sync {
    fn show(&self, notification: LocalNotification);
}

/// Sink that writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn show(&self, notification: LocalNotification) {
        info!(target_ref = ?notification.target, "{}: {}", notification.title, notification.body);
    }
}

/// Reacts to push provider events.
pub struct PushHandler<T: Transport> {
    client: WorkHubClient<T>,
    sink: Arc<dyn NotificationSink>,
}

impl<T: Transport> PushHandler<T> {
    pub fn new(client: WorkHubClient<T>, sink: Arc<dyn NotificationSink>) -> Self {
        Self { client, sink }
    }

    /// Handle a refreshed device token.
    ///
    /// The token is always remembered by the client's token source. Returns
    /// `Ok(true)` when it was also sent to the server and `Ok(false)` when
    /// there is no session to attach it to yet. An expired
    /// session is renewed by the guard before the token is sent.
    pub async fn on_new_token(&self, token: &str) -> Outcome<bool> {
        self.client.remember_push_token(token);

        if !self.client.session().is_logged_in() {
            debug!("Push token refreshed while logged out; kept for the next login");
            return Ok(false);
        }

        self.client.register_device_token(token).await?;
        info!("Registered refreshed push token");
        Ok(true)
    }

    /// Handle an inbound data message.
    pub fn on_message(&self, data: &HashMap<String, String>) {
        self.sink.show(LocalNotification::from_payload(data));
    }
}
