//! Internal messages: inbox, sent folder, composing.

use serde_json::json;
use tracing::{debug, instrument};

use crate::api::client::{segment, RequestOptions, WorkHubClient};
use crate::api::error::Outcome;
use crate::api::transport::{Body, FilePart, Method, Transport};
use crate::api::types::{Ack, Message, NewMessage};

/// A message folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mailbox {
    Inbox,
    Sent,
}

impl Mailbox {
    fn path(&self) -> &'static str {
        match self {
            Mailbox::Inbox => "/messages/inbox",
            Mailbox::Sent => "/messages/sent",
        }
    }
}

impl<T: Transport> WorkHubClient<T> {
    #[instrument(skip(self))]
    pub async fn list_messages(&self, mailbox: Mailbox) -> Outcome<Vec<Message>> {
        let messages: Vec<Message> = self.get(mailbox.path()).await?;
        debug!("Fetched {} messages", messages.len());
        Ok(messages)
    }

    #[instrument(skip(self))]
    pub async fn get_message(&self, id: &str) -> Outcome<Message> {
        self.get(&format!("/messages/{}", segment(id))).await
    }

    /// Send a message, as multipart when it carries attachments.
    #[instrument(skip(self, message, attachments), fields(subject = %message.subject, files = attachments.len()))]
    pub async fn send_message(
        &self,
        message: &NewMessage,
        attachments: Vec<FilePart>,
    ) -> Outcome<Message> {
        if attachments.is_empty() {
            return self.post("/messages", message).await;
        }

        let fields = vec![
            ("recipientIds".to_string(), message.recipient_ids.join(",")),
            ("subject".to_string(), message.subject.clone()),
            ("body".to_string(), message.body.clone()),
        ];
        self.call(
            Method::Post,
            "/messages",
            Body::Multipart {
                fields,
                files: attachments,
            },
            RequestOptions::AUTHORIZED,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn mark_message_read(&self, id: &str) -> Outcome<Ack> {
        self.put(&format!("/messages/{}/read", segment(id)), &json!({}))
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_message(&self, id: &str) -> Outcome<Ack> {
        self.delete(&format!("/messages/{}", segment(id))).await
    }
}
