//! Background execution of screen operations.
//!
//! A front end must stay responsive while a request is in flight. Instead of
//! awaiting inline, it spawns the operation through [`TaskSpawner`] and keeps
//! handling input; the outcome arrives later as an [`ApiMessage`] on the
//! channel returned by [`create_task_channel`].
//!
//! To add a new operation:
//! 1. Add a variant to `ApiMessage` for the result
//! 2. Add a spawn method to `TaskSpawner`
//! 3. Handle the message in the front end's event loop

use tokio::sync::mpsc;
use tracing::debug;

use crate::api::types::{Ack, ChecklistItem, Comment, Message, NewMessage, Task, TaskStatus, User};
use crate::api::{FilePart, Mailbox, Outcome, TaskFilter, Transport, WorkHubClient};

/// Messages sent from background tasks to the front end.
#[derive(Debug)]
pub enum ApiMessage {
    /// Login finished.
    LoggedIn(Outcome<User>),

    /// A task list was fetched.
    TasksFetched {
        filter: TaskFilter,
        result: Outcome<Vec<Task>>,
    },

    /// A single task was fetched.
    TaskFetched(Outcome<Task>),

    /// A status change finished.
    StatusChanged {
        task_id: String,
        result: Outcome<Task>,
    },

    /// The assignee list was replaced.
    AssigneesChanged {
        task_id: String,
        result: Outcome<Task>,
    },

    /// A comment was posted.
    CommentAdded {
        task_id: String,
        result: Outcome<Comment>,
    },

    /// A checklist item was toggled.
    ChecklistToggled(Outcome<ChecklistItem>),

    /// The user directory was fetched.
    UsersFetched(Outcome<Vec<User>>),

    /// A mailbox was fetched.
    MessagesFetched {
        mailbox: Mailbox,
        result: Outcome<Vec<Message>>,
    },

    /// A message was sent.
    MessageSent(Outcome<Message>),

    /// A message was marked read.
    MessageRead {
        message_id: String,
        result: Outcome<Ack>,
    },
}

/// Spawns background tasks for API operations.
///
/// Each method clones the client (cheap, shared state) into a tokio task
/// that sends its outcome through the channel. A closed receiver is not an
/// error; the outcome is dropped.
pub struct TaskSpawner<T: Transport + 'static> {
    client: WorkHubClient<T>,
    tx: mpsc::UnboundedSender<ApiMessage>,
}

impl<T: Transport + 'static> Clone for TaskSpawner<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            tx: self.tx.clone(),
        }
    }
}

impl<T: Transport + 'static> TaskSpawner<T> {
    /// Create a TaskSpawner with the given client and channel sender.
    pub fn new(client: WorkHubClient<T>, tx: mpsc::UnboundedSender<ApiMessage>) -> Self {
        Self { client, tx }
    }

    fn send(tx: &mpsc::UnboundedSender<ApiMessage>, message: ApiMessage) {
        if tx.send(message).is_err() {
            debug!("Task result dropped; receiver closed");
        }
    }

    /// Spawn a login.
    pub fn spawn_login(&self, email: String, password: String) {
        let tx = self.tx.clone();
        let client = self.client.clone();
        tokio::spawn(async move {
            let result = client.login(&email, &password).await.map(|auth| auth.user);
            Self::send(&tx, ApiMessage::LoggedIn(result));
        });
    }

    /// Spawn a task list fetch.
    pub fn spawn_fetch_tasks(&self, filter: TaskFilter) {
        let tx = self.tx.clone();
        let client = self.client.clone();
        tokio::spawn(async move {
            let result = client.list_tasks(filter).await;
            Self::send(&tx, ApiMessage::TasksFetched { filter, result });
        });
    }

    /// Spawn a single task fetch.
    pub fn spawn_fetch_task(&self, task_id: String) {
        let tx = self.tx.clone();
        let client = self.client.clone();
        tokio::spawn(async move {
            let result = client.get_task(&task_id).await;
            Self::send(&tx, ApiMessage::TaskFetched(result));
        });
    }

    /// Spawn a status change.
    pub fn spawn_change_status(&self, task_id: String, status: TaskStatus) {
        let tx = self.tx.clone();
        let client = self.client.clone();
        tokio::spawn(async move {
            let result = client.change_task_status(&task_id, status).await;
            Self::send(&tx, ApiMessage::StatusChanged { task_id, result });
        });
    }

    /// Spawn an assignee edit.
    pub fn spawn_edit_assignees(&self, task_id: String, assignee_ids: Vec<String>) {
        let tx = self.tx.clone();
        let client = self.client.clone();
        tokio::spawn(async move {
            let result = client.edit_assignees(&task_id, assignee_ids).await;
            Self::send(&tx, ApiMessage::AssigneesChanged { task_id, result });
        });
    }

    /// Spawn posting a comment.
    pub fn spawn_add_comment(&self, task_id: String, text: String) {
        let tx = self.tx.clone();
        let client = self.client.clone();
        tokio::spawn(async move {
            let result = client.add_comment(&task_id, &text).await;
            Self::send(&tx, ApiMessage::CommentAdded { task_id, result });
        });
    }

    /// Spawn a checklist toggle.
    pub fn spawn_toggle_checklist_item(&self, item_id: String) {
        let tx = self.tx.clone();
        let client = self.client.clone();
        tokio::spawn(async move {
            let result = client.toggle_checklist_item(&item_id).await;
            Self::send(&tx, ApiMessage::ChecklistToggled(result));
        });
    }

    /// Spawn a user directory fetch.
    pub fn spawn_fetch_users(&self) {
        let tx = self.tx.clone();
        let client = self.client.clone();
        tokio::spawn(async move {
            let result = client.list_users().await;
            Self::send(&tx, ApiMessage::UsersFetched(result));
        });
    }

    /// Spawn a mailbox fetch.
    pub fn spawn_fetch_messages(&self, mailbox: Mailbox) {
        let tx = self.tx.clone();
        let client = self.client.clone();
        tokio::spawn(async move {
            let result = client.list_messages(mailbox).await;
            Self::send(&tx, ApiMessage::MessagesFetched { mailbox, result });
        });
    }

    /// Spawn sending a message.
    pub fn spawn_send_message(&self, message: NewMessage, attachments: Vec<FilePart>) {
        let tx = self.tx.clone();
        let client = self.client.clone();
        tokio::spawn(async move {
            let result = client.send_message(&message, attachments).await;
            Self::send(&tx, ApiMessage::MessageSent(result));
        });
    }

    /// Spawn marking a message read.
    pub fn spawn_mark_read(&self, message_id: String) {
        let tx = self.tx.clone();
        let client = self.client.clone();
        tokio::spawn(async move {
            let result = client.mark_message_read(&message_id).await;
            Self::send(&tx, ApiMessage::MessageRead { message_id, result });
        });
    }
}

/// Create the channel and spawner pair.
pub fn create_task_channel<T: Transport + 'static>(
    client: WorkHubClient<T>,
) -> (mpsc::UnboundedReceiver<ApiMessage>, TaskSpawner<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (rx, TaskSpawner::new(client, tx))
}
