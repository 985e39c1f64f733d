//! Checklist items on a task.

use serde_json::json;
use tracing::instrument;

use crate::api::client::{segment, WorkHubClient};
use crate::api::error::Outcome;
use crate::api::transport::Transport;
use crate::api::types::{Ack, ChecklistItem, NewChecklistItem};

impl<T: Transport> WorkHubClient<T> {
    #[instrument(skip(self))]
    pub async fn add_checklist_item(&self, task_id: &str, text: &str) -> Outcome<ChecklistItem> {
        let item = NewChecklistItem {
            text: text.trim().to_string(),
        };
        self.post(&format!("/tasks/{}/checklist", segment(task_id)), &item)
            .await
    }

    /// Flip the checked state of an item.
    #[instrument(skip(self))]
    pub async fn toggle_checklist_item(&self, id: &str) -> Outcome<ChecklistItem> {
        self.put(&format!("/checklist/{}/toggle", segment(id)), &json!({}))
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_checklist_item(&self, id: &str) -> Outcome<Ack> {
        self.delete(&format!("/checklist/{}", segment(id))).await
    }
}
