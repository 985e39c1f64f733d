//! Subtasks of a task.

use tracing::instrument;

use crate::api::client::{segment, WorkHubClient};
use crate::api::error::Outcome;
use crate::api::transport::Transport;
use crate::api::types::{Ack, NewSubtask, StatusChange, Subtask, TaskStatus};

impl<T: Transport> WorkHubClient<T> {
    #[instrument(skip(self))]
    pub async fn list_subtasks(&self, task_id: &str) -> Outcome<Vec<Subtask>> {
        self.get(&format!("/tasks/{}/subtasks", segment(task_id))).await
    }

    #[instrument(skip(self, subtask), fields(title = %subtask.title))]
    pub async fn create_subtask(&self, task_id: &str, subtask: &NewSubtask) -> Outcome<Subtask> {
        self.post(&format!("/tasks/{}/subtasks", segment(task_id)), subtask)
            .await
    }

    #[instrument(skip(self))]
    pub async fn change_subtask_status(&self, id: &str, status: TaskStatus) -> Outcome<Subtask> {
        self.put(&format!("/subtasks/{}/status", segment(id)), &StatusChange { status })
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_subtask(&self, id: &str) -> Outcome<Ack> {
        self.delete(&format!("/subtasks/{}", segment(id))).await
    }
}
