//! Task lists and single-task operations.

use std::str::FromStr;

use chrono::NaiveDateTime;
use tracing::{debug, instrument};

use crate::api::client::{segment, WorkHubClient};
use crate::api::error::Outcome;
use crate::api::transport::Transport;
use crate::api::types::{
    Ack, AssigneeEdit, DueDateChange, NewTask, Priority, PriorityChange, StatusChange, Task,
    TaskStatus,
};

/// Which task list to fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskFilter {
    /// Every task visible to the user.
    #[default]
    All,
    /// Tasks assigned to the user.
    Assigned,
    /// Tasks the user created.
    Created,
}

impl TaskFilter {
    fn path(&self) -> &'static str {
        match self {
            TaskFilter::All => "/tasks",
            TaskFilter::Assigned => "/tasks/assigned",
            TaskFilter::Created => "/tasks/created",
        }
    }
}

impl FromStr for TaskFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TaskFilter::All),
            "assigned" => Ok(TaskFilter::Assigned),
            "created" => Ok(TaskFilter::Created),
            _ => Err(format!("unknown task filter '{}'", s)),
        }
    }
}

impl<T: Transport> WorkHubClient<T> {
    /// Fetch a task list.
    #[instrument(skip(self))]
    pub async fn list_tasks(&self, filter: TaskFilter) -> Outcome<Vec<Task>> {
        let tasks: Vec<Task> = self.get(filter.path()).await?;
        debug!("Fetched {} tasks", tasks.len());
        Ok(tasks)
    }

    /// Fetch one task with its subtasks, checklist, comments and attachments.
    #[instrument(skip(self))]
    pub async fn get_task(&self, id: &str) -> Outcome<Task> {
        self.get(&format!("/tasks/{}", segment(id))).await
    }

    #[instrument(skip(self, task), fields(title = %task.title))]
    pub async fn create_task(&self, task: &NewTask) -> Outcome<Task> {
        self.post("/tasks", task).await
    }

    #[instrument(skip(self))]
    pub async fn change_task_status(&self, id: &str, status: TaskStatus) -> Outcome<Task> {
        self.put(&format!("/tasks/{}/status", segment(id)), &StatusChange { status })
            .await
    }

    /// Replace the assignee list.
    #[instrument(skip(self))]
    pub async fn edit_assignees(&self, id: &str, assignee_ids: Vec<String>) -> Outcome<Task> {
        self.put(
            &format!("/tasks/{}/assignees", segment(id)),
            &AssigneeEdit { assignee_ids },
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn change_priority(&self, id: &str, priority: Priority) -> Outcome<Task> {
        self.put(
            &format!("/tasks/{}/priority", segment(id)),
            &PriorityChange { priority },
        )
        .await
    }

    /// Set or clear the due date.
    #[instrument(skip(self))]
    pub async fn change_due_date(&self, id: &str, due_date: Option<NaiveDateTime>) -> Outcome<Task> {
        self.put(
            &format!("/tasks/{}/due-date", segment(id)),
            &DueDateChange { due_date },
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete_task(&self, id: &str) -> Outcome<Ack> {
        self.delete(&format!("/tasks/{}", segment(id))).await
    }
}
