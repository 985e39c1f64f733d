//! Endpoint groups of the DigiWorkHub API.
//!
//! Each module adds methods to [`WorkHubClient`](super::WorkHubClient) for one
//! resource. Everything except signup, login and password reset requires a
//! session.

mod attachments;
mod auth;
mod checklists;
mod comments;
mod messages;
mod subtasks;
mod tasks;
mod users;

pub use messages::Mailbox;
pub use tasks::TaskFilter;
