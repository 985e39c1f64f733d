//! DigiWorkHub API client and types.
//!
//! This module provides the interface for communicating with the DigiWorkHub
//! REST API: transport, response classification, the auth-token guard and
//! the endpoint groups.

pub mod auth;
pub mod classify;
mod client;
pub mod dates;
mod endpoints;
pub mod error;
pub mod guard;
#[cfg(test)]
pub(crate) mod testing;
pub mod transport;
pub mod types;

pub use client::{RequestOptions, WorkHubClient};
pub use endpoints::{Mailbox, TaskFilter};
pub use error::{ApiError, ErrorCategory, Outcome};
pub use guard::{Clock, FixedClock, GuardState, SystemClock};
pub use transport::{Body, FilePart, HttpRequest, Method, RawResponse, ReqwestTransport, Transport, TransportError};
