//! Auth-token guard.
//!
//! Before an authorized call the guard inspects the stored session and
//! decides whether the call can go ahead with the current token or whether a
//! re-login has to happen first. The async refresh itself is driven by
//! [`WorkHubClient`](super::WorkHubClient), which owns the transport.

use std::fmt;

use chrono::{DateTime, Utc};

use super::auth::{is_token_expired, Credentials};
use crate::session::Session;

/// Guard state for a single protected call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// The token is usable.
    Authorized,
    /// A re-login is in progress; the protected call waits.
    Refreshing,
}

impl fmt::Display for GuardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardState::Authorized => f.write_str("authorized"),
            GuardState::Refreshing => f.write_str("refreshing"),
        }
    }
}

/// What the guard decided for a protected call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Send the call with this token.
    Proceed(String),
    /// Log in again with these credentials, then send the call.
    Refresh(Credentials),
    /// There is no session to authorize with.
    LoggedOut,
}

impl GuardDecision {
    /// The state the guard enters for this decision.
    pub fn state(&self) -> GuardState {
        match self {
            GuardDecision::Refresh(_) => GuardState::Refreshing,
            GuardDecision::Proceed(_) | GuardDecision::LoggedOut => GuardState::Authorized,
        }
    }
}

/// Decide how to authorize a call given the session and the current time.
pub fn inspect(session: &Session, now: DateTime<Utc>) -> GuardDecision {
    if !session.is_logged_in() {
        return GuardDecision::LoggedOut;
    }

    if is_token_expired(&session.token, now) {
        GuardDecision::Refresh(Credentials::new(&session.email, &session.password))
    } else {
        GuardDecision::Proceed(session.token.clone())
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
