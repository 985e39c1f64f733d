//! DigiWorkHub - client core for the DigiWorkHub task and messaging service.
//!
//! The library holds everything a front end needs: the typed API client with
//! its response classifier and auth-token guard, the encrypted session store,
//! the calendar builder, push handling and background task plumbing.

pub mod api;
pub mod calendar;
pub mod config;
pub mod error;
pub mod logging;
pub mod push;
pub mod session;
pub mod tasks;
