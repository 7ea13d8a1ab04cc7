//! Session-scoped GoBiz client.
//!
//! Logs in to GoBiz on behalf of users, keeps each user's tokens in memory,
//! paces outbound calls per session and refreshes rejected access tokens
//! transparently. Journal search and summaries are built on top.
//!
//! HTTP routing, request validation and response envelopes belong to the
//! caller; start from [`GoBizService`].

pub mod api;
pub mod auth;
pub mod config;
pub mod journals;
pub mod models;
pub mod service;

pub use api::{ApiError, Result};
pub use config::Config;
pub use service::GoBizService;
