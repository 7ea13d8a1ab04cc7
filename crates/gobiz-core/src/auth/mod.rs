//! Authentication module for managing per-user GoBiz sessions.
//!
//! This module provides:
//! - `Session`: credentials, device id and pacing state for one user
//! - `SessionStore`: in-memory sessions keyed by user id
//! - `AuthFlow`: the GoID login handshake, token refresh and logout
//!
//! Sessions live only in memory and are lost when the process exits.

pub mod flow;
pub mod session;
pub mod store;

pub use flow::AuthFlow;
pub use session::{Credentials, Session, SessionStatus};
pub use store::{SessionHandle, SessionStore};
