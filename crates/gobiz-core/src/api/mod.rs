//! REST API client module for GoBiz services.
//!
//! This module provides the `ApiClient` for the GoID login/token endpoints
//! and the journal API, and the `RequestExecutor` that wraps authenticated
//! calls with a single refresh-and-retry on token rejection.
//!
//! Calls are paced per session by the rate gate and carry the fixed
//! dashboard header set built in `headers`.

pub mod client;
pub mod error;
pub mod executor;
pub mod headers;
pub mod rate_gate;

pub use client::ApiClient;
pub use error::{ApiError, Result};
pub use executor::RequestExecutor;
pub use headers::build_headers;
