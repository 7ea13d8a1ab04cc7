use std::fmt;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

use crate::models::TokenSet;

/// Default spacing between two calls made under the same session.
pub const DEFAULT_MIN_REQUEST_INTERVAL: StdDuration = StdDuration::from_millis(2000);

/// Access and refresh tokens as issued together by GoID.
///
/// Holding both in one value keeps a session from ever carrying only one of them.
#[derive(Clone)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime in seconds declared by the token endpoint.
    pub expires_in: Option<i64>,
    pub issued_at: DateTime<Utc>,
}

impl Credentials {
    pub fn new(tokens: &TokenSet) -> Self {
        Self {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            expires_in: tokens.expires_in,
            issued_at: Utc::now(),
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let lifetime = Duration::try_seconds(self.expires_in?)?;
        self.issued_at.checked_add_signed(lifetime)
    }

    /// Expired per the declared lifetime. Without a lifetime the token is
    /// treated as live until GoBiz says otherwise.
    pub fn is_expired(&self) -> bool {
        self.expires_at().map(|at| Utc::now() > at).unwrap_or(false)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Per-user credential and pacing state.
#[derive(Debug, Clone)]
pub struct Session {
    user_id: String,
    device_unique_id: String,
    pub(crate) credentials: Option<Credentials>,
    pub(crate) last_request: Option<Instant>,
    min_request_interval: StdDuration,
    pub merchant_id: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, min_request_interval: StdDuration) -> Self {
        Self {
            user_id: user_id.into(),
            device_unique_id: Uuid::new_v4().to_string(),
            credentials: None,
            last_request: None,
            min_request_interval,
            merchant_id: None,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn device_unique_id(&self) -> &str {
        &self.device_unique_id
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.access_token.as_str())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.refresh_token.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn last_request(&self) -> Option<Instant> {
        self.last_request
    }

    pub fn min_request_interval(&self) -> StdDuration {
        self.min_request_interval
    }

    /// Replace both tokens at once.
    pub(crate) fn set_credentials(&mut self, tokens: &TokenSet) {
        self.credentials = Some(Credentials::new(tokens));
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            user_id: self.user_id.clone(),
            authenticated: self.is_authenticated(),
            merchant_id: self.merchant_id.clone(),
            expires_at: self.credentials.as_ref().and_then(|c| c.expires_at()),
            is_expired: self
                .credentials
                .as_ref()
                .map(|c| c.is_expired())
                .unwrap_or(false),
        }
    }
}

/// Token-free view of a session for callers that only need to display it.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub user_id: String,
    pub authenticated: bool,
    pub merchant_id: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_expired: bool,
}
