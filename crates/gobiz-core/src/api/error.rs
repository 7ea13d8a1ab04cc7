use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No session for user {0}")]
    SessionMissing(String),

    #[error("User {0} is not authenticated")]
    NotAuthenticated(String),

    #[error("GoBiz rejected the request with status {status}: {body}")]
    DownstreamRejected { status: StatusCode, body: String },

    #[error("Network error: {0}")]
    DownstreamUnreachable(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Credential cannot be sent as a header value")]
    InvalidCredential,

    #[error("No local day window for {0}")]
    UnresolvableDate(chrono::NaiveDate),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        ApiError::DownstreamRejected {
            status,
            body: Self::truncate_body(body),
        }
    }

    /// Status of a downstream rejection, if this is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::DownstreamRejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is a downstream rejection whose status is in `statuses`.
    pub fn is_auth_failure(&self, statuses: &[u16]) -> bool {
        self.status()
            .map(|s| statuses.contains(&s.as_u16()))
            .unwrap_or(false)
    }
}
