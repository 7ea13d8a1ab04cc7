use std::fmt;

use serde::{Deserialize, Serialize};

/// Body returned by `POST /goid/token` for both grant types.
#[derive(Clone, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Access/refresh token pair handed back to callers after login or refresh.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    /// Both tokens are required; a 2xx without them is not a usable login.
    pub fn into_token_set(self) -> Option<TokenSet> {
        match (self.access_token, self.refresh_token) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                Some(TokenSet {
                    access_token: access,
                    refresh_token: refresh,
                    expires_in: self.expires_in,
                })
            }
            _ => None,
        }
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}
