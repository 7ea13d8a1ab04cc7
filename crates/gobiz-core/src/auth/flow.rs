use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError, Result};
use crate::models::TokenSet;

use super::session::Session;
use super::store::SessionStore;

/// Login, refresh and logout against GoID.
///
/// A session moves from unauthenticated to authenticated through the
/// two-step handshake in [`AuthFlow::login`]; refresh keeps it authenticated
/// and logout removes it.
#[derive(Clone)]
pub struct AuthFlow {
    api: ApiClient,
    sessions: SessionStore,
    settle_delay: Duration,
}

impl AuthFlow {
    pub fn new(api: ApiClient, sessions: SessionStore, settle_delay: Duration) -> Self {
        Self {
            api,
            sessions,
            settle_delay,
        }
    }

    /// Run the login handshake for `user_id`, replacing any previous session.
    /// Concurrent logins for the same user run one after the other.
    ///
    /// If the login request is rejected the new session is left without
    /// credentials and the password exchange is never attempted.
    pub async fn login(&self, user_id: &str, email: &str, password: &str) -> Result<TokenSet> {
        let mut session = self.sessions.create(user_id).await;
        info!(user_id, "Starting GoBiz login");

        if let Err(e) = self.api.request_login(&mut session, email).await {
            warn!(user_id, error = %e, "Login request rejected");
            return Err(e);
        }
        debug!(user_id, settle_ms = self.settle_delay.as_millis() as u64, "Login requested, waiting before password exchange");
        sleep(self.settle_delay).await;

        let tokens = match self.api.password_token(&mut session, email, password).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(user_id, error = %e, "Password exchange failed");
                return Err(e);
            }
        };
        session.set_credentials(&tokens);
        info!(user_id, expires_in = ?tokens.expires_in, "Login successful");
        Ok(tokens)
    }

    /// Exchange the stored refresh token for a new token pair.
    pub async fn refresh(&self, user_id: &str) -> Result<TokenSet> {
        let handle = self
            .sessions
            .get(user_id)
            .await
            .ok_or_else(|| ApiError::SessionMissing(user_id.to_string()))?;
        let mut session = handle.lock().await;
        self.refresh_session(&mut session).await
    }

    /// Refresh a session the caller already holds locked.
    /// On failure the previous credentials stay in place.
    pub(crate) async fn refresh_session(&self, session: &mut Session) -> Result<TokenSet> {
        if session.refresh_token().is_none() {
            return Err(ApiError::NotAuthenticated(session.user_id().to_string()));
        }

        let tokens = match self.api.refresh_token(session).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(user_id = session.user_id(), error = %e, "Token refresh failed");
                return Err(e);
            }
        };
        // GoID may rotate the refresh token, so both are replaced
        session.set_credentials(&tokens);
        info!(user_id = session.user_id(), "Access token refreshed");
        Ok(tokens)
    }

    /// Drop the session for `user_id`. Succeeds whether or not one exists.
    pub async fn logout(&self, user_id: &str) {
        self.sessions.delete(user_id).await;
        info!(user_id, "Logged out");
    }

    /// Remember which merchant the user works with.
    pub async fn attach_merchant(&self, user_id: &str, merchant_id: &str) -> Result<()> {
        let handle = self
            .sessions
            .get(user_id)
            .await
            .ok_or_else(|| ApiError::SessionMissing(user_id.to_string()))?;
        handle.lock().await.merchant_id = Some(merchant_id.to_string());
        Ok(())
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}
