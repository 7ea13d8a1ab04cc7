use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::{AuthFlow, Session, SessionStore};

use super::client::ApiClient;
use super::error::{ApiError, Result};

/// Issues authenticated calls on behalf of a user.
///
/// When GoBiz rejects the access token, the session is refreshed and the
/// call is retried once. A second rejection is returned to the caller.
#[derive(Clone)]
pub struct RequestExecutor {
    api: ApiClient,
    auth: AuthFlow,
    sessions: SessionStore,
    auth_failure_statuses: Arc<[u16]>,
}

impl RequestExecutor {
    pub fn new(
        api: ApiClient,
        auth: AuthFlow,
        sessions: SessionStore,
        auth_failure_statuses: &[u16],
    ) -> Self {
        Self {
            api,
            auth,
            sessions,
            auth_failure_statuses: Arc::from(auth_failure_statuses),
        }
    }

    pub async fn call(
        &self,
        user_id: &str,
        endpoint: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Value> {
        let handle = self
            .sessions
            .get(user_id)
            .await
            .ok_or_else(|| ApiError::SessionMissing(user_id.to_string()))?;
        let mut session = handle.lock().await;
        if session.access_token().is_none() {
            return Err(ApiError::NotAuthenticated(user_id.to_string()));
        }
        self.call_session(&mut session, endpoint, method, body).await
    }

    async fn call_session(
        &self,
        session: &mut Session,
        endpoint: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Value> {
        let mut refreshed = false;
        loop {
            let result = self
                .api
                .authorized(session, method.clone(), endpoint, body)
                .await;
            match result {
                Err(e) if !refreshed && e.is_auth_failure(&self.auth_failure_statuses) => {
                    warn!(
                        user_id = session.user_id(),
                        endpoint,
                        status = ?e.status(),
                        "Access token rejected, refreshing before retry"
                    );
                    self.auth.refresh_session(session).await?;
                    refreshed = true;
                }
                Err(e) => {
                    debug!(user_id = session.user_id(), endpoint, error = %e, "Authenticated call failed");
                    return Err(e);
                }
                Ok(value) => return Ok(value),
            }
        }
    }
}
