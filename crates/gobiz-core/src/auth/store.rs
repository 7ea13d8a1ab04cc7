use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;

use super::session::{Session, DEFAULT_MIN_REQUEST_INTERVAL};

/// Shared handle to one session. Holding its lock serializes every
/// operation made for that user.
pub type SessionHandle = Arc<Mutex<Session>>;

/// In-memory sessions keyed by caller-supplied user id.
/// Clone is cheap and every clone sees the same sessions.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
    min_request_interval: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_REQUEST_INTERVAL)
    }
}

impl SessionStore {
    pub fn new(min_request_interval: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            min_request_interval,
        }
    }

    /// Create a fresh session, replacing any existing one for `user_id`.
    ///
    /// Waits for operations still running on the replaced session, and
    /// returns the new session already locked so nothing else for this user
    /// can run before the caller is done with it.
    pub async fn create(&self, user_id: &str) -> OwnedMutexGuard<Session> {
        loop {
            let previous = self.get(user_id).await;
            let _in_flight = match &previous {
                Some(handle) => Some(Arc::clone(handle).lock_owned().await),
                None => None,
            };

            let mut sessions = self.sessions.write().await;
            let unchanged = match (sessions.get(user_id), &previous) {
                (Some(current), Some(previous)) => Arc::ptr_eq(current, previous),
                (None, None) => true,
                _ => false,
            };
            if !unchanged {
                // another create or delete won the race; wait on its session instead
                continue;
            }

            let handle = Arc::new(Mutex::new(Session::new(user_id, self.min_request_interval)));
            let guard = Arc::clone(&handle).lock_owned().await;
            sessions.insert(user_id.to_string(), handle);
            debug!(user_id, replaced = previous.is_some(), "Session created");
            return guard;
        }
    }

    pub async fn get(&self, user_id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(user_id).cloned()
    }

    /// Copy of the current session state, waiting for any in-flight operation.
    pub async fn snapshot(&self, user_id: &str) -> Option<Session> {
        let handle = self.get(user_id).await?;
        let session = handle.lock().await;
        Some(session.clone())
    }

    /// Remove the session for `user_id`. Absent ids are ignored.
    pub async fn delete(&self, user_id: &str) {
        let removed = self.sessions.write().await.remove(user_id);
        debug!(user_id, removed = removed.is_some(), "Session deleted");
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
