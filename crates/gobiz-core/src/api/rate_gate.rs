use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::auth::Session;

/// Wait until the session may issue its next call, then record the call start.
///
/// Calls through one session start at least `min_request_interval` apart.
/// Only the given session is consulted, so other users never wait here.
pub async fn throttle(session: &mut Session) {
    let interval = session.min_request_interval();
    if let Some(last) = session.last_request {
        let elapsed = last.elapsed();
        if elapsed < interval {
            let wait = interval - elapsed;
            debug!(
                user_id = session.user_id(),
                wait_ms = wait.as_millis() as u64,
                "Pacing request"
            );
            sleep(wait).await;
        }
    }
    session.last_request = Some(Instant::now());
}
