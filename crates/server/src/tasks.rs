//! Background maintenance tasks.

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::services::SessionService;

/// Spawn the expired-session sweep.
///
/// Lazy deletion on lookup stays the authoritative expiry rule; the sweep
/// only keeps abandoned sessions from piling up.
pub fn spawn_session_purge(sessions: SessionService, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; skip it.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match sessions.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "expired admin sessions purged"),
                Err(e) => tracing::warn!(error = %e, "expired session purge failed"),
            }
        }
    })
}
