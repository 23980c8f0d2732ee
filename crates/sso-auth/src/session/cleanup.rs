//! Periodic purge of session records whose refresh token expired.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::store::SessionStore;

/// Sweeps expired records out of the session store on a fixed interval.
#[derive(Clone)]
pub struct SessionCleanup {
    /// Session store to sweep.
    session_store: Arc<SessionStore>,
    /// Time between sweeps.
    interval: Duration,
}

impl std::fmt::Debug for SessionCleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCleanup")
            .field("interval", &self.interval)
            .finish()
    }
}

impl SessionCleanup {
    /// Creates a new session cleanup handler.
    pub fn new(session_store: Arc<SessionStore>, interval: Duration) -> Self {
        Self {
            session_store,
            interval,
        }
    }

    /// Runs a single sweep. Returns the number of records dropped.
    pub async fn run_cleanup(&self) -> usize {
        let purged = self.session_store.purge_expired(Utc::now()).await;
        if purged > 0 {
            info!(purged, "Session cleanup completed");
        } else {
            debug!("Session cleanup found nothing to purge");
        }
        purged
    }

    /// Spawns the sweep loop. It stops once `shutdown` flips to `true` or its
    /// sender is dropped.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.run_cleanup().await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            debug!("Session cleanup stopping");
                            break;
                        }
                    }
                }
            }
        })
    }
}
