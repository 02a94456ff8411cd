//! Authenticated-session lifecycle for one backend connection.
//!
//! The session manager owns the login token and keeps it warm with a
//! background refresh loop. The loop only probes the backend for liveness;
//! it never rewrites the token and never re-authenticates. After too many
//! consecutive probe failures it gives up and leaves the last-known-good
//! token in place.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};
use tokio_util::sync::CancellationToken;

use crate::storage::StorageError;

pub const MAX_PROBE_FAILURES: u32 = 30;
pub const PROBE_RETRY_INTERVAL: Duration = Duration::from_secs(1);
pub const PROBE_STEADY_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// A cheap, side-effect-free liveness check against the backend, issued with
/// the current token.
#[async_trait]
pub trait SessionProbe: Send + Sync + 'static {
    async fn probe(&self, token: &str) -> Result<(), StorageError>;
}

struct SessionState {
    token: String,
    last_verified_at: DateTime<Utc>,
}

pub struct SessionManager {
    // Guards only the field reads/writes; never held across I/O.
    state: RwLock<SessionState>,
}

impl SessionManager {
    pub fn new(token: String) -> Self {
        Self {
            state: RwLock::new(SessionState {
                token,
                last_verified_at: Utc::now(),
            }),
        }
    }

    /// Current token, cloned out from under the read lock.
    pub async fn token(&self) -> String {
        self.state.read().await.token.clone()
    }

    pub async fn last_verified_at(&self) -> DateTime<Utc> {
        self.state.read().await.last_verified_at
    }

    async fn mark_verified(&self) {
        self.state.write().await.last_verified_at = Utc::now();
    }

    /// Spawns the background refresh loop for this session. The task runs
    /// until the token is cancelled or the probe failure budget is spent.
    pub fn spawn_refresh(
        self: Arc<Self>,
        probe: Arc<dyn SessionProbe>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move { self.refresh_loop(probe.as_ref(), cancel).await })
    }

    async fn refresh_loop(&self, probe: &dyn SessionProbe, cancel: CancellationToken) {
        let mut consecutive_failures: u32 = 0;
        loop {
            let token = self.token().await;
            let delay = match probe.probe(&token).await {
                Ok(()) => {
                    consecutive_failures = 0;
                    self.mark_verified().await;
                    debug!("session probe ok");
                    PROBE_STEADY_INTERVAL
                }
                Err(err) => {
                    consecutive_failures += 1;
                    warn!(
                        "session probe failed ({consecutive_failures}/{MAX_PROBE_FAILURES}): {err}"
                    );
                    if consecutive_failures >= MAX_PROBE_FAILURES {
                        warn!(
                            "abandoning session refresh after {MAX_PROBE_FAILURES} consecutive probe failures; keeping last-known-good token"
                        );
                        return;
                    }
                    PROBE_RETRY_INTERVAL
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = sleep(delay) => {}
            }
        }
    }
}
