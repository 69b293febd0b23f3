//! Backend readiness polling.
//!
//! [`HealthPoller`] probes `GET /api/health` on a fixed interval until one probe
//! succeeds, then stops. Each probe runs as its own task, so a slow probe does not
//! delay the next one. [`Readiness`] only ever moves from not-ready to ready; a late
//! failing probe cannot undo it. Cancel the poller's token on teardown.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::client::BackendClient;

/// Poll interval used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Monotonic "backend is ready" flag. Clones share state.
#[derive(Clone, Debug)]
pub struct Readiness {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new()
    }
}

impl Readiness {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Marks ready. Returns `true` only for the call that made the transition.
    pub fn mark_ready(&self) -> bool {
        self.tx.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        })
    }

    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Resolves once ready.
    pub async fn wait_ready(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

/// Repeating health check with an explicit cancellation token.
#[derive(Debug)]
pub struct HealthPoller {
    client: BackendClient,
    interval: Duration,
    readiness: Readiness,
    cancel: CancellationToken,
}

impl HealthPoller {
    pub fn new(client: BackendClient, interval: Duration, readiness: Readiness) -> Self {
        Self {
            client,
            interval,
            readiness,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses `token` instead of a fresh one, e.g. a child of an owner's shutdown token.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops the poller and discards any probe still in flight.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Polls until ready or cancelled.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ready_rx = self.readiness.subscribe();
        let mut probes = 0u64;
        loop {
            if self.readiness.is_ready() {
                break;
            }
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("health poll cancelled after {} probes", probes);
                    break;
                }
                _ = ready_rx.wait_for(|ready| *ready) => {
                    break;
                }
                _ = ticker.tick() => {
                    probes += 1;
                    tokio::spawn(probe(
                        self.client.clone(),
                        self.readiness.clone(),
                        self.cancel.clone(),
                        probes,
                    ));
                }
            }
        }
    }
}

async fn probe(client: BackendClient, readiness: Readiness, cancel: CancellationToken, n: u64) {
    match client.health().await {
        Ok(()) => {
            if cancel.is_cancelled() {
                debug!("health probe={} succeeded after cancel; ignored", n);
                return;
            }
            if readiness.mark_ready() {
                info!("backend ready probe={}", n);
            }
        }
        Err(e) => debug!("backend still initializing probe={} error={}", n, e),
    }
}
