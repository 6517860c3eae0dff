//! Shutdown watchdog
//!
//! Drives the process through `Running -> Draining -> Terminated`. Draining
//! races a graceful close of every connection against a bounded grace timer;
//! whichever finishes first wins, so a wedged remote session can never keep
//! the process alive past the ceiling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, OnceCell};
use tracing::{info, warn};

use crate::server::ConnectionRegistry;

/// Watchdog lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    Draining,
    Terminated,
}

pub struct ExitWatchdog {
    registry: Arc<ConnectionRegistry>,
    grace: Duration,
    state_tx: watch::Sender<ShutdownState>,
    drained: OnceCell<()>,
}

impl ExitWatchdog {
    pub fn new(registry: Arc<ConnectionRegistry>, grace: Duration) -> Self {
        let (state_tx, _) = watch::channel(ShutdownState::Running);
        Self {
            registry,
            grace,
            state_tx,
            drained: OnceCell::new(),
        }
    }

    pub fn state(&self) -> ShutdownState {
        *self.state_tx.borrow()
    }

    /// Watch lifecycle transitions; transports use this to stop accepting
    pub fn subscribe(&self) -> watch::Receiver<ShutdownState> {
        self.state_tx.subscribe()
    }

    /// Resolve once the watchdog reaches `Terminated`
    pub async fn wait_terminated(&self) {
        let mut rx = self.state_tx.subscribe();
        let _ = rx
            .wait_for(|state| *state == ShutdownState::Terminated)
            .await;
    }

    /// Begin (or join) the drain sequence and wait for the terminal state
    ///
    /// Concurrent and repeated calls coalesce onto a single drain pass.
    pub async fn drain(&self) {
        self.drained.get_or_init(|| self.run_drain()).await;
    }

    async fn run_drain(&self) {
        let _ = self.state_tx.send(ShutdownState::Draining);
        info!(grace_secs = self.grace.as_secs(), "Draining connections");

        tokio::select! {
            _ = self.registry.close_all() => {
                info!("All connections closed");
            }
            _ = tokio::time::sleep(self.grace) => {
                let undisposed = self.registry.ids().await;
                warn!(
                    connections = ?undisposed,
                    "Grace period expired with connections still open"
                );
            }
        }

        let _ = self.state_tx.send(ShutdownState::Terminated);
    }
}

impl std::fmt::Debug for ExitWatchdog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExitWatchdog")
            .field("state", &self.state())
            .field("grace", &self.grace)
            .finish_non_exhaustive()
    }
}
