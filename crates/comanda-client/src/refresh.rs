//! # Refresh Coordinator
//!
//! Collapses concurrent token refreshes into one.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Three requests hit 401 at once                        │
//! │                                                                         │
//! │  req A ──► refresh() ── in_flight = false ──► LEADER: runs refresh ──┐  │
//! │  req B ──► refresh() ── in_flight = true  ──► waiters += tx_B        │  │
//! │  req C ──► refresh() ── in_flight = true  ──► waiters += tx_C        │  │
//! │                                                                      │  │
//! │                               refresh completes ◄────────────────────┘  │
//! │                                      │                                  │
//! │                      in_flight = false, drain waiters                   │
//! │                                      │                                  │
//! │              tx_B.send(outcome)  tx_C.send(outcome)  A returns outcome  │
//! │                                                                         │
//! │  Everyone gets the same token, or the same error.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! If the leader's future is dropped mid-refresh, a guard wakes every waiter
//! with [`RefreshError::Abandoned`] and clears the flag so the next caller
//! can lead.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Why a refresh produced no token. Cloned to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// The auth server refused the refresh token.
    #[error("refresh token rejected: {0}")]
    Rejected(String),

    /// The refresh could not be carried out (network, storage).
    #[error("refresh failed: {0}")]
    Failed(String),

    /// The leading caller went away before finishing.
    #[error("refresh abandoned before completion")]
    Abandoned,
}

/// New access token or the shared failure.
pub type RefreshOutcome = Result<String, RefreshError>;

#[derive(Default)]
struct State {
    in_flight: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

/// One per session. Dropped with the session at logout.
#[derive(Default)]
pub struct RefreshCoordinator {
    state: Mutex<State>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `refresh` unless a refresh is already running, in which case
    /// waits for that one's outcome.
    pub async fn refresh<F, Fut>(&self, refresh: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshOutcome>,
    {
        let waiter = {
            let mut state = self.lock();
            if state.in_flight {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                Some(rx)
            } else {
                state.in_flight = true;
                None
            }
        };

        if let Some(rx) = waiter {
            debug!("Token refresh already running, waiting for it");
            // a dropped sender means the coordinator itself went away
            return rx.await.unwrap_or(Err(RefreshError::Abandoned));
        }

        let guard = LeaderGuard {
            coordinator: self,
            finished: false,
        };
        let outcome = refresh().await;
        guard.finish(outcome.clone());
        outcome
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().in_flight
    }

    /// Callers currently parked behind the leader.
    pub fn waiting(&self) -> usize {
        self.lock().waiters.len()
    }

    fn complete(&self, outcome: RefreshOutcome) {
        let waiters = {
            let mut state = self.lock();
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };

        debug!(
            waiters = waiters.len(),
            success = outcome.is_ok(),
            "Token refresh finished"
        );
        for waiter in waiters {
            // the waiter may have been cancelled
            let _ = waiter.send(outcome.clone());
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct LeaderGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    finished: bool,
}

impl LeaderGuard<'_> {
    fn finish(mut self, outcome: RefreshOutcome) {
        self.finished = true;
        self.coordinator.complete(outcome);
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!("Token refresh leader dropped, failing waiters");
            self.coordinator.complete(Err(RefreshError::Abandoned));
        }
    }
}
