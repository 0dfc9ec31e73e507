//! # Draft State
//!
//! The order being built at the point of sale.
//!
//! ## Thread Safety
//! The draft is wrapped in `Arc<Mutex<T>>` because:
//! 1. Several commands read and modify it
//! 2. Only one command should modify it at a time
//! 3. Commands can run concurrently
//!
//! The lock is held only for synchronous mutations, never across an await.
//! Submitting does await (the RPC), so it works from a snapshot and is
//! fenced by a [`SubmissionGuard`]: one submission at a time, and only the
//! snapshot's lines leave the draft once the backend has them.
//!
//! ## Draft Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Draft State Operations                               │
//! │                                                                         │
//! │  Operator Action          Command                 Draft Change          │
//! │  ───────────────          ───────                 ────────────          │
//! │                                                                         │
//! │  Tap Product ────────────► add_product() ───────► new line, qty 1       │
//! │                                                                         │
//! │  + / − ──────────────────► increment() ─────────► qty ± 1 (min 1)       │
//! │                            decrement()                                  │
//! │                                                                         │
//! │  Pick Table ─────────────► select_table() ──────► table_id              │
//! │                                                                         │
//! │  Send to Kitchen ────────► send_to_kitchen() ───► sent lines removed    │
//! │                                                   once saved            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use comanda_core::OrderDraft;

use crate::error::{AppError, AppResult, ErrorCode};

/// Draft state wrapper.
#[derive(Debug, Clone, Default)]
pub struct DraftState {
    inner: Arc<Mutex<OrderDraft>>,
    submitting: Arc<AtomicBool>,
}

/// Held while a draft is on its way to the backend. Dropping it, on any
/// path, lets the next submission through.
#[derive(Debug)]
pub struct SubmissionGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for SubmissionGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl DraftState {
    pub fn new() -> Self {
        DraftState::default()
    }

    /// Claims the draft for one submission.
    pub fn begin_submission(&self) -> AppResult<SubmissionGuard> {
        self.submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::new(ErrorCode::DraftError, "Order is already being sent"))?;
        Ok(SubmissionGuard {
            flag: Arc::clone(&self.submitting),
        })
    }

    /// Removes what the backend accepted, keeping lines added meanwhile.
    pub fn complete_submission(&self, _guard: &SubmissionGuard, submitted: &OrderDraft) {
        self.with_draft_mut(|d| d.remove_submitted(submitted));
    }

    /// Executes a read-only operation on the draft.
    pub fn with_draft<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&OrderDraft) -> R,
    {
        let draft = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&draft)
    }

    /// Executes a mutating operation on the draft.
    pub fn with_draft_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut OrderDraft) -> R,
    {
        let mut draft = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut draft)
    }

    /// Copy of the draft as it is now.
    pub fn snapshot(&self) -> OrderDraft {
        self.with_draft(Clone::clone)
    }

    pub fn reset(&self) {
        self.with_draft_mut(OrderDraft::reset);
    }
}
