//! # Completion tracker for start-phase tasks.
//!
//! Counted barrier: one slot per spawned start task, released when the task
//! exits for any reason. The supervisor waits for the count to reach zero
//! before it reports completion.
//!
//! ```text
//! run():  enter(i, name) ──► guard ──► tokio::spawn(start task owning guard)
//!                                             │
//!                          Ok / Err / panic / abort ──► Drop(guard) ──► count -= 1
//!
//! shutdown: wait_idle() ──► watch::Receiver::wait_for(count == 0)
//! ```
//!
//! ## Rules
//! - Slots are taken **before** the task is spawned, so the drain never sees a
//!   premature zero.
//! - Release happens in `Drop`, so a panicking or aborted task still releases.
//! - `snapshot()` lists in-flight components in registration order.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

/// Tracks in-flight start tasks by registration index.
pub(crate) struct CompletionTracker {
    count: watch::Sender<usize>,
    names: Mutex<BTreeMap<usize, Arc<str>>>,
}

impl CompletionTracker {
    /// Creates an empty tracker.
    pub(crate) fn new() -> Arc<Self> {
        let (count, _rx) = watch::channel(0);
        Arc::new(Self {
            count,
            names: Mutex::new(BTreeMap::new()),
        })
    }

    /// Marks the start task for component `index` as in flight.
    pub(crate) fn enter(self: &Arc<Self>, index: usize, name: Arc<str>) -> CompletionGuard {
        self.names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(index, name);
        self.count.send_modify(|n| *n += 1);
        CompletionGuard {
            tracker: Arc::clone(self),
            index,
        }
    }

    /// Number of start tasks that have not finished yet.
    pub(crate) fn in_flight(&self) -> usize {
        *self.count.borrow()
    }

    /// Names of components whose start task is still running, in registration order.
    pub(crate) fn snapshot(&self) -> Vec<String> {
        self.names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|n| n.to_string())
            .collect()
    }

    /// Completes once no start task is in flight.
    pub(crate) async fn wait_idle(&self) {
        let mut rx = self.count.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    fn leave(&self, index: usize) {
        self.names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&index);
        self.count.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// Releases one tracker slot on drop.
pub(crate) struct CompletionGuard {
    tracker: Arc<CompletionTracker>,
    index: usize,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.tracker.leave(self.index);
    }
}
