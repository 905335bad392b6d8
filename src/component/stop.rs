//! # Deadline-bound stop context.
//!
//! One [`StopContext`] is created when shutdown begins and shared by every
//! `stop` call, so the deadline bounds the whole stop phase rather than each
//! component separately.

use std::future::Future;
use std::time::Duration;

use tokio::time::{self, Instant};

use crate::error::ComponentError;

/// Context handed to [`Component::stop`](crate::Component::stop).
#[derive(Clone, Debug)]
pub struct StopContext {
    deadline: Instant,
    budget: Duration,
}

impl StopContext {
    /// Creates a context whose deadline is `now + budget`.
    pub fn new(budget: Duration) -> Self {
        Self {
            deadline: Instant::now() + budget,
            budget,
        }
    }

    /// Instant after which stop work should be abandoned.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Total budget the deadline was derived from.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Time left before the deadline (zero once expired).
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Returns `true` once the deadline has passed.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Completes at the deadline.
    pub async fn expired(&self) {
        time::sleep_until(self.deadline).await
    }

    /// Runs `fut` until it completes or the deadline passes.
    ///
    /// On expiry `fut` is dropped and [`ComponentError::DeadlineExceeded`] is returned.
    pub async fn bound<F, T>(&self, fut: F) -> Result<T, ComponentError>
    where
        F: Future<Output = T>,
    {
        time::timeout_at(self.deadline, fut)
            .await
            .map_err(|_elapsed| ComponentError::DeadlineExceeded {
                budget: self.budget,
            })
    }
}
