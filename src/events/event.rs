//! # Runtime events emitted by the supervisor.
//!
//! The [`EventKind`] enum classifies events across three phases:
//! - **Registration**: a component joined the supervisor
//! - **Startup**: start tasks launching, succeeding or failing
//! - **Shutdown**: cancellation, per-component stop outcome, drain, completion
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use compvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ComponentStopFailed)
//!     .with_component("cache")
//!     .with_index(1)
//!     .with_reason("connection reset")
//!     .with_elapsed(Duration::from_millis(12));
//!
//! assert_eq!(ev.kind, EventKind::ComponentStopFailed);
//! assert_eq!(ev.component.as_deref(), Some("cache"));
//! assert_eq!(ev.elapsed_ms, Some(12));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Registration ===
    /// Component appended to the supervisor.
    ///
    /// Sets: `component`, `index`
    ComponentRegistered,

    // === Startup ===
    /// Start task launched; `start` is about to be called.
    ///
    /// Sets: `component`, `index`
    ComponentStarting,

    /// `start` returned `Ok(())`.
    ///
    /// Sets: `component`, `index`, `elapsed_ms`
    ComponentStarted,

    /// `start` returned an error or panicked; shutdown is triggered.
    ///
    /// Sets: `component`, `index`, `reason`, `elapsed_ms`
    ComponentStartFailed,

    // === Shutdown ===
    /// The shared context was cancelled.
    ///
    /// Sets: `reason` (the cause)
    ShutdownRequested,

    /// `stop` is about to be called.
    ///
    /// Sets: `component`, `index`
    ComponentStopping,

    /// `stop` returned `Ok(())`.
    ///
    /// Sets: `component`, `index`, `elapsed_ms`
    ComponentStopped,

    /// `stop` returned an error or panicked.
    ///
    /// Sets: `component`, `index`, `reason`, `elapsed_ms`
    ComponentStopFailed,

    /// Every start task has finished.
    ///
    /// Sets: `elapsed_ms` (time spent waiting)
    DrainCompleted,

    /// Drain grace elapsed with start tasks still running; they were aborted.
    ///
    /// Sets: `reason` (stuck components), `elapsed_ms`
    DrainExceeded,

    /// Last event of a run.
    ///
    /// Sets: `reason` (cause, plus failed stops if any), `elapsed_ms` (shutdown duration)
    ShutdownCompleted,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Component name, if applicable.
    pub component: Option<Arc<str>>,
    /// Registration index of the component (0-based).
    pub index: Option<usize>,
    /// Human-readable reason (errors, cause, stuck list).
    pub reason: Option<Arc<str>>,
    /// Duration of the step that just finished, in milliseconds.
    pub elapsed_ms: Option<u64>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            component: None,
            index: None,
            reason: None,
            elapsed_ms: None,
        }
    }

    /// Attaches a component name.
    #[inline]
    pub fn with_component(mut self, name: impl Into<Arc<str>>) -> Self {
        self.component = Some(name.into());
        self
    }

    /// Attaches a registration index.
    #[inline]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an elapsed duration (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(d.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }
}
