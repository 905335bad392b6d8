//! # Shared execution context and shutdown cause.
//!
//! One [`Context`] is created per supervisor and handed (cloned) to every
//! component's `start`. It is cancelled at most once; the first cancellation
//! records a [`ShutdownCause`] and later ones are no-ops.
//!
//! ```text
//!   signal watcher ──┐
//!   start failure  ──┼──► cancel_with(cause) ──► OnceLock::set ──► token.cancel()
//!   request/abort  ──┘         (first writer wins)        │
//!                                                         ▼
//!                                        run() wakes, reads cause(), stops components
//! ```
//!
//! ## Rules
//! - The cause is recorded **before** the token is cancelled, so anyone woken by
//!   cancellation observes a cause.
//! - Components get [`Context::child_token`]s; cancelling a child never cancels the
//!   shared context.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;

use crate::error::ComponentError;

/// Why the supervisor stopped.
#[derive(Clone, Debug)]
pub enum ShutdownCause {
    /// SIGINT / SIGTERM (or Ctrl-C) was received.
    Signal,
    /// Shutdown was requested programmatically through [`Context::request_shutdown`].
    Requested,
    /// A component's `start` failed.
    StartFailed {
        /// Name of the failing component.
        component: Arc<str>,
        /// The error it reported.
        error: Arc<ComponentError>,
    },
    /// The context was aborted programmatically through [`Context::abort`].
    Aborted {
        /// Caller-supplied reason.
        reason: Arc<str>,
    },
}

impl ShutdownCause {
    /// Benign causes end the run successfully.
    pub fn is_benign(&self) -> bool {
        matches!(self, ShutdownCause::Signal | ShutdownCause::Requested)
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ShutdownCause::Signal => "signal",
            ShutdownCause::Requested => "requested",
            ShutdownCause::StartFailed { .. } => "start_failed",
            ShutdownCause::Aborted { .. } => "aborted",
        }
    }
}

impl fmt::Display for ShutdownCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownCause::Signal => f.write_str("termination signal received"),
            ShutdownCause::Requested => f.write_str("shutdown requested"),
            ShutdownCause::StartFailed { component, error } => {
                write!(f, "component {component:?} failed to start: {error}")
            }
            ShutdownCause::Aborted { reason } => write!(f, "aborted: {reason}"),
        }
    }
}

struct Inner {
    token: CancellationToken,
    cause: OnceLock<ShutdownCause>,
}

/// Cancellable context shared by all components for the duration of a run.
///
/// Cheap to clone; all clones observe the same cancellation and cause.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    /// Creates a fresh, not-yet-cancelled context.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                token: CancellationToken::new(),
                cause: OnceLock::new(),
            }),
        }
    }

    /// Completes once the context is cancelled.
    pub async fn cancelled(&self) {
        self.inner.token.cancelled().await
    }

    /// Returns `true` once the context has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Returns a token cancelled together with this context.
    ///
    /// Cancelling the child does not affect the context.
    pub fn child_token(&self) -> CancellationToken {
        self.inner.token.child_token()
    }

    /// Returns the recorded cause, if the context has been cancelled.
    pub fn cause(&self) -> Option<ShutdownCause> {
        self.inner.cause.get().cloned()
    }

    /// Requests a normal shutdown. `run` returns `Ok(())` if this is the first cause.
    pub fn request_shutdown(&self) -> bool {
        self.cancel_with(ShutdownCause::Requested)
    }

    /// Aborts the run. `run` returns [`RuntimeError::Aborted`](crate::RuntimeError::Aborted)
    /// if this is the first cause.
    pub fn abort(&self, reason: impl Into<Arc<str>>) -> bool {
        self.cancel_with(ShutdownCause::Aborted {
            reason: reason.into(),
        })
    }

    /// Records `cause` if none is recorded yet, then cancels.
    ///
    /// Returns `true` when this call's cause was recorded.
    pub(crate) fn cancel_with(&self, cause: ShutdownCause) -> bool {
        let won = self.inner.cause.set(cause).is_ok();
        self.inner.token.cancel();
        won
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("cancelled", &self.is_cancelled())
            .field("cause", &self.inner.cause.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_cause_wins() {
        let ctx = Context::new();
        assert!(ctx.cause().is_none());
        assert!(!ctx.is_cancelled());

        assert!(ctx.abort("first"));
        assert!(!ctx.request_shutdown());
        assert!(!ctx.abort("second"));

        assert!(ctx.is_cancelled());
        match ctx.cause() {
            Some(ShutdownCause::Aborted { reason }) => assert_eq!(&*reason, "first"),
            other => panic!("unexpected cause: {other:?}"),
        }
    }

    #[test]
    fn benign_causes() {
        assert!(ShutdownCause::Signal.is_benign());
        assert!(ShutdownCause::Requested.is_benign());
        assert!(!ShutdownCause::Aborted { reason: "x".into() }.is_benign());
        assert!(
            !ShutdownCause::StartFailed {
                component: "db".into(),
                error: Arc::new(ComponentError::fail("down")),
            }
            .is_benign()
        );
    }

    #[test]
    fn child_cancellation_does_not_propagate_up() {
        let ctx = Context::new();
        let child = ctx.child_token();
        child.cancel();
        assert!(!ctx.is_cancelled());

        let other = ctx.child_token();
        ctx.request_shutdown();
        assert!(other.is_cancelled());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_record_exactly_one_cause() {
        let ctx = Context::new();
        let mut handles = Vec::new();
        for i in 0..32 {
            let ctx = ctx.clone();
            handles.push(tokio::spawn(async move { ctx.abort(format!("writer-{i}")) }));
        }

        let mut winners = 0;
        for h in handles {
            if h.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert!(matches!(ctx.cause(), Some(ShutdownCause::Aborted { .. })));
        ctx.cancelled().await;
    }
}
