//! # Closure-backed component (`ComponentFn`)
//!
//! [`ComponentFn`] wraps two closures, `Fn(Context) -> Fut` for start and
//! `Fn(StopContext) -> Fut` for stop, producing a fresh future per call.
//! Shared state between the two goes through an explicit `Arc<...>` captured by both.
//!
//! ## Example
//! ```rust
//! use compvisor::{Component, ComponentError, ComponentFn, ComponentRef, Context, StopContext};
//!
//! let c: ComponentRef = ComponentFn::arc(
//!     "worker",
//!     |ctx: Context| async move {
//!         ctx.cancelled().await;
//!         Ok::<_, ComponentError>(())
//!     },
//!     |_ctx: StopContext| async { Ok::<_, ComponentError>(()) },
//! );
//!
//! assert_eq!(c.name(), "worker");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::component::{Component, StopContext};
use crate::core::Context;
use crate::error::ComponentError;

/// Closure-backed component implementation.
pub struct ComponentFn<S, P> {
    name: Cow<'static, str>,
    start: S,
    stop: P,
}

impl<S, P> ComponentFn<S, P> {
    /// Creates a new closure-backed component.
    ///
    /// Prefer [`ComponentFn::arc`] when you immediately need a [`ComponentRef`](crate::ComponentRef).
    pub fn new(name: impl Into<Cow<'static, str>>, start: S, stop: P) -> Self {
        Self {
            name: name.into(),
            start,
            stop,
        }
    }

    /// Creates the component and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, start: S, stop: P) -> Arc<Self> {
        Arc::new(Self::new(name, start, stop))
    }
}

impl<S, P> fmt::Debug for ComponentFn<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentFn")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<S, SFut, P, PFut> Component for ComponentFn<S, P>
where
    S: Fn(Context) -> SFut + Send + Sync + 'static,
    SFut: Future<Output = Result<(), ComponentError>> + Send + 'static,
    P: Fn(StopContext) -> PFut + Send + Sync + 'static,
    PFut: Future<Output = Result<(), ComponentError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, ctx: Context) -> Result<(), ComponentError> {
        (self.start)(ctx).await
    }

    async fn stop(&self, ctx: StopContext) -> Result<(), ComponentError> {
        (self.stop)(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn closures_are_invoked() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (c1, c2) = (Arc::clone(&calls), Arc::clone(&calls));
        let comp = ComponentFn::new(
            "counter",
            move |_ctx: Context| {
                let calls = Arc::clone(&c1);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ComponentError>(())
                }
            },
            move |_ctx: StopContext| {
                let calls = Arc::clone(&c2);
                async move {
                    calls.fetch_add(10, Ordering::SeqCst);
                    Err::<(), _>(ComponentError::fail("close failed"))
                }
            },
        );

        assert_eq!(comp.name(), "counter");
        comp.start(Context::new()).await.unwrap();
        let err = comp
            .stop(StopContext::new(Duration::from_secs(1)))
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "component_failed");
        assert_eq!(calls.load(Ordering::SeqCst), 11);
    }
}
