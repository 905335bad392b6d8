//! # Component capability contract.
//!
//! A component is anything with a stable [`name`](Component::name), a
//! [`start`](Component::start) that receives the shared [`Context`], and a
//! [`stop`](Component::stop) that receives a deadline-bound [`StopContext`].
//!
//! Two `start` styles are supported:
//! - **launch and return**: spawn background work, return `Ok(())` right away;
//! - **run until cancelled**: keep running and return once `ctx` is cancelled.
//!
//! Either way, background loops owned by the component should end when the
//! context is cancelled, so that `stop` only releases the remaining handles.

use std::sync::Arc;

use async_trait::async_trait;

use crate::component::StopContext;
use crate::core::Context;
use crate::error::ComponentError;

/// Shared handle to a component.
pub type ComponentRef = Arc<dyn Component>;

/// # Unit of runtime functionality with a start/stop lifecycle.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use compvisor::{Component, ComponentError, Context, StopContext};
///
/// struct Cache;
///
/// #[async_trait]
/// impl Component for Cache {
///     fn name(&self) -> &str { "cache" }
///
///     async fn start(&self, ctx: Context) -> Result<(), ComponentError> {
///         let token = ctx.child_token();
///         tokio::spawn(async move {
///             token.cancelled().await;
///             // wind down the background loop
///         });
///         Ok(())
///     }
///
///     async fn stop(&self, ctx: StopContext) -> Result<(), ComponentError> {
///         ctx.bound(async { /* close connections */ }).await
///     }
/// }
/// ```
#[async_trait]
pub trait Component: Send + Sync + 'static {
    /// Returns a stable, human-readable component name.
    fn name(&self) -> &str;

    /// Begins the component's work.
    ///
    /// An `Err` is fatal for the whole process: the supervisor cancels the shared
    /// context and stops every registered component.
    async fn start(&self, ctx: Context) -> Result<(), ComponentError>;

    /// Releases the component's resources.
    ///
    /// Called at most once per run. Implementations should honour
    /// [`StopContext::deadline`] and return
    /// [`ComponentError::DeadlineExceeded`] when they cannot.
    async fn stop(&self, ctx: StopContext) -> Result<(), ComponentError>;
}
