//! # compvisor
//!
//! **Compvisor** runs a fixed set of long-lived components (database pools,
//! caches, listeners) as one application: it starts them concurrently, shuts
//! everything down as soon as one fails to start or a termination signal
//! arrives, and then stops them one by one in reverse registration order within
//! a single shutdown budget.
//!
//! ## Architecture
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Component   │   │  Component   │   │  Component   │
//!     │   (db, #0)   │   │ (cache, #1)  │   │  (http, #2)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor                                                       │
//! │  - Context (shared cancellation + first-writer-wins cause)        │
//! │  - CompletionTracker (counted barrier over start tasks)           │
//! │  - Bus (broadcast lifecycle events)                               │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!   start(ctx) #0      start(ctx) #1      start(ctx) #2        │ signal watcher
//!        │                  │                  │               │ (SIGINT/SIGTERM)
//!        └── Err/panic ─────┴──► ctx.cancel_with(StartFailed) ◄┘
//!                                        │
//!                                        ▼
//!                    stop #2 ──► stop #1 ──► stop #0   (one StopContext deadline)
//!                                        │
//!                                        ▼
//!                         wait for start tasks ──► Result
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                           |
//! |-------------------|----------------------------------------------------------|----------------------------------------------|
//! | **Components**    | Implement start/stop for a resource, or wrap closures.   | [`Component`], [`ComponentFn`]               |
//! | **Supervision**   | Concurrent start, fail-fast, reverse bounded stop.       | [`Supervisor`], [`SupervisorBuilder`]        |
//! | **Contexts**      | Shared cancellation and per-stop deadline.               | [`Context`], [`StopContext`]                 |
//! | **Errors**        | Typed run, component and configuration errors.           | [`RuntimeError`], [`ComponentError`]         |
//! | **Events**        | Hook into lifecycle events (metrics, audit, tests).      | [`Subscribe`], [`Event`], [`EventKind`]      |
//! | **Built-ins**     | HTTP health listener and periodic TCP probe.             | [`TcpServer`], [`Probe`]                     |
//! | **Configuration** | Runtime knobs and the binary's TOML settings.            | [`SupervisorConfig`], [`settings::Settings`] |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use compvisor::{ComponentError, ComponentFn, Context, StopContext, Supervisor, SupervisorConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = SupervisorConfig {
//!         shutdown_timeout: Duration::from_secs(5),
//!         handle_signals: false,
//!         ..SupervisorConfig::default()
//!     };
//!     let mut sup = Supervisor::new("demo", cfg)?;
//!
//!     for name in ["db", "cache"] {
//!         sup.register(ComponentFn::arc(
//!             name,
//!             |_ctx: Context| async { Ok::<_, ComponentError>(()) },
//!             |_ctx: StopContext| async { Ok::<_, ComponentError>(()) },
//!         ));
//!     }
//!
//!     sup.context().request_shutdown();
//!     sup.run().await?;
//!     Ok(())
//! }
//! ```

mod component;
mod core;
mod error;
mod events;
mod subscribers;

pub mod builtin;
pub mod logging;
pub mod settings;

// ---- Public re-exports ----

pub use builtin::{Probe, TcpServer};
pub use component::{Component, ComponentFn, ComponentRef, StopContext};
pub use core::{
    Context, DEFAULT_SHUTDOWN_TIMEOUT, ShutdownCause, Supervisor, SupervisorBuilder,
    SupervisorConfig,
};
pub use error::{ComponentError, ConfigError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{Subscribe, SubscriberSet};
