//! Runtime core: orchestration and lifecycle.
//!
//! Public API from this module: [`Supervisor`] (with its builder and config) and
//! the shared [`Context`] / [`ShutdownCause`] handed to components.
//!
//! Internal modules:
//! - [`runner`]: executes one component's `start` or `stop` with panic isolation and event publishing;
//! - [`supervisor`]: registration, concurrent start, reverse sequential stop, drain;
//! - [`tracker`]: counted barrier over in-flight start tasks;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod config;
mod context;
mod runner;
mod shutdown;
mod supervisor;
mod tracker;

pub use builder::SupervisorBuilder;
pub use config::{DEFAULT_SHUTDOWN_TIMEOUT, SupervisorConfig};
pub use context::{Context, ShutdownCause};
pub use supervisor::Supervisor;
