//! Built-in components.
//!
//! - [`TcpServer`]: minimal HTTP health listener, the request-handling surface
//!   registered last so it is stopped first.
//! - [`Probe`]: periodic reachability check for a backing service (database,
//!   cache) whose background loop ends with the shared context.

mod probe;
mod tcp_server;

pub use probe::Probe;
pub use tcp_server::TcpServer;
