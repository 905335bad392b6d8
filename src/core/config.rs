//! # Supervisor runtime configuration.
//!
//! Provides [`SupervisorConfig`]: centralized settings for one supervisor run.
//!
//! ## Sentinel values
//! - `drain_grace = None` → wait for start tasks without a bound
//! - `bus_capacity = 0` → clamped to 1 by the bus
//!
//! `shutdown_timeout` has no sentinel: zero is rejected by [`SupervisorConfig::validate`].

use std::time::Duration;

use crate::error::ConfigError;

/// Default shutdown budget for the whole stop phase.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(20);

/// Global configuration for a supervisor.
///
/// ## Field semantics
/// - `shutdown_timeout`: wall-clock budget for the *entire* sequential stop phase,
///   measured from the moment shutdown begins
/// - `drain_grace`: optional bound on waiting for start tasks after the stop phase
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `handle_signals`: listen for SIGINT/SIGTERM and shut down on receipt
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Maximum duration of the stop phase.
    ///
    /// Every component's `stop` receives a [`StopContext`](crate::StopContext) whose
    /// deadline is `shutdown start + shutdown_timeout`. Components are expected to
    /// honour it and return [`ComponentError::DeadlineExceeded`](crate::ComponentError)
    /// otherwise.
    pub shutdown_timeout: Duration,

    /// Bound on the final wait for start tasks.
    ///
    /// - `None`: `run` waits until every start task has returned, however long that takes
    /// - `Some(d)`: after `d`, remaining start tasks are aborted and `run` reports
    ///   [`RuntimeError::DrainExceeded`](crate::RuntimeError::DrainExceeded)
    pub drain_grace: Option<Duration>,

    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,

    /// Install SIGINT/SIGTERM (Ctrl-C off Unix) listeners during `run`.
    pub handle_signals: bool,
}

impl SupervisorConfig {
    /// Rejects configurations the runtime cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shutdown_timeout.is_zero() {
            return Err(ConfigError::ZeroShutdownTimeout);
        }
        if self.drain_grace.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::ZeroDrainGrace);
        }
        Ok(())
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for SupervisorConfig {
    /// Default configuration:
    ///
    /// - `shutdown_timeout = 20s`
    /// - `drain_grace = None` (unbounded)
    /// - `bus_capacity = 1024`
    /// - `handle_signals = true`
    fn default() -> Self {
        Self {
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            drain_grace: None,
            bus_capacity: 1024,
            handle_signals: true,
        }
    }
}
