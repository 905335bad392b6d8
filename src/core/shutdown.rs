//! # Termination signals.
//!
//! Unix listens for `SIGINT` and `SIGTERM` (the signal container runtimes and
//! systemd send); Windows listens for Ctrl-C.
//!
//! Listeners are registered in [`ShutdownSignals::install`], not on first
//! poll, so a signal that arrives before the watcher task runs is queued
//! instead of taking the default action and killing the process.

use std::fmt;
use std::io;

/// The signal that ended the wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TerminationSignal {
    Interrupt,
    #[cfg_attr(not(unix), allow(dead_code))]
    Terminate,
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TerminationSignal::Interrupt => "SIGINT",
            TerminationSignal::Terminate => "SIGTERM",
        })
    }
}

/// Registered termination signal listeners.
#[cfg(unix)]
pub(crate) struct ShutdownSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    /// Registers the listeners. Must be called within a Tokio runtime.
    pub(crate) fn install() -> io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Resolves on the first signal received since `install`.
    pub(crate) async fn recv(&mut self) -> TerminationSignal {
        tokio::select! {
            _ = self.interrupt.recv() => TerminationSignal::Interrupt,
            _ = self.terminate.recv() => TerminationSignal::Terminate,
        }
    }
}

#[cfg(windows)]
pub(crate) struct ShutdownSignals {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(windows)]
impl ShutdownSignals {
    pub(crate) fn install() -> io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    pub(crate) async fn recv(&mut self) -> TerminationSignal {
        self.ctrl_c.recv().await;
        TerminationSignal::Interrupt
    }
}
