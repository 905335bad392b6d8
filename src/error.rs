//! Error types used by the compvisor runtime and components.
//!
//! This module defines three error enums:
//!
//! - [`RuntimeError`]: the terminal failure returned by [`Supervisor::run`](crate::Supervisor::run).
//! - [`ComponentError`]: failures reported by a component's `start` or `stop`.
//! - [`ConfigError`]: rejected supervisor configuration or settings files.
//!
//! Each type provides `as_label` (stable snake_case for logs/metrics) and `as_message`.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// # Errors returned by [`Supervisor::run`](crate::Supervisor::run).
///
/// A run fails only because of *why* it stopped: a component that could not start,
/// a programmatic abort, or (when a drain bound is configured) start tasks that
/// refused to finish. Stop failures never show up here; they are logged and
/// reported through [`EventKind::ShutdownCompleted`](crate::EventKind::ShutdownCompleted).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A component's `start` failed and triggered the shutdown.
    #[error("application shutdown due to error: component {component:?} failed to start: {source}")]
    StartFailed {
        /// Name of the component whose start failed first.
        component: Arc<str>,
        /// The component's error, preserved as reported.
        #[source]
        source: Arc<ComponentError>,
    },

    /// The shared context was aborted programmatically with a non-benign reason.
    #[error("application shutdown due to error: aborted: {reason}")]
    Aborted {
        /// Reason passed to [`Context::abort`](crate::Context::abort).
        reason: Arc<str>,
    },

    /// Start tasks were still running when the configured drain grace elapsed.
    #[error("start tasks did not finish within {grace:?}; stuck: {stuck:?}; aborted")]
    DrainExceeded {
        /// The configured drain grace.
        grace: Duration,
        /// Components whose start task was still in flight.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use compvisor::RuntimeError;
    ///
    /// let err = RuntimeError::Aborted { reason: "operator".into() };
    /// assert_eq!(err.as_label(), "runtime_aborted");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::StartFailed { .. } => "runtime_start_failed",
            RuntimeError::Aborted { .. } => "runtime_aborted",
            RuntimeError::DrainExceeded { .. } => "runtime_drain_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::StartFailed { component, source } => {
                format!("start failed: component={component} error={source}")
            }
            RuntimeError::Aborted { reason } => format!("aborted: {reason}"),
            RuntimeError::DrainExceeded { grace, stuck } => {
                format!("drain exceeded after {grace:?}; stuck={stuck:?}")
            }
        }
    }

    /// Returns the component error that caused the shutdown, if any.
    pub fn component_error(&self) -> Option<&ComponentError> {
        match self {
            RuntimeError::StartFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// # Errors produced by component `start` / `stop`.
///
/// A failing `start` is fatal for the process (it triggers a full shutdown);
/// a failing `stop` is recorded and the remaining components are still stopped.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ComponentError {
    /// Generic failure with a message.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// I/O failure (bind, connect, close).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The stop deadline passed before the component finished releasing resources.
    #[error("deadline exceeded after {budget:?}")]
    DeadlineExceeded {
        /// The shutdown budget the deadline was derived from.
        budget: Duration,
    },

    /// The component gave up because its context was cancelled.
    #[error("context cancelled")]
    Canceled,

    /// `start` or `stop` panicked; the panic was contained by the supervisor.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl ComponentError {
    /// Shorthand for [`ComponentError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        ComponentError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use compvisor::ComponentError;
    ///
    /// assert_eq!(ComponentError::fail("boom").as_label(), "component_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ComponentError::Fail { .. } => "component_failed",
            ComponentError::Io(_) => "component_io",
            ComponentError::DeadlineExceeded { .. } => "component_deadline_exceeded",
            ComponentError::Canceled => "component_canceled",
            ComponentError::Panicked { .. } => "component_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ComponentError::Fail { error } => format!("error: {error}"),
            ComponentError::Io(e) => format!("io: {e}"),
            ComponentError::DeadlineExceeded { budget } => format!("deadline: {budget:?}"),
            ComponentError::Canceled => "context cancelled".to_string(),
            ComponentError::Panicked { info } => format!("panic: {info}"),
        }
    }

    /// Renders a panic payload caught with `catch_unwind`.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let info = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        ComponentError::Panicked { info }
    }
}

/// # Rejected configuration.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The shutdown budget must be a positive duration.
    #[error("shutdown timeout must be greater than zero")]
    ZeroShutdownTimeout,

    /// A configured drain grace must be a positive duration.
    #[error("drain grace, when set, must be greater than zero")]
    ZeroDrainGrace,

    /// The supervisor name is used as a log label and must not be blank.
    #[error("supervisor name must not be empty")]
    EmptyName,

    /// Settings file could not be read.
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file is not valid TOML for [`Settings`](crate::settings::Settings).
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// Settings parsed but failed semantic validation; every problem is listed.
    #[error("invalid settings: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::ZeroShutdownTimeout => "config_zero_shutdown_timeout",
            ConfigError::ZeroDrainGrace => "config_zero_drain_grace",
            ConfigError::EmptyName => "config_empty_name",
            ConfigError::Io(_) => "config_io",
            ConfigError::Parse(_) => "config_parse",
            ConfigError::Invalid(_) => "config_invalid",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn start_failed_exposes_component_error_as_source() {
        let err = RuntimeError::StartFailed {
            component: "db".into(),
            source: Arc::new(ComponentError::fail("refused")),
        };
        let source = err.source().expect("source");
        assert_eq!(source.to_string(), "execution failed: refused");
        assert!(err.to_string().contains("\"db\""));
        assert!(matches!(
            err.component_error(),
            Some(ComponentError::Fail { error }) if error == "refused"
        ));
    }

    #[test]
    fn panic_payloads_are_rendered() {
        let s = ComponentError::from_panic(Box::new("static"));
        assert_eq!(s.as_message(), "panic: static");

        let owned = ComponentError::from_panic(Box::new(String::from("owned")));
        assert_eq!(owned.as_message(), "panic: owned");

        let other = ComponentError::from_panic(Box::new(42_u8));
        assert_eq!(other.as_message(), "panic: unknown panic");
    }

    #[test]
    fn invalid_settings_lists_every_problem() {
        let err = ConfigError::Invalid(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "invalid settings: a; b");
        assert_eq!(err.as_label(), "config_invalid");
    }
}
