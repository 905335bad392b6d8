//! Structured logging setup.
//!
//! The library only emits `tracing` records; installing a global subscriber is
//! left to the binary (or the embedding application).
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - JSON format for production, plain format for development

use thiserror::Error;
use tracing_subscriber::{
    EnvFilter, filter::ParseError, fmt, layer::SubscriberExt, util::SubscriberInitExt,
    util::TryInitError,
};

use crate::settings::{LogFormat, LogSettings};

/// Failure to install the global subscriber.
#[derive(Error, Debug)]
pub enum LoggingError {
    /// `log.level` is not a valid filter directive.
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),

    /// A global subscriber was already installed.
    #[error("failed to install subscriber: {0}")]
    Install(#[from] TryInitError),
}

/// Builds the filter: `RUST_LOG` if set and valid, otherwise `settings.level`.
pub fn filter(settings: &LogSettings) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(&settings.level)?),
    }
}

/// Installs the global `tracing` subscriber.
pub fn init(settings: &LogSettings) -> Result<(), LoggingError> {
    let json = settings.format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(filter(settings)?)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_builds_a_filter() {
        let settings = LogSettings {
            level: "compvisor=debug,warn".to_string(),
            format: LogFormat::Plain,
        };
        assert!(filter(&settings).is_ok());
    }
}
