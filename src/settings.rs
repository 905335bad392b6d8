//! Application settings for the `compvisor` binary.
//!
//! # Data Flow
//! ```text
//! settings file (TOML, optional)
//!     → Settings::load / from_toml (serde, all fields defaulted)
//!     → CLI overrides (main.rs)
//!     → Settings::validate (semantic checks, every problem reported)
//!     → Settings::supervisor_config → Supervisor
//! ```
//!
//! # Example
//! ```toml
//! name = "apiserver"
//! shutdown_timeout_ms = 20000
//!
//! [log]
//! level = "info"
//! format = "json"
//!
//! [http]
//! addr = "0.0.0.0:5555"
//!
//! [[probes]]
//! name = "mysql"
//! target = "127.0.0.1:3306"
//! interval_ms = 10000
//! ```

use std::collections::HashSet;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use clap::ValueEnum;
use serde::Deserialize;

use crate::core::{DEFAULT_SHUTDOWN_TIMEOUT, SupervisorConfig};
use crate::error::ConfigError;

/// Top-level settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Application name (log label).
    pub name: String,
    /// Budget for the whole stop phase, in milliseconds.
    pub shutdown_timeout_ms: u64,
    /// Optional bound on waiting for start tasks, in milliseconds.
    pub drain_grace_ms: Option<u64>,
    /// Shut down on SIGINT/SIGTERM.
    pub handle_signals: bool,
    /// Logging output.
    pub log: LogSettings,
    /// Built-in HTTP health listener.
    pub http: HttpSettings,
    /// TCP reachability probes, registered in file order before the listener.
    pub probes: Vec<ProbeSettings>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Plain,
    /// One JSON object per record.
    Json,
}

/// `[log]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
    /// Filter directive used when `RUST_LOG` is unset (e.g. `info`, `compvisor=debug`).
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Plain,
        }
    }
}

/// `[http]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpSettings {
    /// Register the listener at all.
    pub enabled: bool,
    /// Bind address.
    pub addr: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: "127.0.0.1:5555".to_string(),
        }
    }
}

/// One `[[probes]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeSettings {
    /// Component name.
    pub name: String,
    /// `host:port` to connect to.
    pub target: String,
    /// Delay between checks, in milliseconds.
    #[serde(default = "default_probe_interval_ms")]
    pub interval_ms: u64,
}

fn default_probe_interval_ms() -> u64 {
    10_000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: "compvisor".to_string(),
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT.as_millis() as u64,
            drain_grace_ms: None,
            handle_signals: true,
            log: LogSettings::default(),
            http: HttpSettings::default(),
            probes: Vec::new(),
        }
    }
}

impl Settings {
    /// Reads and parses a settings file.
    ///
    /// Not validated yet: command-line overrides are applied on top first.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses settings without validating them.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Checks value ranges and references; returns every problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("name must not be empty".to_string());
        }
        if self.shutdown_timeout_ms == 0 {
            errors.push("shutdown_timeout_ms must be greater than zero".to_string());
        }
        if self.drain_grace_ms == Some(0) {
            errors.push("drain_grace_ms, when set, must be greater than zero".to_string());
        }
        if self.log.level.trim().is_empty() {
            errors.push("log.level must not be empty".to_string());
        }
        if self.http.enabled && self.http.addr.parse::<SocketAddr>().is_err() {
            errors.push(format!("http.addr {:?} is not a socket address", self.http.addr));
        }

        let mut seen = HashSet::new();
        for (i, probe) in self.probes.iter().enumerate() {
            if probe.name.trim().is_empty() {
                errors.push(format!("probes[{i}].name must not be empty"));
            } else if !seen.insert(probe.name.as_str()) {
                errors.push(format!("probes[{i}].name {:?} is duplicated", probe.name));
            }
            if !is_host_port(&probe.target) {
                errors.push(format!("probes[{i}].target {:?} is not host:port", probe.target));
            }
            if probe.interval_ms == 0 {
                errors.push(format!("probes[{i}].interval_ms must be greater than zero"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// Supervisor configuration derived from these settings.
    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            shutdown_timeout: Duration::from_millis(self.shutdown_timeout_ms),
            drain_grace: self.drain_grace_ms.map(Duration::from_millis),
            handle_signals: self.handle_signals,
            ..SupervisorConfig::default()
        }
    }
}

fn is_host_port(s: &str) -> bool {
    match s.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let s = Settings::from_toml("").unwrap();
        assert_eq!(s.name, "compvisor");
        assert_eq!(s.shutdown_timeout_ms, 20_000);
        assert!(s.http.enabled);
        assert!(s.validate().is_ok());
        assert_eq!(s.supervisor_config().shutdown_timeout, Duration::from_secs(20));
    }

    #[test]
    fn full_file_is_parsed() {
        let s = Settings::from_toml(
            r#"
            name = "apiserver"
            shutdown_timeout_ms = 1500
            drain_grace_ms = 500
            handle_signals = false

            [log]
            level = "debug"
            format = "json"

            [http]
            addr = "0.0.0.0:8080"

            [[probes]]
            name = "mysql"
            target = "db.internal:3306"

            [[probes]]
            name = "redis"
            target = "127.0.0.1:6379"
            interval_ms = 30000
            "#,
        )
        .unwrap();

        assert!(s.validate().is_ok());
        assert_eq!(s.log.format, LogFormat::Json);
        assert_eq!(s.probes.len(), 2);
        assert_eq!(s.probes[0].interval_ms, 10_000);
        assert_eq!(s.probes[1].interval_ms, 30_000);

        let cfg = s.supervisor_config();
        assert_eq!(cfg.shutdown_timeout, Duration::from_millis(1500));
        assert_eq!(cfg.drain_grace, Some(Duration::from_millis(500)));
        assert!(!cfg.handle_signals);
    }

    #[test]
    fn validation_reports_every_problem() {
        let s = Settings::from_toml(
            r#"
            name = " "
            shutdown_timeout_ms = 0

            [http]
            addr = "nowhere"

            [[probes]]
            name = "db"
            target = "db"
            interval_ms = 0

            [[probes]]
            name = "db"
            target = "db:5432"
            "#,
        )
        .unwrap();

        match s.validate() {
            Err(ConfigError::Invalid(errors)) => {
                assert_eq!(errors.len(), 6, "{errors:?}");
                assert!(errors.iter().any(|e| e.contains("shutdown_timeout_ms")));
                assert!(errors.iter().any(|e| e.contains("duplicated")));
            }
            other => panic!("expected invalid settings, got {other:?}"),
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Settings::from_toml("shutdown_overall_timeout = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_a_file_from_disk() {
        let path = std::env::temp_dir()
            .join(format!("compvisor-settings-{}.toml", std::process::id()));
        fs::write(&path, "name = \"edge\"\nshutdown_timeout_ms = 750\n").unwrap();
        let s = Settings::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(s.name, "edge");
        assert_eq!(s.shutdown_timeout_ms, 750);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Settings::load(Path::new("/nonexistent/compvisor.toml")).unwrap_err();
        assert_eq!(err.as_label(), "config_io");
    }

    #[test]
    fn disabled_listener_skips_address_check() {
        let s = Settings::from_toml("[http]\nenabled = false\naddr = \"bogus\"").unwrap();
        assert!(s.validate().is_ok());
    }
}
