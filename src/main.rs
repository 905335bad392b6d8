//! `compvisor` binary: runs the built-in probes and health listener under a
//! supervisor, configured from an optional TOML file and command-line flags.
//!
//! Exit status: `0` after a graceful shutdown, `1` when the run failed, `2` when
//! the configuration was rejected.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use compvisor::settings::{LogFormat, Settings};
use compvisor::{ConfigError, Probe, Supervisor, TcpServer, logging};

/// Lifecycle supervisor for long-running components.
#[derive(Parser, Debug)]
#[command(name = "compvisor", version, about)]
struct Cli {
    /// Settings file (TOML). Defaults apply when omitted.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Application name used in logs.
    #[arg(long)]
    name: Option<String>,

    /// Budget for the whole stop phase, in milliseconds.
    #[arg(long, value_name = "MS")]
    shutdown_timeout_ms: Option<u64>,

    /// Log filter directive (overridden by RUST_LOG).
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,

    /// Log output format.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

impl Cli {
    fn settings(&self) -> Result<Settings, ConfigError> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        if let Some(name) = &self.name {
            settings.name = name.clone();
        }
        if let Some(ms) = self.shutdown_timeout_ms {
            settings.shutdown_timeout_ms = ms;
        }
        if let Some(level) = &self.log_level {
            settings.log.level = level.clone();
        }
        if let Some(format) = self.log_format {
            settings.log.format = format;
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match cli.settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("compvisor: {e}");
            return ExitCode::from(2);
        }
    };
    if let Err(e) = logging::init(&settings.log) {
        eprintln!("compvisor: {e}");
        return ExitCode::from(2);
    }

    let mut sup = match Supervisor::new(settings.name.clone(), settings.supervisor_config()) {
        Ok(sup) => sup,
        Err(e) => {
            error!(error = %e, label = e.as_label(), "invalid supervisor configuration");
            return ExitCode::from(2);
        }
    };

    for probe in &settings.probes {
        sup.register(Arc::new(Probe::tcp(
            probe.name.clone(),
            probe.target.clone(),
            Duration::from_millis(probe.interval_ms),
        )));
    }
    // Registered last so it stops accepting traffic before its dependencies go away.
    if settings.http.enabled {
        sup.register(Arc::new(TcpServer::new("http", settings.http.addr.clone())));
    }

    info!(
        app = %settings.name,
        components = ?sup.component_names(),
        shutdown_timeout_ms = settings.shutdown_timeout_ms,
        "configuration loaded"
    );

    match sup.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, label = e.as_label(), "application exited with error");
            ExitCode::FAILURE
        }
    }
}
