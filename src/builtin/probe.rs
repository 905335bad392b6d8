//! # Periodic health probe.
//!
//! `start` runs one check (a failure is a start failure), then spawns a loop
//! that repeats the check every `interval` until the shared context is
//! cancelled. Failed checks in the loop are logged, never fatal. `stop` waits
//! for the loop within the stop deadline.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio::{net::TcpStream, task::JoinHandle, time};
use tracing::{debug, info, warn};

use crate::{
    component::{Component, StopContext},
    core::Context,
    error::ComponentError,
};

type CheckFn = Arc<dyn Fn() -> BoxFuture<'static, Result<(), ComponentError>> + Send + Sync>;

/// Connect timeout ceiling for [`Probe::tcp`].
const TCP_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct Counters {
    passed: AtomicU64,
    failed: AtomicU64,
}

/// Component that polls a health check until the run ends.
pub struct Probe {
    name: String,
    interval: Duration,
    check: CheckFn,
    counters: Arc<Counters>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl Probe {
    /// Creates a probe around an async check.
    pub fn new<F, Fut>(name: impl Into<String>, interval: Duration, check: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ComponentError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            interval,
            check: Arc::new(move || Box::pin(check())),
            counters: Arc::new(Counters::default()),
            poller: Mutex::new(None),
        }
    }

    /// Probe whose check opens (and drops) a TCP connection to `target`.
    pub fn tcp(name: impl Into<String>, target: impl Into<String>, interval: Duration) -> Self {
        let target: Arc<str> = target.into().into();
        let connect_timeout = interval.min(TCP_CONNECT_TIMEOUT);
        Self::new(name, interval, move || {
            let target = Arc::clone(&target);
            async move {
                match time::timeout(connect_timeout, TcpStream::connect(&*target)).await {
                    Ok(Ok(_stream)) => Ok(()),
                    Ok(Err(e)) => Err(ComponentError::Io(e)),
                    Err(_elapsed) => Err(ComponentError::fail(format!(
                        "connect to {target} timed out after {connect_timeout:?}"
                    ))),
                }
            }
        })
    }

    /// Number of successful checks so far.
    pub fn passed(&self) -> u64 {
        self.counters.passed.load(Ordering::Relaxed)
    }

    /// Number of failed checks so far.
    pub fn failed(&self) -> u64 {
        self.counters.failed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Component for Probe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, ctx: Context) -> Result<(), ComponentError> {
        if let Err(e) = (self.check)().await {
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
            return Err(e);
        }
        self.counters.passed.fetch_add(1, Ordering::Relaxed);
        info!(component = %self.name, interval_ms = self.interval.as_millis() as u64, "initial check passed; polling");

        let handle = tokio::spawn(poll(
            self.name.clone(),
            self.interval,
            Arc::clone(&self.check),
            Arc::clone(&self.counters),
            ctx,
        ));
        *self.poller.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    async fn stop(&self, ctx: StopContext) -> Result<(), ComponentError> {
        let handle = self
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut handle) = handle else {
            return Ok(());
        };
        match ctx.bound(&mut handle).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(join)) => Err(ComponentError::fail(format!("poller: {join}"))),
            Err(deadline) => {
                handle.abort();
                Err(deadline)
            }
        }
    }
}

async fn poll(
    name: String,
    interval: Duration,
    check: CheckFn,
    counters: Arc<Counters>,
    ctx: Context,
) {
    let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ctx.cancelled() => break,
            _ = ticker.tick() => {
                match check().await {
                    Ok(()) => {
                        counters.passed.fetch_add(1, Ordering::Relaxed);
                        debug!(component = %name, "check passed");
                    }
                    Err(e) => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        warn!(component = %name, error = %e, "check failed");
                    }
                }
            }
        }
    }
    info!(component = %name, "context done; stopping checker");
}
