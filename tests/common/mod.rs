//! Shared utilities for the supervisor integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use compvisor::{
    Component, ComponentError, Context, Event, EventKind, StopContext, Subscribe, SupervisorConfig,
};

/// Ordered log of lifecycle calls shared by every component of a test.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Component names in the order their `stop` was called.
    pub fn stops(&self) -> Vec<String> {
        self.with_prefix("stop:")
    }

    /// Component names in the order their start task returned.
    pub fn start_exits(&self) -> Vec<String> {
        self.with_prefix("start-exit:")
    }

    fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries()
            .iter()
            .filter_map(|e| e.strip_prefix(prefix).map(str::to_string))
            .collect()
    }
}

/// What a [`Recording`] component does in `start`.
#[derive(Clone, Debug)]
pub enum StartBehavior {
    /// Returns `Ok` right away.
    Immediate,
    /// Blocks until the context is cancelled, then returns `Ok`.
    UntilCancelled,
    /// Blocks until cancelled, then keeps running for the given time.
    LingerAfterCancel(Duration),
    /// Sleeps, then fails with the given message.
    FailAfter(Duration, &'static str),
    /// Ignores cancellation and sleeps for the given time.
    IgnoreCancel(Duration),
    /// Panics.
    Panic,
}

/// Component that records every call into a [`Journal`].
pub struct Recording {
    name: String,
    journal: Journal,
    start: StartBehavior,
    stop_error: Option<&'static str>,
    stop_delay: Duration,
    pub stop_calls: AtomicUsize,
}

impl Recording {
    pub fn new(name: &str, journal: &Journal, start: StartBehavior) -> Self {
        Self {
            name: name.to_string(),
            journal: journal.clone(),
            start,
            stop_error: None,
            stop_delay: Duration::ZERO,
            stop_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_stop(mut self, message: &'static str) -> Self {
        self.stop_error = Some(message);
        self
    }

    pub fn slow_stop(mut self, delay: Duration) -> Self {
        self.stop_delay = delay;
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl Component for Recording {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, ctx: Context) -> Result<(), ComponentError> {
        self.journal.push(format!("start:{}", self.name));
        let res = match &self.start {
            StartBehavior::Immediate => Ok(()),
            StartBehavior::UntilCancelled => {
                ctx.cancelled().await;
                Ok(())
            }
            StartBehavior::LingerAfterCancel(d) => {
                ctx.cancelled().await;
                tokio::time::sleep(*d).await;
                Ok(())
            }
            StartBehavior::FailAfter(d, msg) => {
                tokio::time::sleep(*d).await;
                Err(ComponentError::fail(*msg))
            }
            StartBehavior::IgnoreCancel(d) => {
                tokio::time::sleep(*d).await;
                Ok(())
            }
            StartBehavior::Panic => panic!("{} exploded", self.name),
        };
        self.journal.push(format!("start-exit:{}", self.name));
        res
    }

    async fn stop(&self, ctx: StopContext) -> Result<(), ComponentError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.journal.push(format!("stop:{}", self.name));
        if !self.stop_delay.is_zero() {
            ctx.bound(tokio::time::sleep(self.stop_delay)).await?;
        }
        match self.stop_error {
            Some(msg) => Err(ComponentError::fail(msg)),
            None => Ok(()),
        }
    }
}

/// Subscriber that keeps every event it receives.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind).collect()
    }

    pub fn of_kind(&self, kind: EventKind) -> Vec<Event> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Subscribe for EventLog {
    async fn on_event(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn name(&self) -> &'static str {
        "event-log"
    }
}

/// Test configuration: no OS signal handling, short budget.
pub fn config(shutdown_timeout: Duration) -> SupervisorConfig {
    SupervisorConfig {
        shutdown_timeout,
        handle_signals: false,
        ..SupervisorConfig::default()
    }
}

/// Requests a graceful shutdown after `delay`.
pub fn shutdown_after(ctx: Context, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        ctx.request_shutdown();
    });
}
