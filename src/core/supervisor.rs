//! # Supervisor: concurrent start, fail-fast cancellation, ordered bounded shutdown.
//!
//! The [`Supervisor`] owns the registered components, the shared [`Context`],
//! the completion tracker, and the event bus.
//!
//! ## High-level architecture
//! ```text
//! Registration (before run):
//!   register(A) → register(B) → register(C)          (append-only, order is load-bearing)
//!
//! run():
//!   ShutdownSignals::install()  (before any start task)
//!   signal watcher ── SIGINT/SIGTERM ──► ctx.cancel_with(Signal)
//!
//!   A            B            C
//!   │            │            │
//!   └─► tracker.enter(i) ─► spawn(start_component(i, ctx))      (fire-and-forget)
//!                               └─ Err/panic ─► ctx.cancel_with(StartFailed)  (first writer wins)
//!
//!   ctx.cancelled().await
//!
//! Shutdown path:
//!   stop_ctx = StopContext::new(shutdown_timeout)        (deadline measured from here)
//!   C.stop(stop_ctx) → B.stop(stop_ctx) → A.stop(stop_ctx)   (reverse, sequential, once each)
//!   tracker.wait_idle()                                   (optionally bounded by drain_grace)
//!   cause benign? ─► Ok(()) : Err(RuntimeError)
//! ```
//!
//! ## Rules
//! - Stop failures are logged and reported, never abort the stop loop and never
//!   change the result of `run`.
//! - `run` returns only after every start task has finished (or, with a drain
//!   grace configured, has been aborted and reaped).

use std::sync::Arc;
use std::time::Duration;

use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::{JoinHandle, JoinSet},
    time::{self, Instant},
};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::{
    component::{ComponentRef, StopContext},
    core::{
        builder::SupervisorBuilder,
        config::SupervisorConfig,
        context::{Context, ShutdownCause},
        runner,
        shutdown::ShutdownSignals,
        tracker::CompletionTracker,
    },
    error::{ConfigError, RuntimeError},
    events::{Bus, Event, EventKind},
    subscribers::{Subscribe, SubscriberSet},
};

/// Coordinates the lifecycle of a group of components.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use compvisor::{ComponentError, ComponentFn, Context, StopContext, Supervisor, SupervisorConfig};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let cfg = SupervisorConfig {
///         shutdown_timeout: Duration::from_secs(5),
///         handle_signals: false,
///         ..SupervisorConfig::default()
///     };
///     let mut sup = Supervisor::builder("demo").config(cfg).build()?;
///
///     sup.register(ComponentFn::arc(
///         "ticker",
///         |ctx: Context| async move {
///             ctx.cancelled().await;
///             Ok::<_, ComponentError>(())
///         },
///         |_ctx: StopContext| async { Ok::<_, ComponentError>(()) },
///     ));
///
///     let ctx = sup.context();
///     tokio::spawn(async move {
///         tokio::time::sleep(Duration::from_millis(50)).await;
///         ctx.request_shutdown();
///     });
///
///     sup.run().await?;
///     Ok(())
/// }
/// ```
pub struct Supervisor {
    name: Arc<str>,
    cfg: SupervisorConfig,
    components: Vec<ComponentRef>,
    ctx: Context,
    bus: Bus,
    events: broadcast::Receiver<Event>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl Supervisor {
    /// Starts building a supervisor named `name` (a diagnostic label).
    pub fn builder(name: impl Into<String>) -> SupervisorBuilder {
        SupervisorBuilder::new(name)
    }

    /// Creates a supervisor without subscribers.
    pub fn new(name: impl Into<String>, cfg: SupervisorConfig) -> Result<Self, ConfigError> {
        SupervisorBuilder::new(name).config(cfg).build()
    }

    pub(crate) fn new_internal(
        name: Arc<str>,
        cfg: SupervisorConfig,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        // Subscribe now so registration events are buffered until `run` starts the listener.
        let events = bus.subscribe();
        Self {
            name,
            cfg,
            components: Vec::new(),
            ctx: Context::new(),
            bus,
            events,
            subscribers,
        }
    }

    /// Application name used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Active configuration.
    pub fn config(&self) -> &SupervisorConfig {
        &self.cfg
    }

    /// Number of registered components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` when nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Names of registered components in registration order.
    pub fn component_names(&self) -> Vec<String> {
        self.components.iter().map(|c| c.name().to_string()).collect()
    }

    /// Handle to the shared context, for programmatic shutdown or abort.
    pub fn context(&self) -> Context {
        self.ctx.clone()
    }

    /// Appends a component. Registration order defines the reverse stop order.
    pub fn register(&mut self, component: ComponentRef) {
        let index = self.components.len();
        let name = component.name().to_string();
        if self.components.iter().any(|c| c.name() == name) {
            warn!(app = %self.name, component = %name, index, "duplicate component name registered");
        }
        info!(app = %self.name, component = %name, index, "registered component");
        self.bus.publish(
            Event::new(EventKind::ComponentRegistered)
                .with_component(name)
                .with_index(index),
        );
        self.components.push(component);
    }

    /// Starts every component, waits for a termination trigger, then stops them.
    ///
    /// Returns `Ok(())` when the run ended because of a signal or
    /// [`Context::request_shutdown`]; otherwise the error describing the cause.
    pub async fn run(self) -> Result<(), RuntimeError> {
        let span = info_span!("supervisor", app = %self.name);
        self.run_inner().instrument(span).await
    }

    async fn run_inner(self) -> Result<(), RuntimeError> {
        let Supervisor {
            name,
            cfg,
            components,
            ctx,
            bus,
            events,
            subscribers,
        } = self;

        let listener = spawn_event_listener(events, subscribers);
        // Listeners must exist before the first start task is spawned.
        let signals = if cfg.handle_signals {
            match ShutdownSignals::install() {
                Ok(listeners) => Some(spawn_signal_watcher(listeners, ctx.clone())),
                Err(e) => {
                    warn!(error = %e, "failed to install signal handlers; relying on programmatic shutdown");
                    None
                }
            }
        } else {
            None
        };

        let tracker = CompletionTracker::new();
        let mut start_tasks = JoinSet::new();
        spawn_start_tasks(&mut start_tasks, &tracker, &components, &ctx, &bus);
        info!(components = components.len(), "all components initiated for start; application {name} is running");

        ctx.cancelled().await;
        // A cause is always recorded before the token is cancelled.
        let cause = ctx.cause().unwrap_or(ShutdownCause::Requested);
        if cause.is_benign() {
            info!(cause = %cause, "shutdown signal received or context cancelled normally");
        } else {
            warn!(cause = %cause, label = cause.as_label(), "shutdown initiated due to error");
        }
        bus.publish(Event::new(EventKind::ShutdownRequested).with_reason(cause.to_string()));

        info!(budget_ms = cfg.shutdown_timeout.as_millis() as u64, "initiating graceful stop of application {name}");
        let shutdown_started = Instant::now();
        let failed_stops = stop_in_reverse(&components, cfg.shutdown_timeout, &bus).await;

        let drain = drain_start_tasks(&mut start_tasks, &tracker, cfg.drain_grace, &bus).await;

        if let Some(handle) = signals {
            handle.abort();
        }

        let elapsed = shutdown_started.elapsed();
        let mut summary = cause.to_string();
        if failed_stops.is_empty() {
            info!(elapsed_ms = elapsed.as_millis() as u64, "application {name} stopped gracefully");
        } else {
            error!(
                failed = ?failed_stops,
                elapsed_ms = elapsed.as_millis() as u64,
                "application {name} stopped; some components failed to stop"
            );
            summary.push_str(&format!("; failed stops: {}", failed_stops.join(", ")));
        }
        bus.publish(
            Event::new(EventKind::ShutdownCompleted)
                .with_reason(summary)
                .with_elapsed(elapsed),
        );

        // Dropping the last sender closes the bus; the listener drains and exits.
        drop(bus);
        if let Some(listener) = listener {
            let _ = listener.await;
        }

        match cause {
            ShutdownCause::StartFailed { component, error } => Err(RuntimeError::StartFailed {
                component,
                source: error,
            }),
            ShutdownCause::Aborted { reason } => Err(RuntimeError::Aborted { reason }),
            ShutdownCause::Signal | ShutdownCause::Requested => match drain {
                Some((grace, stuck)) => Err(RuntimeError::DrainExceeded { grace, stuck }),
                None => Ok(()),
            },
        }
    }
}

/// Spawns one start task per component; each takes its tracker slot before spawning.
fn spawn_start_tasks(
    set: &mut JoinSet<()>,
    tracker: &Arc<CompletionTracker>,
    components: &[ComponentRef],
    ctx: &Context,
    bus: &Bus,
) {
    for (index, component) in components.iter().enumerate() {
        let name: Arc<str> = component.name().into();
        let guard = tracker.enter(index, Arc::clone(&name));
        let span = info_span!("component", component = %name, index);
        let fut = runner::start_component(
            index,
            name,
            Arc::clone(component),
            ctx.clone(),
            bus.clone(),
        );
        set.spawn(
            async move {
                let _guard = guard;
                fut.await;
            }
            .instrument(span),
        );
    }
}

/// Calls `stop` on every component, last registered first, one at a time.
///
/// Returns `"name: error"` for each failed stop.
async fn stop_in_reverse(components: &[ComponentRef], budget: Duration, bus: &Bus) -> Vec<String> {
    let stop_ctx = StopContext::new(budget);
    let mut failed = Vec::new();
    for (index, component) in components.iter().enumerate().rev() {
        if let Err(e) = runner::stop_component(index, component, &stop_ctx, bus).await {
            failed.push(format!("{}: {e}", component.name()));
        }
    }
    failed
}

/// Waits for every start task to finish.
///
/// With a grace configured and exceeded, aborts the remaining tasks, reaps them,
/// and returns the grace together with the components that were still running.
async fn drain_start_tasks(
    set: &mut JoinSet<()>,
    tracker: &CompletionTracker,
    grace: Option<Duration>,
    bus: &Bus,
) -> Option<(Duration, Vec<String>)> {
    info!(in_flight = tracker.in_flight(), "waiting for component start tasks to complete");
    let started = Instant::now();

    let exceeded = match grace {
        None => {
            tracker.wait_idle().await;
            None
        }
        Some(grace) => {
            let waited = time::timeout(grace, tracker.wait_idle()).await;
            match waited {
                Ok(()) => None,
                Err(_elapsed) => Some((grace, tracker.snapshot())),
            }
        }
    };

    if let Some((grace, stuck)) = &exceeded {
        error!(grace_ms = grace.as_millis() as u64, stuck = ?stuck, "start tasks did not finish in time; aborting them");
        set.abort_all();
    }
    while set.join_next().await.is_some() {}

    let elapsed = started.elapsed();
    match &exceeded {
        None => {
            info!(elapsed_ms = elapsed.as_millis() as u64, "all component start tasks have completed");
            bus.publish(Event::new(EventKind::DrainCompleted).with_elapsed(elapsed));
        }
        Some((_, stuck)) => {
            bus.publish(
                Event::new(EventKind::DrainExceeded)
                    .with_reason(stuck.join(", "))
                    .with_elapsed(elapsed),
            );
        }
    }
    exceeded
}

/// Forwards bus events to the subscribers; `None` when there are no subscribers.
fn spawn_event_listener(
    mut rx: broadcast::Receiver<Event>,
    subscribers: Vec<Arc<dyn Subscribe>>,
) -> Option<JoinHandle<()>> {
    let set = SubscriberSet::new(subscribers);
    if set.is_empty() {
        return None;
    }
    debug!(subscribers = set.len(), "event listener started");
    Some(tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => set.emit(ev),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event listener lagged; events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        set.shutdown().await;
    }))
}

/// Cancels `ctx` with [`ShutdownCause::Signal`] on SIGINT/SIGTERM.
fn spawn_signal_watcher(mut signals: ShutdownSignals, ctx: Context) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            signal = signals.recv() => {
                info!(%signal, "termination signal received");
                ctx.cancel_with(ShutdownCause::Signal);
            }
            _ = ctx.cancelled() => {
                debug!("signal watcher released");
            }
        }
    })
}
