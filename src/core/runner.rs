//! # Execute one component's `start` or `stop`.
//!
//! Runs a single lifecycle call with panic isolation and publishes its
//! outcome to the [`Bus`].
//!
//! ## Event flow
//! ```text
//! start:
//!   publish ComponentStarting → component.start(ctx)
//!       ├─ Ok(())                         → publish ComponentStarted
//!       ├─ Err(Canceled) after shutdown   → publish ComponentStarted (graceful exit)
//!       └─ Err(e) / panic                 → publish ComponentStartFailed
//!                                           → ctx.cancel_with(StartFailed)   (first writer wins)
//!
//! stop:
//!   publish ComponentStopping → component.stop(stop_ctx)
//!       ├─ Ok(())       → publish ComponentStopped
//!       └─ Err / panic  → publish ComponentStopFailed   (never aborts the stop loop)
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::{
    component::{ComponentRef, StopContext},
    core::context::{Context, ShutdownCause},
    error::ComponentError,
    events::{Bus, Event, EventKind},
};

/// Runs `component.start(ctx)` and turns a failure into a shutdown trigger.
pub(crate) async fn start_component(
    index: usize,
    name: Arc<str>,
    component: ComponentRef,
    ctx: Context,
    bus: Bus,
) {
    info!("starting component");
    bus.publish(
        Event::new(EventKind::ComponentStarting)
            .with_component(Arc::clone(&name))
            .with_index(index),
    );

    let started = Instant::now();
    let res = AssertUnwindSafe(component.start(ctx.clone()))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(ComponentError::from_panic(panic)));
    let elapsed = started.elapsed();

    match res {
        Ok(()) => {
            debug!(elapsed_ms = elapsed.as_millis() as u64, "component start returned");
            publish_started(&bus, &name, index, elapsed);
        }
        Err(ComponentError::Canceled) if ctx.is_cancelled() => {
            debug!("component start ended by cancellation");
            publish_started(&bus, &name, index, elapsed);
        }
        Err(e) => {
            error!(error = %e, "error starting component; initiating application shutdown");
            bus.publish(
                Event::new(EventKind::ComponentStartFailed)
                    .with_component(Arc::clone(&name))
                    .with_index(index)
                    .with_reason(e.to_string())
                    .with_elapsed(elapsed),
            );
            let recorded = ctx.cancel_with(ShutdownCause::StartFailed {
                component: name,
                error: Arc::new(e),
            });
            if !recorded {
                debug!("shutdown already in progress; start failure not recorded as cause");
            }
        }
    }
}

/// Runs `component.stop(ctx)` and reports the outcome.
pub(crate) async fn stop_component(
    index: usize,
    component: &ComponentRef,
    ctx: &StopContext,
    bus: &Bus,
) -> Result<(), ComponentError> {
    let name = component.name();
    info!(component = name, index, "attempting to stop component");
    bus.publish(
        Event::new(EventKind::ComponentStopping)
            .with_component(name)
            .with_index(index),
    );

    let started = Instant::now();
    let res = AssertUnwindSafe(component.stop(ctx.clone()))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(ComponentError::from_panic(panic)));
    let elapsed = started.elapsed();

    match &res {
        Ok(()) => {
            info!(component = name, index, elapsed_ms = elapsed.as_millis() as u64, "component stopped successfully");
            bus.publish(
                Event::new(EventKind::ComponentStopped)
                    .with_component(name)
                    .with_index(index)
                    .with_elapsed(elapsed),
            );
        }
        Err(e) => {
            error!(component = name, index, error = %e, label = e.as_label(), "error stopping component");
            bus.publish(
                Event::new(EventKind::ComponentStopFailed)
                    .with_component(name)
                    .with_index(index)
                    .with_reason(e.to_string())
                    .with_elapsed(elapsed),
            );
        }
    }
    res
}

fn publish_started(bus: &Bus, name: &Arc<str>, index: usize, elapsed: std::time::Duration) {
    bus.publish(
        Event::new(EventKind::ComponentStarted)
            .with_component(Arc::clone(name))
            .with_index(index)
            .with_elapsed(elapsed),
    );
}
