//! # Example: basic_components
//!
//! Three components sharing one supervisor, mirroring a typical service:
//! a database pool, a cache client and an HTTP listener.
//!
//! Shows how to:
//! - Wrap start/stop closures with [`ComponentFn`].
//! - Attach a [`Subscribe`] implementation to watch lifecycle events.
//! - Trigger a graceful shutdown with [`Context::request_shutdown`].
//!
//! ## Flow
//! ```text
//! register(db) → register(cache) → register(http)
//! run(): start db ┐
//!        start cache ├─ concurrently
//!        start http ┘
//! request_shutdown() after 300ms
//! stop http → stop cache → stop db   (reverse order, one budget)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic_components
//! ```

use std::{sync::Arc, time::Duration};

use compvisor::{
    ComponentError, ComponentFn, ComponentRef, Context, Event, EventKind, StopContext, Subscribe,
    Supervisor, SupervisorConfig,
};

/// Prints start and stop outcomes as they happen.
struct ConsoleSubscriber;

#[async_trait::async_trait]
impl Subscribe for ConsoleSubscriber {
    async fn on_event(&self, ev: &Event) {
        let component = ev.component.as_deref().unwrap_or("-");
        match ev.kind {
            EventKind::ComponentStarted => println!("[sub] started:  {component}"),
            EventKind::ComponentStopped => println!(
                "[sub] stopped:  {component} in {}ms",
                ev.elapsed_ms.unwrap_or(0)
            ),
            EventKind::ComponentStopFailed => println!(
                "[sub] stop failed: {component} reason={}",
                ev.reason.as_deref().unwrap_or("<none>")
            ),
            EventKind::ShutdownCompleted => println!(
                "[sub] shutdown completed: {}",
                ev.reason.as_deref().unwrap_or("<none>")
            ),
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

/// Component that connects in `start`, then idles until cancelled.
fn make_component(name: &'static str, connect_ms: u64, close_ms: u64) -> ComponentRef {
    ComponentFn::arc(
        name,
        move |ctx: Context| async move {
            println!("[{name}] connecting ({connect_ms}ms)");
            tokio::time::sleep(Duration::from_millis(connect_ms)).await;
            println!("[{name}] ready");
            ctx.cancelled().await;
            Ok::<_, ComponentError>(())
        },
        move |stop: StopContext| async move {
            println!("[{name}] closing (budget left {:?})", stop.remaining());
            stop.bound(tokio::time::sleep(Duration::from_millis(close_ms)))
                .await?;
            println!("[{name}] closed");
            Ok::<_, ComponentError>(())
        },
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = SupervisorConfig {
        shutdown_timeout: Duration::from_secs(2),
        ..SupervisorConfig::default()
    };
    let mut sup = Supervisor::builder("apiserver")
        .config(cfg)
        .with_subscribers(vec![Arc::new(ConsoleSubscriber)])
        .build()?;

    sup.register(make_component("db", 50, 30));
    sup.register(make_component("cache", 20, 10));
    sup.register(make_component("http", 5, 20));

    let ctx = sup.context();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        println!("[main] requesting shutdown");
        ctx.request_shutdown();
    });

    sup.run().await?;
    println!("[main] done");
    Ok(())
}
