//! # Example: fail_fast
//!
//! One component fails to start; the supervisor cancels the others, stops all
//! of them in reverse order and returns the failure.
//!
//! ## Run
//! ```bash
//! cargo run --example fail_fast
//! ```

use std::time::Duration;

use compvisor::{
    ComponentError, ComponentFn, Context, RuntimeError, StopContext, Supervisor, SupervisorConfig,
};

#[tokio::main]
async fn main() {
    let cfg = SupervisorConfig {
        shutdown_timeout: Duration::from_secs(1),
        handle_signals: false,
        ..SupervisorConfig::default()
    };
    let mut sup = match Supervisor::new("fail-fast-demo", cfg) {
        Ok(sup) => sup,
        Err(e) => {
            eprintln!("invalid config: {e}");
            return;
        }
    };

    sup.register(ComponentFn::arc(
        "db",
        |ctx: Context| async move {
            println!("[db] connected; waiting for shutdown");
            ctx.cancelled().await;
            println!("[db] start task observed cancellation");
            Ok::<_, ComponentError>(())
        },
        |_stop: StopContext| async {
            println!("[db] pool closed");
            Ok::<_, ComponentError>(())
        },
    ));

    sup.register(ComponentFn::arc(
        "cache",
        |_ctx: Context| async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            println!("[cache] connection refused");
            Err::<(), _>(ComponentError::fail("dial tcp 127.0.0.1:6379: connection refused"))
        },
        |_stop: StopContext| async {
            println!("[cache] nothing to close");
            Ok::<_, ComponentError>(())
        },
    ));

    match sup.run().await {
        Ok(()) => println!("[main] unexpected clean exit"),
        Err(RuntimeError::StartFailed { component, source }) => {
            println!("[main] run failed: {component} -> {source}");
        }
        Err(e) => println!("[main] run failed: {e}"),
    }
}
