//! Shutdown driven by a real SIGTERM delivered to this test process.
//!
//! Kept as the only test in this binary so the signal reaches no other test.

#![cfg(unix)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{EventLog, Journal, Recording, StartBehavior};
use compvisor::{EventKind, Subscribe, Supervisor, SupervisorConfig};

#[tokio::test(flavor = "multi_thread")]
async fn sigterm_stops_everything_and_run_succeeds() {
    let journal = Journal::default();
    let events = Arc::new(EventLog::default());
    let subs: Vec<Arc<dyn Subscribe>> = vec![events.clone()];
    let cfg = SupervisorConfig {
        shutdown_timeout: Duration::from_secs(2),
        handle_signals: true,
        ..SupervisorConfig::default()
    };
    let mut sup = Supervisor::builder("apiserver")
        .config(cfg)
        .with_subscribers(subs)
        .build()
        .unwrap();

    for name in ["db", "cache", "http"] {
        sup.register(Recording::new(name, &journal, StartBehavior::UntilCancelled).arc());
    }

    tokio::spawn(async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        // SAFETY: signalling our own pid; `run` has installed its listeners by now.
        let rc = unsafe { libc::kill(libc::getpid(), libc::SIGTERM) };
        assert_eq!(rc, 0);
    });

    let res = tokio::time::timeout(Duration::from_secs(10), sup.run())
        .await
        .expect("run returns after the signal");
    assert!(res.is_ok(), "{res:?}");

    assert_eq!(journal.stops(), vec!["http", "cache", "db"]);

    let requested = events.of_kind(EventKind::ShutdownRequested);
    assert_eq!(requested.len(), 1);
    assert_eq!(
        requested[0].reason.as_deref(),
        Some("termination signal received")
    );
}
