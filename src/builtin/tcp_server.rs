//! # HTTP health listener.
//!
//! `start` binds (a bind error is a start failure), spawns the server, then
//! returns. The server drains gracefully once the shared context is cancelled
//! or `stop` cancels it; `stop` waits for it within the stop deadline and
//! aborts it past that point.
//!
//! Routes: `GET /health` → `200 OK`, anything else → `200` with a greeting.

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use axum::{Router, extract::State, routing::get};
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    component::{Component, StopContext},
    core::Context,
    error::ComponentError,
};

struct Running {
    local_addr: SocketAddr,
    token: CancellationToken,
    server: JoinHandle<io::Result<()>>,
}

/// Listener component serving a fixed health response.
pub struct TcpServer {
    name: String,
    addr: String,
    running: Mutex<Option<Running>>,
}

impl TcpServer {
    /// Creates a listener that will bind `addr` on start (`port 0` picks a free port).
    pub fn new(name: impl Into<String>, addr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            addr: addr.into(),
            running: Mutex::new(None),
        }
    }

    /// Bound address, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|r| r.local_addr)
    }

    fn router(&self) -> Router {
        let greeting: Arc<str> = format!("Hello from {}!", self.name).into();
        Router::new()
            .route("/health", get(health))
            .route("/", get(greet))
            .fallback(greet)
            .with_state(greeting)
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn greet(State(greeting): State<Arc<str>>) -> String {
    greeting.to_string()
}

#[async_trait]
impl Component for TcpServer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, ctx: Context) -> Result<(), ComponentError> {
        let listener = TcpListener::bind(&self.addr).await?;
        let local_addr = listener.local_addr()?;
        info!(component = %self.name, addr = %local_addr, "listening for connections");

        let token = ctx.child_token();
        let app = self.router();
        let shutdown = token.clone().cancelled_owned();
        let name = self.name.clone();
        let server = tokio::spawn(async move {
            let res = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await;
            info!(component = %name, "context done; listener closed");
            res
        });

        *self.running.lock().unwrap_or_else(PoisonError::into_inner) = Some(Running {
            local_addr,
            token,
            server,
        });
        Ok(())
    }

    async fn stop(&self, ctx: StopContext) -> Result<(), ComponentError> {
        let running = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut running) = running else {
            debug!(component = %self.name, "listener was never started");
            return Ok(());
        };

        info!(component = %self.name, "shutting down listener");
        running.token.cancel();
        match ctx.bound(&mut running.server).await {
            Ok(Ok(res)) => Ok(res?),
            Ok(Err(join)) => Err(ComponentError::fail(format!("server task: {join}"))),
            Err(deadline) => {
                running.server.abort();
                Err(deadline)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(
                format!("GET {path} HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n")
                    .as_bytes(),
            )
            .await
            .unwrap();
        let mut out = String::new();
        stream.read_to_string(&mut out).await.unwrap();
        out
    }

    #[tokio::test]
    async fn serves_health_until_stopped() {
        let server = TcpServer::new("http", "127.0.0.1:0");
        let ctx = Context::new();
        server.start(ctx.clone()).await.unwrap();
        let addr = server.local_addr().expect("bound");

        let health = get(addr, "/health").await;
        assert!(health.starts_with("HTTP/1.1 200 OK"), "{health}");
        assert!(health.ends_with("OK"));
        assert!(get(addr, "/").await.ends_with("Hello from http!"));
        assert!(get(addr, "/anything").await.ends_with("Hello from http!"));

        ctx.request_shutdown();
        server
            .stop(StopContext::new(Duration::from_secs(2)))
            .await
            .unwrap();
        assert!(server.local_addr().is_none());
        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn idle_client_does_not_hold_up_stop() {
        let server = TcpServer::new("http", "127.0.0.1:0");
        let ctx = Context::new();
        server.start(ctx.clone()).await.unwrap();
        let addr = server.local_addr().expect("bound");

        let _silent = TcpStream::connect(addr).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        ctx.request_shutdown();
        server
            .stop(StopContext::new(Duration::from_millis(300)))
            .await
            .unwrap();
        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn stop_without_shared_cancellation_closes_listener() {
        let server = TcpServer::new("http", "127.0.0.1:0");
        server.start(Context::new()).await.unwrap();
        let addr = server.local_addr().expect("bound");

        server
            .stop(StopContext::new(Duration::from_secs(1)))
            .await
            .unwrap();
        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn bind_conflict_fails_start() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let server = TcpServer::new("http", addr.to_string());
        let err = server.start(Context::new()).await.unwrap_err();
        assert_eq!(err.as_label(), "component_io");
        server
            .stop(StopContext::new(Duration::from_secs(1)))
            .await
            .unwrap();
    }
}
