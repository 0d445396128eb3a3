//! Axum-backed HTTP server.
//!
//! # Responsibilities
//! - Build the Axum router (health route plus caller routes)
//! - Wire up middleware (tracing, request timeout)
//! - Bind and serve with graceful shutdown
//! - Report the bound address once serving

use async_trait::async_trait;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::HttpConfig;
use crate::error::ServerError;
use crate::server::{Protocol, Server};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServeState {
    Idle,
    Running(SocketAddr),
    Stopped,
}

/// HTTP server hosted by the orchestrator.
pub struct HttpServer {
    name: String,
    bind_address: String,
    router: Router,
    shutdown: CancellationToken,
    state: watch::Sender<ServeState>,
}

impl HttpServer {
    /// Create a server serving `routes` on `bind_address`.
    pub fn new(bind_address: impl Into<String>, routes: Router) -> Self {
        Self::with_timeout(bind_address, routes, Duration::from_secs(30))
    }

    /// Create a server with an explicit per-request timeout.
    pub fn with_timeout(bind_address: impl Into<String>, routes: Router, request_timeout: Duration) -> Self {
        let (state, _) = watch::channel(ServeState::Idle);
        Self {
            name: "http".to_string(),
            bind_address: bind_address.into(),
            router: Self::build_router(routes, request_timeout),
            shutdown: CancellationToken::new(),
            state,
        }
    }

    /// Create a server from the `[http]` config section.
    pub fn from_config(config: &HttpConfig, routes: Router) -> Self {
        Self::with_timeout(
            config.bind_address.clone(),
            routes,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Override the name used in logs and errors.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(routes: Router, request_timeout: Duration) -> Router {
        routes
            .route("/health", get(health_handler))
            .layer(TimeoutLayer::new(request_timeout))
            .layer(TraceLayer::new_for_http())
    }

    /// Wait until the listener is bound.
    ///
    /// Returns `None` if the server stopped (or failed to bind) first.
    pub async fn ready(&self) -> Option<SocketAddr> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(|s| !matches!(s, ServeState::Idle))
            .await
            .ok()?;
        match *state {
            ServeState::Running(addr) => Some(addr),
            _ => None,
        }
    }
}

#[async_trait]
impl Server for HttpServer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, cancel: CancellationToken) -> Result<(), ServerError> {
        let listener = match TcpListener::bind(&self.bind_address).await {
            Ok(listener) => listener,
            Err(e) => {
                self.state.send_replace(ServeState::Stopped);
                return Err(ServerError::Io(e));
            }
        };
        let local_addr = listener.local_addr()?;
        self.state.send_replace(ServeState::Running(local_addr));

        tracing::info!(
            server = %self.name,
            address = %local_addr,
            "HTTP server starting"
        );

        let shutdown = self.shutdown.clone();
        let result = axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = shutdown.cancelled() => {}
                }
            })
            .await;

        self.state.send_replace(ServeState::Stopped);
        result?;

        tracing::info!(server = %self.name, "HTTP server stopped");
        Ok(())
    }

    async fn stop(&self) -> Result<(), ServerError> {
        self.shutdown.cancel();

        let mut rx = self.state.subscribe();
        let idle = *rx.borrow() == ServeState::Idle;
        if idle {
            return Ok(());
        }
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|s| *s == ServeState::Stopped).await;
        Ok(())
    }

    fn address(&self) -> String {
        match *self.state.borrow() {
            ServeState::Running(addr) => addr.to_string(),
            _ => self.bind_address.clone(),
        }
    }

    fn protocol(&self) -> Protocol {
        Protocol::Http
    }
}

async fn health_handler() -> &'static str {
    "ok"
}
