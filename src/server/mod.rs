//! Hosted server capability.
//!
//! # Data Flow
//! ```text
//! App::run
//!     → starter task: Server::start(run token)   (blocks while serving)
//!     → stopper task: waits for cancellation → Server::stop() under deadline
//! ```
//!
//! # Design Decisions
//! - Servers own their protocol and listener; the orchestrator only drives
//!   start and stop
//! - `start` receives the group token so a server may also exit on its own
//!   when the group is cancelled
//! - The stop deadline is enforced by the caller; a server that overruns it
//!   is dropped mid-drain and reported as a stop timeout

pub mod http;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::ServerError;

pub use http::HttpServer;

/// Scheme used when an RPC server has no fixed endpoint of its own.
pub const RPC_SCHEME: &str = "grpc";

/// Transport spoken by a hosted server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http,
    Rpc,
}

/// A network server whose lifecycle is driven by the orchestrator.
#[async_trait]
pub trait Server: Send + Sync + 'static {
    /// Name used in logs, metrics and errors.
    fn name(&self) -> &str;

    /// Serve until stopped or failed.
    ///
    /// Returning `Ok(())` means the server shut down cleanly.
    async fn start(&self, cancel: CancellationToken) -> Result<(), ServerError>;

    /// Gracefully stop serving.
    async fn stop(&self) -> Result<(), ServerError>;

    /// Listen address, e.g. `127.0.0.1:9000`.
    fn address(&self) -> String;

    /// Advertised endpoint, if the server knows one.
    fn endpoint(&self) -> Option<Url> {
        None
    }

    fn protocol(&self) -> Protocol {
        Protocol::Http
    }
}
