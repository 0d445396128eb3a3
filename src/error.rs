//! Error types shared by the orchestrator, servers and registrars.

use std::time::Duration;
use thiserror::Error;

/// Boxed error used by external collaborators that bring their own error types.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors reported by a hosted server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Listener could not be bound or accepted on.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation did not finish before its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Any other failure raised by the server implementation.
    #[error(transparent)]
    Other(BoxError),
}

/// Errors reported by a registrar.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registrar did not answer before the deadline.
    #[error("registry call timed out after {0:?}")]
    Timeout(Duration),

    /// The registrar refused the instance.
    #[error("registry rejected instance: {0}")]
    Rejected(String),

    /// Transport or storage failure inside the registrar.
    #[error(transparent)]
    Other(BoxError),
}

/// Errors surfaced by [`crate::lifecycle::App`].
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed configuration, caught before `run`.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The registrar rejected the instance or timed out.
    #[error("failed to register service instance: {0}")]
    Registration(#[source] RegistryError),

    /// The registrar failed to remove the instance.
    #[error("failed to deregister service instance: {0}")]
    Deregistration(#[source] RegistryError),

    /// A hosted server failed while starting or serving.
    #[error("server {server} failed: {source}")]
    Start {
        server: String,
        #[source]
        source: ServerError,
    },

    /// A hosted server failed or timed out while stopping.
    #[error("server {server} failed to stop: {source}")]
    Stop {
        server: String,
        #[source]
        source: ServerError,
    },

    /// An OS signal handler could not be installed.
    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),

    /// The run was cancelled. Reported by the termination trigger only.
    #[error("run cancelled")]
    Cancelled,

    /// `run` was invoked a second time on the same app.
    #[error("app is already running")]
    AlreadyRunning,

    /// A group task panicked or was aborted.
    #[error("task failed: {0}")]
    TaskPanicked(String),
}
