//! Service registry integration.
//!
//! # Data Flow
//! ```text
//! App::run
//!     → instance.rs (build ServiceInstance from config + hosted servers)
//!     → Registrar::register (bounded by registrar timeout)
//!
//! App::stop
//!     → Registrar::deregister (bounded by stop timeout)
//! ```
//!
//! # Design Decisions
//! - The registrar's wire and storage format belong to the registrar
//! - Failures are returned to the caller, never retried here
//! - memory.rs provides a process-local registrar for single-node runs and tests

pub mod instance;
pub mod memory;

use async_trait::async_trait;

use crate::error::RegistryError;

pub use instance::{Endpoint, ServiceInstance};
pub use memory::InMemoryRegistry;

/// A service directory that instances advertise themselves to.
#[async_trait]
pub trait Registrar: Send + Sync + 'static {
    /// Advertise the instance.
    async fn register(&self, instance: &ServiceInstance) -> Result<(), RegistryError>;

    /// Withdraw a previously advertised instance.
    async fn deregister(&self, instance: &ServiceInstance) -> Result<(), RegistryError>;
}
