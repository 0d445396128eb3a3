//! Lifecycle host library
//!
//! Starts a set of network servers together, advertises the process to a
//! service registry, and tears everything down on a signal, a server failure
//! or an explicit stop.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod registry;
pub mod server;

pub use config::AppConfig;
pub use error::{AppError, BoxError, RegistryError, ServerError};
pub use lifecycle::{App, AppBuilder, Signal};
pub use registry::{InMemoryRegistry, Registrar, ServiceInstance};
pub use server::{HttpServer, Protocol, Server};
