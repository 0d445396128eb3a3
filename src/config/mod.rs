//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → AppBuilder::from_config seeds the orchestrator
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the app runs once per process
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::AppConfig;
pub use schema::HttpConfig;
pub use schema::ObservabilityConfig;
pub use schema::RegistryConfig;
pub use schema::TimeoutConfig;
