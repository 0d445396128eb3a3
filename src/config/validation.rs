//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Endpoints must be absolute URLs with a host
//! - Timeouts must be non-zero, addresses must parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::AppConfig;
use crate::registry::Endpoint;

/// A single semantic problem in a config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `timeouts.stop_secs`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.name.trim().is_empty() {
        errors.push(ValidationError::new("name", "must not be empty"));
    }

    if let Some(id) = &config.id {
        if id.trim().is_empty() {
            errors.push(ValidationError::new("id", "must not be empty when set"));
        }
    }

    for (i, raw) in config.endpoints.iter().enumerate() {
        if let Err(e) = Endpoint::parse(raw) {
            errors.push(ValidationError::new(format!("endpoints[{}]", i), e.to_string()));
        }
    }

    if config.timeouts.registrar_secs == 0 {
        errors.push(ValidationError::new("timeouts.registrar_secs", "must be greater than 0"));
    }
    if config.timeouts.stop_secs == 0 {
        errors.push(ValidationError::new("timeouts.stop_secs", "must be greater than 0"));
    }

    if config.http.enabled {
        if config.http.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new("http.bind_address", "not a socket address"));
        }
        if config.http.request_timeout_secs == 0 {
            errors.push(ValidationError::new("http.request_timeout_secs", "must be greater than 0"));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new("observability.metrics_address", "not a socket address"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
