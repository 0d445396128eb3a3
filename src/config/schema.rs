//! Configuration schema definitions.
//!
//! This module defines the configuration structure for the host process.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::lifecycle::Signal;

/// Root configuration for the host process.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Instance id. A random UUID is generated when unset.
    pub id: Option<String>,

    /// Logical service name advertised to the registry.
    pub name: String,

    /// Extra endpoints to advertise (e.g., "http://10.0.0.7:8000").
    pub endpoints: Vec<String>,

    /// Signals that trigger graceful shutdown.
    pub signals: Vec<Signal>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Hosted HTTP server.
    pub http: HttpConfig,

    /// Registry settings.
    pub registry: RegistryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            id: None,
            name: "lifecycle-host".to_string(),
            endpoints: Vec::new(),
            signals: Signal::DEFAULT.to_vec(),
            timeouts: TimeoutConfig::default(),
            http: HttpConfig::default(),
            registry: RegistryConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Lifecycle timeouts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Budget for registering the instance, in seconds.
    pub registrar_secs: u64,

    /// Budget for each server stop and for deregistration, in seconds.
    pub stop_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            registrar_secs: 10,
            stop_secs: 10,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Host an HTTP server.
    pub enabled: bool,

    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0:8000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Registry configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RegistryConfig {
    /// Register with the process-local registry.
    pub enabled: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
