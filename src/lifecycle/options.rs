//! Orchestrator construction.

use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::lifecycle::app::App;
use crate::lifecycle::Signal;
use crate::registry::{Endpoint, Registrar};
use crate::server::Server;

/// Default budget for `Registrar::register`.
pub const DEFAULT_REGISTRAR_TIMEOUT: Duration = Duration::from_secs(10);

/// Default budget for each server stop and for deregistration.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Validated, immutable orchestrator settings.
pub(crate) struct Options {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) endpoints: Vec<Endpoint>,
    pub(crate) signals: Vec<Signal>,
    pub(crate) registrar_timeout: Duration,
    pub(crate) stop_timeout: Duration,
    pub(crate) registrar: Option<Arc<dyn Registrar>>,
    pub(crate) servers: Vec<Arc<dyn Server>>,
}

/// Builder for [`App`].
///
/// Defaults:
/// - id: a fresh random UUID
/// - signals: SIGTERM, SIGQUIT, SIGINT
/// - registrar timeout: 10s
/// - stop timeout: 10s
pub struct AppBuilder {
    id: String,
    name: String,
    endpoints: Vec<String>,
    signals: Vec<Signal>,
    registrar_timeout: Duration,
    stop_timeout: Duration,
    registrar: Option<Arc<dyn Registrar>>,
    servers: Vec<Arc<dyn Server>>,
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: String::new(),
            endpoints: Vec::new(),
            signals: Signal::DEFAULT.to_vec(),
            registrar_timeout: DEFAULT_REGISTRAR_TIMEOUT,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            registrar: None,
            servers: Vec::new(),
        }
    }
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder from a loaded config file.
    ///
    /// Servers and the registrar are not described by the file and must be
    /// added by the caller.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut builder = Self::new()
            .name(config.name.clone())
            .endpoints(config.endpoints.iter().cloned())
            .signals(config.signals.iter().copied())
            .registrar_timeout(Duration::from_secs(config.timeouts.registrar_secs))
            .stop_timeout(Duration::from_secs(config.timeouts.stop_secs));
        if let Some(id) = &config.id {
            builder = builder.id(id.clone());
        }
        builder
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add an endpoint to advertise. Validated by [`AppBuilder::build`].
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoints.push(endpoint.into());
        self
    }

    pub fn endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.endpoints.extend(endpoints.into_iter().map(Into::into));
        self
    }

    /// Replace the shutdown signal set. An empty set disables signal handling.
    pub fn signals(mut self, signals: impl IntoIterator<Item = Signal>) -> Self {
        self.signals = signals.into_iter().collect();
        self
    }

    pub fn registrar_timeout(mut self, timeout: Duration) -> Self {
        self.registrar_timeout = timeout;
        self
    }

    pub fn stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub fn registrar(self, registrar: impl Registrar) -> Self {
        self.registrar_arc(Arc::new(registrar))
    }

    /// Use a shared registrar, e.g. one the caller also queries.
    pub fn registrar_arc(mut self, registrar: Arc<dyn Registrar>) -> Self {
        self.registrar = Some(registrar);
        self
    }

    pub fn server(self, server: impl Server) -> Self {
        self.server_arc(Arc::new(server))
    }

    /// Host a shared server, e.g. one the caller also inspects.
    pub fn server_arc(mut self, server: Arc<dyn Server>) -> Self {
        self.servers.push(server);
        self
    }

    /// Validate the settings and create the app.
    pub fn build(self) -> Result<App, AppError> {
        if self.id.trim().is_empty() {
            return Err(AppError::Config("instance id must not be empty".to_string()));
        }
        if self.registrar_timeout.is_zero() {
            return Err(AppError::Config("registrar timeout must be greater than 0".to_string()));
        }
        if self.stop_timeout.is_zero() {
            return Err(AppError::Config("stop timeout must be greater than 0".to_string()));
        }

        let endpoints = self
            .endpoints
            .iter()
            .map(|raw| Endpoint::parse(raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(App::new(Options {
            id: self.id,
            name: self.name,
            endpoints,
            signals: self.signals,
            registrar_timeout: self.registrar_timeout,
            stop_timeout: self.stop_timeout,
            registrar: self.registrar,
            servers: self.servers,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Signal;

    #[test]
    fn test_defaults() {
        let app = AppBuilder::new().name("svc").build().unwrap();
        assert!(Uuid::parse_str(app.id()).is_ok());
        assert_eq!(app.signals(), &Signal::DEFAULT);
        assert_eq!(app.stop_timeout(), DEFAULT_STOP_TIMEOUT);
        assert_eq!(app.registrar_timeout(), DEFAULT_REGISTRAR_TIMEOUT);
    }

    #[test]
    fn test_ids_are_unique_per_builder() {
        let a = AppBuilder::new().build().unwrap();
        let b = AppBuilder::new().build().unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_malformed_endpoint_rejected_at_build() {
        let result = AppBuilder::new().endpoint("http://ok:1").endpoint("::nope").build();
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = AppBuilder::new().stop_timeout(Duration::ZERO).build();
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_from_config() {
        let mut config = AppConfig::default();
        config.id = Some("node-7".into());
        config.name = "orders".into();
        config.endpoints = vec!["http://10.0.0.7:8000".into()];
        config.signals = vec![Signal::Hangup];
        config.timeouts.stop_secs = 3;

        let app = AppBuilder::from_config(&config).build().unwrap();
        assert_eq!(app.id(), "node-7");
        assert_eq!(app.name(), "orders");
        assert_eq!(app.signals(), &[Signal::Hangup]);
        assert_eq!(app.stop_timeout(), Duration::from_secs(3));
        assert_eq!(app.build_instance().endpoints, vec!["http://10.0.0.7:8000"]);
    }
}
