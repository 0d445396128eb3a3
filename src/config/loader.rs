//! Configuration loading from disk.

use std::path::Path;
use std::fs;
use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Signal;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            id = "node-1"
            name = "orders"
            endpoints = ["http://10.0.0.7:8000"]
            signals = ["SIGTERM", "SIGHUP"]

            [timeouts]
            registrar_secs = 3
            stop_secs = 5

            [http]
            bind_address = "127.0.0.1:8000"

            [registry]
            enabled = true
            "#,
        )
        .unwrap();

        assert_eq!(config.id.as_deref(), Some("node-1"));
        assert_eq!(config.name, "orders");
        assert_eq!(config.signals, vec![Signal::Terminate, Signal::Hangup]);
        assert_eq!(config.timeouts.registrar_secs, 3);
        assert_eq!(config.timeouts.stop_secs, 5);
        assert!(config.registry.enabled);
        assert_eq!(config.http.request_timeout_secs, 30);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse_config("name = \"svc\"").unwrap();
        assert_eq!(config.signals, Signal::DEFAULT.to_vec());
        assert_eq!(config.timeouts.stop_secs, 10);
        assert!(config.id.is_none());
    }

    #[test]
    fn test_unknown_signal_is_parse_error() {
        let err = parse_config("signals = [\"SIGKILL\"]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_semantic_errors_are_collected() {
        let err = parse_config("name = \"\"\nendpoints = [\"bad\"]").unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_validation_error_lists_every_field() {
        let err = parse_config("name = \"\"\nendpoints = [\"bad\"]").unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Validation failed: "), "{}", message);
        assert!(message.contains("name: must not be empty, endpoints[0]: "), "{}", message);
    }
}
