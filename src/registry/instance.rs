//! Service instance record advertised to the registry.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use url::Url;

use crate::error::AppError;
use crate::server::{Protocol, Server, RPC_SCHEME};

/// An advertised endpoint, validated as a URL when configured.
///
/// Keeps the configured text verbatim so `http://h:1` is advertised as
/// written rather than normalized to `http://h:1/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    raw: String,
}

impl Endpoint {
    /// Parse and validate an endpoint.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let url = Url::parse(raw)
            .map_err(|e| AppError::Config(format!("invalid endpoint {:?}: {}", raw, e)))?;
        if !url.has_host() {
            return Err(AppError::Config(format!("endpoint {:?} has no host", raw)));
        }
        Ok(Self {
            raw: raw.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Identity and reachable addresses of this process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceInstance {
    pub id: String,
    pub name: String,
    pub endpoints: Vec<String>,
}

impl ServiceInstance {
    /// Build the instance from configured endpoints and hosted servers.
    ///
    /// Configured endpoints come first, in order. Each RPC server then adds
    /// its own endpoint, or `grpc://<address>` when it has none.
    pub fn build(id: &str, name: &str, endpoints: &[Endpoint], servers: &[Arc<dyn Server>]) -> Self {
        let mut advertised: Vec<String> = endpoints.iter().map(|e| e.to_string()).collect();

        for server in servers.iter().filter(|s| s.protocol() == Protocol::Rpc) {
            match server.endpoint() {
                Some(url) => advertised.push(url.to_string()),
                None => advertised.push(format!("{}://{}", RPC_SCHEME, server.address())),
            }
        }

        Self {
            id: id.to_string(),
            name: name.to_string(),
            endpoints: advertised,
        }
    }
}
