//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lifecycle_servers_started_total` (counter): start calls by server
//! - `lifecycle_server_stop_duration_seconds` (histogram): stop latency by server, outcome
//! - `lifecycle_registrations_total` (counter): register/deregister calls by outcome
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Prometheus exporter is opt-in via `observability.metrics_enabled`

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_server_started(server: &str) {
    counter!("lifecycle_servers_started_total", "server" => server.to_string()).increment(1);
}

pub fn record_server_stopped(server: &str, ok: bool, elapsed: Duration) {
    let outcome = if ok { "ok" } else { "error" };
    histogram!(
        "lifecycle_server_stop_duration_seconds",
        "server" => server.to_string(),
        "outcome" => outcome
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_registry_call(operation: &'static str, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    counter!(
        "lifecycle_registrations_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}
