//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! lifecycle (start, stop, register, deregister):
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
