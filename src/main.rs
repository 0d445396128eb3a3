//! Lifecycle host
//!
//! Hosts an HTTP server under the lifecycle orchestrator.
//!
//! ```text
//! config.toml → AppConfig → AppBuilder ─┬─ HttpServer
//!                                        └─ InMemoryRegistry (optional)
//!                                               │
//!                                           App::run ── SIGTERM/SIGINT/SIGQUIT → App::stop
//! ```

use axum::Router;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use lifecycle_host::config::{load_config, AppConfig};
use lifecycle_host::observability::{logging, metrics};
use lifecycle_host::{AppBuilder, HttpServer, InMemoryRegistry};

#[derive(Parser)]
#[command(name = "lifecycle-host")]
#[command(about = "Run servers under the lifecycle orchestrator", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the service instance as JSON and exit.
    #[arg(long)]
    print_instance: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        name = %config.name,
        http_enabled = config.http.enabled,
        registry_enabled = config.registry.enabled,
        stop_timeout_secs = config.timeouts.stop_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let mut builder = AppBuilder::from_config(&config);
    if config.http.enabled {
        builder = builder.server(HttpServer::from_config(&config.http, Router::new()));
    }
    if config.registry.enabled {
        builder = builder.registrar_arc(Arc::new(InMemoryRegistry::new()));
    }
    let app = builder.build()?;

    if cli.print_instance {
        println!("{}", serde_json::to_string_pretty(&app.build_instance())?);
        return Ok(());
    }

    if let Err(e) = app.run().await {
        // Let servers started before the failure finish stopping.
        app.finish_rollback().await;
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
