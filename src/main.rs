//! Resource engine server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (request id, trace, timeout, security headers)
//!                         │
//!                         ▼
//!                     engine::DecisionEngine ──▶ negotiation (Accept → media type)
//!                         │                 ──▶ conditional (If-* → 304/412)
//!                         ▼
//!                     resource::ResourceDescriptor (predicates, actions, renderers)
//!                         │
//!                         ▼
//!                     store::ResourceStore (per-id transactions, tombstones)
//!     Client Response
//!     ◀────────────── http::response::Outcome
//! ```
//!
//! Startup order: config, logging, metrics, store, listener, server.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use resource_engine::config::{load_config, validate_config, ServiceConfig};
use resource_engine::lifecycle::{shutdown_signal, Shutdown};
use resource_engine::observability::{logging, metrics};
use resource_engine::{HttpServer, ResourceStore};

#[derive(Parser)]
#[command(name = "resource-engine")]
#[command(about = "HTTP resources evaluated through a decision graph", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(|errors| {
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        })?;
    }

    logging::init(&config.observability);
    tracing::info!("resource-engine v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        id_strategy = ?config.store.id_strategy,
        decision_trace = config.observability.decision_trace,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = ResourceStore::new(config.store.id_strategy);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config, store)?;
    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
