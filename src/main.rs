//! care-gateway
//!
//! Single entry point for browser traffic of a patient-facing healthcare
//! web application.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                 CARE GATEWAY                  │
//!                      │                                               │
//!  Browser request     │  ┌──────────────┐     ┌─────────────────┐    │
//!  ────────────────────┼─▶│   upgrade    │────▶│  chat WebSocket │────┼──▶ Backend
//!                      │  │  dispatcher  │     │  relay (bearer  │    │    (ws)
//!                      │  └──────┬───────┘     │  from cookie)   │    │
//!                      │         │ not an      └─────────────────┘    │
//!                      │         ▼ upgrade                            │
//!                      │  ┌──────────────┐                            │
//!                      │  │ route table  │  /api/**  → app routes     │
//!                      │  │              │  /chat/** → backend proxy ─┼──▶ Backend
//!                      │  │              │  *        → SPA / dev ─────┼──▶ Dev server
//!                      │  └──────────────┘             proxy          │    (dev only)
//!                      │                                               │
//!                      │  config · logging · metrics · lifecycle       │
//!                      └──────────────────────────────────────────────┘
//! ```

use tokio::net::TcpListener;

use care_gateway::config;
use care_gateway::http::HttpServer;
use care_gateway::lifecycle::{signals, Shutdown};
use care_gateway::observability::{logging, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_config()?;

    logging::init(&config.observability);

    tracing::info!(
        environment = %config.environment,
        bind_address = %config.listener.bind_address,
        backend = %config.backend.url,
        "care-gateway starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    signals::spawn_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
