//! Patient-Facing Healthcare Gateway
//!
//! Single entry point for browser traffic of a patient-facing web
//! application: serves the REST API prefix from an injected route table,
//! reverse-proxies chat traffic (HTTP and WebSocket) to the backend with
//! session-cookie-to-bearer-token translation, and delivers the frontend
//! (static SPA in production, dev-server proxy in development).

pub mod auth;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::GatewayConfig;
pub use http::{GatewayError, HttpServer};
pub use lifecycle::Shutdown;
