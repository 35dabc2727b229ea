//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, route table, SPA/dev fallback)
//!     → websocket.rs (upgrade dispatch, runs before the route table)
//!     → proxy.rs (outbound forwarding, auth injection)
//!     → Send to client
//! ```

pub mod proxy;
pub mod request;
pub mod server;
pub mod websocket;

pub use request::MakeGatewayRequestId;
pub use server::{default_api_routes, AppState, HttpServer};

/// Error type for gateway construction and upgrade handling.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid proxy target '{url}': {reason}")]
    InvalidTarget { url: String, reason: String },

    #[error("invalid CORS origin '{0}'")]
    InvalidCorsOrigin(String),

    #[error("websocket handshake rejected: {0}")]
    Handshake(&'static str),

    #[error("backend websocket error: {0}")]
    Upstream(#[from] tokio_tungstenite::tungstenite::Error),
}
