//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits so a config file can be deserialized; the
//! loader then layers environment variables on top.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Deployment environment; selects SPA serving vs dev-server proxying.
    pub environment: Environment,

    /// Backend API process the gateway fronts.
    pub backend: BackendConfig,

    /// Frontend delivery: static SPA assets or the dev server.
    pub frontend: FrontendConfig,

    /// REST API surface settings.
    pub api: ApiConfig,

    /// Chat routing prefixes.
    pub chat: ChatConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            other => Err(format!(
                "unknown environment '{}' (expected 'development' or 'production')",
                other
            )),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Backend API target.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend API process.
    pub url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
        }
    }
}

/// Frontend delivery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// Dev server URL, proxied to in development.
    pub dev_server_url: String,

    /// Directory of compiled SPA assets, served in production.
    pub static_dir: PathBuf,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            dev_server_url: "http://localhost:5173".to_string(),
            static_dir: PathBuf::from("./dist"),
        }
    }
}

/// REST API surface settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Path prefix routed to the application route table.
    pub prefix: String,

    /// Allowed CORS origin for API responses, if any.
    pub cors_origin: Option<String>,

    /// Maximum request body size in bytes for API calls.
    pub max_body_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            prefix: "/api".to_string(),
            cors_origin: None,
            max_body_size: 2 * 1024 * 1024,
        }
    }
}

/// Chat routing prefixes.
///
/// The public upgrade prefix is what the browser dials; it is rewritten to
/// the internal prefix before the upgrade is forwarded. Upgrades arriving
/// directly at the internal prefix pass through unchanged.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Public upgrade prefix, rewritten before forwarding.
    pub public_prefix: String,

    /// Backend-internal upgrade prefix, forwarded as-is.
    pub internal_prefix: String,

    /// Path prefix for non-upgrade chat HTTP traffic proxied to the backend.
    pub http_prefix: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            public_prefix: "/api/chat/ws".to_string(),
            internal_prefix: "/chat/ws".to_string(),
            http_prefix: "/chat".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout for non-upgrade HTTP handling, in seconds.
    /// Upgrade relays are exempt; they live until either peer closes.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
