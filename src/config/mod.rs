//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! GATEWAY_CONFIG file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs apply_env (environment variables win)
//!     → validation.rs (semantic checks, all errors collected)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no runtime reload
//! - All fields have defaults so the gateway starts with zero configuration
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ApiConfig, BackendConfig, ChatConfig, Environment, FrontendConfig, GatewayConfig,
    ListenerConfig, ObservabilityConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
