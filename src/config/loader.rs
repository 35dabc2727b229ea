//! Configuration loading.
//!
//! The gateway is configured through environment variables, optionally
//! layered over a TOML file named by `GATEWAY_CONFIG`. The file supplies
//! defaults; the environment wins.

use std::fs;
use std::path::Path;

use crate::config::schema::{Environment, GatewayConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: {reason}")]
    Env { var: &'static str, reason: String },

    #[error("validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from the process environment, optionally seeded from
/// the TOML file named by `GATEWAY_CONFIG`.
pub fn load_config() -> Result<GatewayConfig, ConfigError> {
    let mut config = match std::env::var("GATEWAY_CONFIG") {
        Ok(path) => load_file(Path::new(&path))?,
        Err(_) => GatewayConfig::default(),
    };

    apply_env(&mut config, |var| std::env::var(var).ok())?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load and parse a TOML config file. Validation happens after env layering.
pub fn load_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Layer environment variables onto `config`.
///
/// Takes the lookup as a closure so the override logic can be tested without
/// touching process-global state.
pub fn apply_env<F>(config: &mut GatewayConfig, var: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = var("PORT") {
        let port: u16 = port.parse().map_err(|_| ConfigError::Env {
            var: "PORT",
            reason: format!("'{}' is not a valid port number", port),
        })?;
        config.listener.bind_address = format!("0.0.0.0:{}", port);
    }

    if let Some(env) = var("APP_ENV") {
        config.environment = env.parse::<Environment>().map_err(|reason| ConfigError::Env {
            var: "APP_ENV",
            reason,
        })?;
    }

    if let Some(url) = var("BACKEND_URL") {
        config.backend.url = url;
    }

    if let Some(url) = var("DEV_SERVER_URL") {
        config.frontend.dev_server_url = url;
    }

    if let Some(dir) = var("STATIC_DIR") {
        config.frontend.static_dir = dir.into();
    }

    if let Some(origin) = var("CORS_ORIGIN") {
        config.api.cors_origin = Some(origin);
    }

    if let Some(addr) = var("METRICS_ADDR") {
        config.observability.metrics_address = addr;
        config.observability.metrics_enabled = true;
    }

    Ok(())
}
