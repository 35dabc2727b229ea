//! Configuration validation.
//!
//! Semantic checks on top of what Serde already guarantees syntactically.
//! Validation is a pure function over the config and returns every problem
//! found, not just the first, so a misconfigured deployment can be fixed in
//! one pass.

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a valid socket address")]
    BindAddress(String),

    #[error("{field} '{url}' is not a valid URL: {reason}")]
    TargetUrl {
        field: &'static str,
        url: String,
        reason: String,
    },

    #[error("{field} '{url}' must use the http scheme")]
    TargetScheme { field: &'static str, url: String },

    #[error("{field} '{value}' must start with '/'")]
    PathPrefix { field: &'static str, value: String },

    #[error("chat.public_prefix and chat.internal_prefix must differ")]
    IdenticalChatPrefixes,

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("observability.metrics_address '{0}' is not a valid socket address")]
    MetricsAddress(String),
}

/// Validate the configuration, collecting all errors.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    check_target(&mut errors, "backend.url", &config.backend.url);
    check_target(
        &mut errors,
        "frontend.dev_server_url",
        &config.frontend.dev_server_url,
    );

    check_prefix(&mut errors, "api.prefix", &config.api.prefix);
    check_prefix(&mut errors, "chat.public_prefix", &config.chat.public_prefix);
    check_prefix(
        &mut errors,
        "chat.internal_prefix",
        &config.chat.internal_prefix,
    );
    check_prefix(&mut errors, "chat.http_prefix", &config.chat.http_prefix);

    if config.chat.public_prefix == config.chat.internal_prefix {
        errors.push(ValidationError::IdenticalChatPrefixes);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_target(errors: &mut Vec<ValidationError>, field: &'static str, raw: &str) {
    match Url::parse(raw) {
        Ok(url) => {
            // The outbound client speaks plain HTTP; TLS termination is out of scope.
            if url.scheme() != "http" {
                errors.push(ValidationError::TargetScheme {
                    field,
                    url: raw.to_string(),
                });
            }
        }
        Err(e) => errors.push(ValidationError::TargetUrl {
            field,
            url: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn check_prefix(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if !value.starts_with('/') {
        errors.push(ValidationError::PathPrefix {
            field,
            value: value.to_string(),
        });
    }
}
