//! Upgrade route matching.
//!
//! # Responsibilities
//! - Match upgrade request paths against the chat prefixes
//! - Rewrite the public prefix to the backend-internal prefix
//! - Preserve the path remainder and query string
//!
//! # Design Decisions
//! - Prefix matching only, no regex; deterministic and O(path length)
//! - The public prefix is checked first so nesting the internal prefix
//!   under `/api` keeps working if the prefixes are reconfigured
//! - No match is an explicit `None`; the caller refuses the handshake

use axum::http::Uri;

use crate::config::ChatConfig;

/// Which upgrade proxy configuration was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeRoute {
    /// Public prefix, rewritten to the backend-internal prefix.
    Rewrite,
    /// Internal prefix, forwarded unchanged.
    PassThrough,
}

impl UpgradeRoute {
    pub fn as_str(self) -> &'static str {
        match self {
            UpgradeRoute::Rewrite => "rewrite",
            UpgradeRoute::PassThrough => "passthrough",
        }
    }
}

/// A matched upgrade route with the effective backend path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeTarget {
    pub route: UpgradeRoute,
    /// Path and query to dial on the backend.
    pub backend_path: String,
}

/// Match an upgrade request URI against the configured chat prefixes.
///
/// Returns `None` when neither prefix matches; the upgrade must then be
/// refused without touching any proxy.
pub fn match_upgrade(uri: &Uri, chat: &ChatConfig) -> Option<UpgradeTarget> {
    let path = uri.path();

    let (route, rewritten) = if let Some(rest) = path.strip_prefix(chat.public_prefix.as_str()) {
        (
            UpgradeRoute::Rewrite,
            format!("{}{}", chat.internal_prefix, rest),
        )
    } else if path.starts_with(chat.internal_prefix.as_str()) {
        (UpgradeRoute::PassThrough, path.to_string())
    } else {
        return None;
    };

    let backend_path = match uri.query() {
        Some(query) => format!("{}?{}", rewritten, query),
        None => rewritten,
    };

    Some(UpgradeTarget {
        route,
        backend_path,
    })
}
