//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (path, headers)
//!     → websocket upgrade? → upgrade.rs (prefix match, path rewrite)
//!     → otherwise the axum route table decides:
//!         /api/**  → application route table (404 fallback)
//!         /chat/** → backend HTTP proxy
//!         *        → SPA fallback (production) / dev-server proxy (development)
//! ```
//!
//! # Design Decisions
//! - Upgrade routes are evaluated before the HTTP route table
//! - Prefix matching only; deterministic, first match wins
//! - No match on an upgrade is an explicit refusal, never a silent default

pub mod upgrade;

pub use upgrade::{match_upgrade, UpgradeRoute, UpgradeTarget};
