//! Authentication forwarding.
//!
//! The gateway does not make authorization decisions. Its only job is to
//! translate the browser session cookie into a bearer header on outbound
//! proxied traffic; rejecting bad credentials is the backend's problem.

pub mod cookie;

pub use cookie::{bearer_token, bearer_token_from_headers, AUTH_COOKIE_NAME};
