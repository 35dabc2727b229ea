//! Outbound HTTP forwarding.
//!
//! # Responsibilities
//! - Hold the parsed proxy targets (backend API, frontend dev server)
//! - Rewrite the outbound request: scheme/authority, Host header
//! - Inject `Authorization: Bearer` from the session cookie where required
//! - Strip hop-by-hop headers before forwarding
//!
//! # Design Decisions
//! - One shared, connection-pooled hyper client for all targets
//! - Proxy failures surface as 502; they are logged, never retried
//! - A malformed cookie token forwards the request unauthenticated rather
//!   than failing it; the backend owns the auth decision

use std::time::Instant;

use axum::body::Body;
use axum::extract::Request;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use url::Url;

use crate::auth::cookie::bearer_token_from_headers;
use crate::http::GatewayError;
use crate::observability::metrics;

/// Shared outbound HTTP client.
pub type HttpClient = Client<HttpConnector, Body>;

/// Build the shared outbound client.
pub fn build_client() -> HttpClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

/// A parsed forwarding target.
#[derive(Debug, Clone)]
pub struct ProxyTarget {
    label: &'static str,
    authority: Authority,
}

impl ProxyTarget {
    /// Parse a target from its configured base URL.
    pub fn from_url(label: &'static str, raw: &str) -> Result<Self, GatewayError> {
        let url = Url::parse(raw).map_err(|e| GatewayError::InvalidTarget {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        let host = url.host_str().ok_or_else(|| GatewayError::InvalidTarget {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        })?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let authority = authority
            .parse::<Authority>()
            .map_err(|e| GatewayError::InvalidTarget {
                url: raw.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { label, authority })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Absolute URI for a path-and-query on this target.
    pub fn uri_for(&self, path_and_query: PathAndQuery) -> Result<Uri, axum::http::Error> {
        Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }

    /// WebSocket URL for a path-and-query on this target.
    pub fn ws_url(&self, path_and_query: &str) -> String {
        format!("ws://{}{}", self.authority, path_and_query)
    }
}

/// Forward a request to `target`, optionally translating the session cookie
/// into a bearer header first.
pub async fn forward(
    client: &HttpClient,
    target: &ProxyTarget,
    mut req: Request,
    inject_auth: bool,
) -> Response {
    let started = Instant::now();

    if inject_auth {
        inject_bearer(req.headers_mut());
    }
    strip_hop_by_hop(req.headers_mut());

    let path_and_query = req
        .uri()
        .path_and_query()
        .cloned()
        .unwrap_or_else(|| PathAndQuery::from_static("/"));

    let uri = match target.uri_for(path_and_query) {
        Ok(uri) => uri,
        Err(err) => {
            tracing::error!(target = target.label(), error = %err, "failed to build outbound URI");
            return (StatusCode::BAD_GATEWAY, "upstream request failed").into_response();
        }
    };
    *req.uri_mut() = uri;

    // Change-origin semantics: the target sees its own authority as Host.
    if let Ok(host) = HeaderValue::from_str(target.authority().as_str()) {
        req.headers_mut().insert(header::HOST, host);
    }

    match client.request(req).await {
        Ok(response) => {
            let status = response.status();
            metrics::record_proxied_request(target.label(), status.as_u16(), started);
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(err) => {
            tracing::error!(target = target.label(), error = %err, "upstream request failed");
            metrics::record_proxied_request(
                target.label(),
                StatusCode::BAD_GATEWAY.as_u16(),
                started,
            );
            (StatusCode::BAD_GATEWAY, "upstream request failed").into_response()
        }
    }
}

/// Translate the session cookie into `Authorization: Bearer <token>`.
///
/// Absence of a usable token leaves the headers untouched.
pub fn inject_bearer(headers: &mut HeaderMap) {
    let Some(token) = bearer_token_from_headers(headers) else {
        return;
    };
    match HeaderValue::from_str(&format!("Bearer {}", token)) {
        Ok(value) => {
            headers.insert(header::AUTHORIZATION, value);
        }
        Err(_) => {
            // Not a legal header value; forward unauthenticated instead.
            tracing::debug!("session cookie value unusable as header, skipping auth injection");
        }
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    headers.remove(header::CONNECTION);
    headers.remove("keep-alive");
    headers.remove(header::PROXY_AUTHENTICATE);
    headers.remove(header::PROXY_AUTHORIZATION);
    headers.remove(header::TE);
    headers.remove(header::TRAILER);
    headers.remove(header::TRANSFER_ENCODING);
    headers.remove(header::UPGRADE);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_keeps_explicit_port() {
        let target = ProxyTarget::from_url("backend", "http://localhost:8000").unwrap();
        assert_eq!(target.authority().as_str(), "localhost:8000");
        assert_eq!(target.ws_url("/chat/ws"), "ws://localhost:8000/chat/ws");
    }

    #[test]
    fn target_without_port_uses_bare_host() {
        let target = ProxyTarget::from_url("backend", "http://backend.internal").unwrap();
        assert_eq!(target.authority().as_str(), "backend.internal");
    }

    #[test]
    fn garbage_url_is_rejected() {
        assert!(ProxyTarget::from_url("backend", "not a url").is_err());
    }

    #[test]
    fn uri_for_preserves_path_and_query() {
        let target = ProxyTarget::from_url("backend", "http://localhost:8000").unwrap();
        let uri = target
            .uri_for(PathAndQuery::from_static("/chat/history?page=2"))
            .unwrap();
        assert_eq!(uri.to_string(), "http://localhost:8000/chat/history?page=2");
    }

    #[test]
    fn inject_bearer_translates_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("authToken=abc%20def"),
        );
        inject_bearer(&mut headers);
        assert_eq!(
            headers.get(header::AUTHORIZATION).unwrap(),
            "Bearer abc def"
        );
    }

    #[test]
    fn inject_bearer_without_cookie_adds_nothing() {
        let mut headers = HeaderMap::new();
        inject_bearer(&mut headers);
        assert!(headers.get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn hop_by_hop_headers_are_stripped() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        strip_hop_by_hop(&mut headers);
        assert!(headers.get(header::CONNECTION).is_none());
        assert!(headers.get(header::TRANSFER_ENCODING).is_none());
        assert!(headers.get(header::ACCEPT).is_some());
    }
}
