//! WebSocket upgrade dispatch and frame relay.
//!
//! # Responsibilities
//! - Detect WebSocket upgrade requests ahead of the HTTP route table
//! - Select the rewriting or pass-through upgrade route by path prefix
//! - Inject the bearer token from the session cookie into the backend
//!   handshake (browsers cannot set headers on an upgrade request)
//! - Complete the client handshake and relay frames bidirectionally
//!
//! # Data Flow
//! ```text
//! Client ←── WebSocket frames ──→ Gateway ←── WebSocket frames ──→ Backend
//! ```
//!
//! # Design Decisions
//! - Upgrades bypass the HTTP middleware stack; the dispatcher is the
//!   outermost routing decision
//! - Frame-level forwarding, no message buffering
//! - Close frames and ping/pong propagate transparently
//! - An unmatched upgrade is refused before any proxy is involved

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::derive_accept_key;
use tokio_tungstenite::tungstenite::protocol::Role;
use tokio_tungstenite::WebSocketStream;

use crate::auth::cookie::bearer_token_from_headers;
use crate::http::server::AppState;
use crate::http::GatewayError;
use crate::observability::metrics;
use crate::routing::{match_upgrade, UpgradeTarget};

type UpstreamRequest = tokio_tungstenite::tungstenite::handshake::client::Request;

/// Returns true for a WebSocket upgrade handshake.
pub fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    let connection_upgrades = headers
        .get(header::CONNECTION)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            v.split(',')
                .any(|token| token.trim().eq_ignore_ascii_case("upgrade"))
        })
        .unwrap_or(false);

    let upgrade_is_websocket = headers
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("websocket"))
        .unwrap_or(false);

    connection_upgrades && upgrade_is_websocket
}

/// Middleware that intercepts WebSocket upgrades before the route table.
///
/// Non-upgrade requests pass through untouched. Upgrades either match a
/// chat route and are proxied, or are refused without a 101 — the idiomatic
/// equivalent of destroying the raw socket.
pub async fn upgrade_dispatch(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if !is_websocket_upgrade(req.headers()) {
        return next.run(req).await;
    }

    let Some(target) = match_upgrade(req.uri(), &state.config.chat) else {
        tracing::debug!(path = %req.uri().path(), "upgrade matched no chat route, refusing");
        return StatusCode::NOT_FOUND.into_response();
    };

    match proxy_upgrade(&state, req, target) {
        Ok(response) => response,
        Err(GatewayError::Handshake(reason)) => {
            tracing::warn!(reason, "rejecting malformed websocket handshake");
            StatusCode::BAD_REQUEST.into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "websocket upgrade failed");
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

/// Answer the client handshake and hand the socket to a relay task.
fn proxy_upgrade(
    state: &AppState,
    req: Request,
    target: UpgradeTarget,
) -> Result<Response, GatewayError> {
    let key = req
        .headers()
        .get(header::SEC_WEBSOCKET_KEY)
        .and_then(|v| v.to_str().ok())
        .ok_or(GatewayError::Handshake("missing Sec-WebSocket-Key"))?;
    let accept_key = derive_accept_key(key.as_bytes());

    let token = bearer_token_from_headers(req.headers());
    let ws_url = state.backend.ws_url(&target.backend_path);
    let mut upstream_req: UpstreamRequest = ws_url.as_str().into_client_request()?;

    if let Some(token) = token.as_deref() {
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(value) => {
                upstream_req
                    .headers_mut()
                    .insert(header::AUTHORIZATION, value);
            }
            Err(_) => {
                // Same policy as the HTTP path: forward unauthenticated.
                tracing::debug!("session cookie value unusable as header, skipping auth injection");
            }
        }
    }

    let route = target.route.as_str();
    let on_upgrade = hyper::upgrade::on(req);
    tokio::spawn(run_relay(on_upgrade, upstream_req, route));

    metrics::record_upgrade(route);
    tracing::debug!(
        route,
        authenticated = token.is_some(),
        "websocket upgrade dispatched"
    );

    Ok(Response::builder()
        .status(StatusCode::SWITCHING_PROTOCOLS)
        .header(header::UPGRADE, "websocket")
        .header(header::CONNECTION, "Upgrade")
        .header(header::SEC_WEBSOCKET_ACCEPT, accept_key)
        .body(Body::empty())
        .unwrap())
}

/// Finish the client upgrade, connect to the backend, and relay until
/// either side closes.
async fn run_relay(
    on_upgrade: hyper::upgrade::OnUpgrade,
    upstream_req: UpstreamRequest,
    route: &'static str,
) {
    let upgraded = match on_upgrade.await {
        Ok(upgraded) => upgraded,
        Err(err) => {
            tracing::error!(route, error = %err, "client upgrade failed");
            return;
        }
    };

    // hyper's Upgraded doesn't implement tokio's AsyncRead/AsyncWrite
    // directly; wrap it with TokioIo.
    let client =
        WebSocketStream::from_raw_socket(TokioIo::new(upgraded), Role::Server, None).await;

    let upstream = match tokio_tungstenite::connect_async(upstream_req).await {
        Ok((stream, _response)) => stream,
        Err(err) => {
            tracing::error!(route, error = %err, "backend websocket connect failed");
            close(client).await;
            return;
        }
    };

    tracing::debug!(route, "websocket relay established");
    relay(client, upstream).await;
    tracing::debug!(route, "websocket relay closed");
}

async fn close<S>(mut ws: WebSocketStream<S>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let _ = ws.close(None).await;
}

/// Bidirectional frame relay. When one direction ends, the counterpart
/// sink is closed so the other direction unwinds too.
async fn relay<C, U>(client: WebSocketStream<C>, upstream: WebSocketStream<U>)
where
    C: AsyncRead + AsyncWrite + Unpin,
    U: AsyncRead + AsyncWrite + Unpin,
{
    let (mut client_sink, mut client_stream) = client.split();
    let (mut upstream_sink, mut upstream_stream) = upstream.split();

    let client_to_upstream = async {
        while let Some(frame) = client_stream.next().await {
            let Ok(frame) = frame else { break };
            if upstream_sink.send(frame).await.is_err() {
                break;
            }
        }
        let _ = upstream_sink.close().await;
    };

    let upstream_to_client = async {
        while let Some(frame) = upstream_stream.next().await {
            let Ok(frame) = frame else { break };
            if client_sink.send(frame).await.is_err() {
                break;
            }
        }
        let _ = client_sink.close().await;
    };

    tokio::join!(client_to_upstream, upstream_to_client);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn detects_upgrade_handshake() {
        let h = headers(&[("connection", "Upgrade"), ("upgrade", "websocket")]);
        assert!(is_websocket_upgrade(&h));
    }

    #[test]
    fn connection_header_may_list_multiple_tokens() {
        let h = headers(&[("connection", "keep-alive, Upgrade"), ("upgrade", "websocket")]);
        assert!(is_websocket_upgrade(&h));
    }

    #[test]
    fn case_is_ignored() {
        let h = headers(&[("connection", "upgrade"), ("upgrade", "WebSocket")]);
        assert!(is_websocket_upgrade(&h));
    }

    #[test]
    fn plain_requests_are_not_upgrades() {
        assert!(!is_websocket_upgrade(&HeaderMap::new()));

        let h = headers(&[("connection", "keep-alive")]);
        assert!(!is_websocket_upgrade(&h));

        let h = headers(&[("upgrade", "websocket")]);
        assert!(!is_websocket_upgrade(&h));

        let h = headers(&[("connection", "Upgrade"), ("upgrade", "h2c")]);
        assert!(!is_websocket_upgrade(&h));
    }
}
