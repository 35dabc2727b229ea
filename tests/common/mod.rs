//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{
    ErrorResponse, Request as WsRequest, Response as WsResponse,
};
use tokio_tungstenite::tungstenite::Message;

use care_gateway::config::GatewayConfig;
use care_gateway::http::HttpServer;
use care_gateway::lifecycle::Shutdown;

/// A request head recorded by a mock backend.
///
/// Not every test binary uses every helper in this module, hence the
/// dead_code allowances.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl CapturedRequest {
    #[allow(dead_code)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Start a mock HTTP backend that records request heads and answers with a
/// fixed body.
#[allow(dead_code)]
pub async fn start_capture_backend(
    body: &'static str,
) -> (SocketAddr, mpsc::UnboundedReceiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                // The tests only send bodyless requests, so the head is all
                // there is to read.
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) => break,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        Err(_) => return,
                    }
                }
                if let Some(captured) = parse_head(&buf) {
                    let _ = tx.send(captured);
                }
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, rx)
}

#[allow(dead_code)]
fn parse_head(raw: &[u8]) -> Option<CapturedRequest> {
    let head = std::str::from_utf8(raw).ok()?;
    let mut lines = head.split("\r\n");

    let request_line = lines.next()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = Vec::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    Some(CapturedRequest {
        method,
        path,
        headers,
    })
}

/// Start a mock chat backend speaking WebSocket.
///
/// After each handshake it sends one text frame
/// `path=<path-and-query>;authorization=<value-or-none>` so tests can
/// assert what the gateway forwarded, then echoes every data frame.
/// The returned counter tracks accepted TCP connections.
#[allow(dead_code)]
pub async fn start_chat_backend() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = connections.clone();

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut path = String::new();
                let mut authorization = String::from("none");

                let callback = |req: &WsRequest,
                                resp: WsResponse|
                 -> Result<WsResponse, ErrorResponse> {
                    path = req
                        .uri()
                        .path_and_query()
                        .map(|pq| pq.to_string())
                        .unwrap_or_default();
                    if let Some(value) = req
                        .headers()
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                    {
                        authorization = value.to_string();
                    }
                    Ok(resp)
                };

                let Ok(mut ws) = tokio_tungstenite::accept_hdr_async(socket, callback).await
                else {
                    return;
                };

                let greeting = format!("path={};authorization={}", path, authorization);
                if ws.send(Message::text(greeting)).await.is_err() {
                    return;
                }

                while let Some(Ok(frame)) = ws.next().await {
                    if frame.is_close() {
                        break;
                    }
                    if frame.is_text() || frame.is_binary() {
                        if ws.send(frame).await.is_err() {
                            break;
                        }
                    }
                }
            });
        }
    });

    (addr, connections)
}

/// Start the gateway on an ephemeral port with the default API routes.
#[allow(dead_code)]
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    start_gateway_with_api(config, care_gateway::http::default_api_routes()).await
}

/// Start the gateway on an ephemeral port with the given API route table.
pub async fn start_gateway_with_api(
    config: GatewayConfig,
    api_routes: Router,
) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let server = HttpServer::with_api_routes(config, api_routes).unwrap();

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    // Give the acceptor a moment to come up.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    (addr, shutdown)
}

/// Base config pointing the backend at `backend_addr`.
pub fn base_config(backend_addr: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.backend.url = format!("http://{}", backend_addr);
    config
}
