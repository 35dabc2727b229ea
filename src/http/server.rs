//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: API route table, chat proxy, frontend fallback
//! - Wire up middleware (tracing, request ID, timeout, upgrade dispatch)
//! - Serve with graceful shutdown
//!
//! The route table, per request class:
//! - `/api/**` → injected application routes; unmatched → structured 404
//! - `/chat/**` → backend HTTP proxy with auth-cookie forwarding
//! - everything else → static SPA fallback (production) or dev-server
//!   proxy (development)
//!
//! WebSocket upgrades never reach this table; the upgrade dispatcher
//! intercepts them first (see `http::websocket`).

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{OriginalUri, Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::Response;
use axum::routing::{any, get};
use axum::{middleware, Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{Environment, GatewayConfig};
use crate::http::proxy::{self, HttpClient, ProxyTarget};
use crate::http::request::MakeGatewayRequestId;
use crate::http::websocket;
use crate::http::GatewayError;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub client: HttpClient,
    pub backend: ProxyTarget,
    pub dev_server: ProxyTarget,
}

/// The gateway HTTP server.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server with the default application route table.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        Self::with_api_routes(config, default_api_routes())
    }

    /// Create a server with an application-provided route table, nested
    /// under the configured API prefix.
    pub fn with_api_routes(
        config: GatewayConfig,
        api_routes: Router,
    ) -> Result<Self, GatewayError> {
        let backend = ProxyTarget::from_url("backend", &config.backend.url)?;
        let dev_server = ProxyTarget::from_url("dev-server", &config.frontend.dev_server_url)?;

        let state = AppState {
            config: Arc::new(config),
            client: proxy::build_client(),
            backend,
            dev_server,
        };

        let router = build_router(&state, api_routes)?;
        Ok(Self { router })
    }

    /// Run the server until the shutdown signal fires, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "gateway listening");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("gateway stopped");
        Ok(())
    }
}

/// Default application route table: a health probe only. Deployments embed
/// their own table via [`HttpServer::with_api_routes`].
pub fn default_api_routes() -> Router {
    Router::new().route("/health", get(health))
}

fn build_router(state: &AppState, api_routes: Router) -> Result<Router, GatewayError> {
    let config = &state.config;

    let mut api = api_routes.fallback(api_not_found);
    if let Some(origin) = &config.api.cors_origin {
        api = api.layer(cors_layer(origin)?);
    }
    let api = api.layer(RequestBodyLimitLayer::new(config.api.max_body_size));

    let chat_wildcard = format!("{}/{{*rest}}", config.chat.http_prefix);
    let proxy_routes = Router::new()
        .route(&config.chat.http_prefix, any(backend_proxy))
        .route(&chat_wildcard, any(backend_proxy));

    let proxy_routes = match config.environment {
        Environment::Production => {
            let index = config.frontend.static_dir.join("index.html");
            let spa = ServeDir::new(&config.frontend.static_dir).fallback(ServeFile::new(index));
            proxy_routes.fallback_service(spa)
        }
        Environment::Development => proxy_routes.fallback(dev_server_proxy),
    };

    let router = Router::new()
        .nest(&config.api.prefix, api)
        .merge(proxy_routes.with_state(state.clone()));

    Ok(router
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.timeouts.request_secs,
        )))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            websocket::upgrade_dispatch,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeGatewayRequestId))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        ))
}

fn cors_layer(origin: &str) -> Result<CorsLayer, GatewayError> {
    let origin = origin
        .parse::<HeaderValue>()
        .map_err(|_| GatewayError::InvalidCorsOrigin(origin.to_string()))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true))
}

async fn backend_proxy(State(state): State<AppState>, req: Request) -> Response {
    proxy::forward(&state.client, &state.backend, req, true).await
}

async fn dev_server_proxy(State(state): State<AppState>, req: Request) -> Response {
    proxy::forward(&state.client, &state.dev_server, req, false).await
}

#[derive(Debug, Serialize)]
struct ApiNotFound {
    error: String,
    path: String,
    method: String,
}

/// Structured 404 for unmatched API paths. These never fall through to the
/// reverse proxy.
async fn api_not_found(
    method: Method,
    OriginalUri(uri): OriginalUri,
) -> (StatusCode, Json<ApiNotFound>) {
    metrics::record_api_not_found();
    (
        StatusCode::NOT_FOUND,
        Json(ApiNotFound {
            error: "no matching API route".to_string(),
            path: uri.path().to_string(),
            method: method.to_string(),
        }),
    )
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
