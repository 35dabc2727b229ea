//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_proxied_requests_total` (counter): proxied requests by target, status
//! - `gateway_proxy_duration_seconds` (histogram): proxy latency by target
//! - `gateway_websocket_upgrades_total` (counter): dispatched upgrades by route
//! - `gateway_api_not_found_total` (counter): structured API 404s

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "metrics exporter listening"),
        Err(err) => {
            tracing::error!(address = %addr, error = %err, "failed to install metrics exporter")
        }
    }
}

pub fn record_proxied_request(target: &'static str, status: u16, started: Instant) {
    counter!(
        "gateway_proxied_requests_total",
        "target" => target,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_proxy_duration_seconds", "target" => target)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_upgrade(route: &'static str) {
    counter!("gateway_websocket_upgrades_total", "route" => route).increment(1);
}

pub fn record_api_not_found() {
    counter!("gateway_api_not_found_total").increment(1);
}
