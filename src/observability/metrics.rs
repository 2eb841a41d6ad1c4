//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define router metrics (dispatch outcomes, reloads, table size, latency)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `router_dispatch_total` (counter): requests by outcome
//!   (`proxied`, `fallthrough`, `proxy_error`)
//! - `router_reloads_total` (counter): control-plane syncs by result
//! - `router_routes` (gauge): domains in the live table
//! - `router_upstream_duration_seconds` (histogram): backend latency by domain
//!
//! # Design Decisions
//! - Recording without an installed exporter is a no-op, so tests and
//!   metrics-disabled deployments pay nothing

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_dispatch(outcome: &'static str) {
    counter!("router_dispatch_total", "outcome" => outcome).increment(1);
}

pub fn record_upstream(domain: &str, start: Instant) {
    histogram!("router_upstream_duration_seconds", "domain" => domain.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_reload(ok: bool) {
    let result = if ok { "ok" } else { "failed" };
    counter!("router_reloads_total", "result" => result).increment(1);
}

pub fn set_route_count(routes: usize) {
    gauge!("router_routes").set(routes as f64);
}
