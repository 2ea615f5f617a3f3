//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define router metrics (navigations, latency, interceptor failures)
//! - Expose a Prometheus-compatible endpoint when enabled
//!
//! # Metrics
//! - `waypoint_navigations_total` (counter): navigations by outcome
//! - `waypoint_navigation_duration_seconds` (histogram): end-to-end latency
//! - `waypoint_interceptor_failures_total` (counter): by interceptor and kind
//! - `waypoint_routes_registered` (gauge): size of the route table
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; with no recorder
//!   installed every call is a no-op

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::navigation::Outcome;

/// Install the Prometheus exporter and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_navigation(outcome: Outcome, started: Instant) {
    metrics::counter!("waypoint_navigations_total", "outcome" => outcome.as_str()).increment(1);
    metrics::histogram!("waypoint_navigation_duration_seconds").record(started.elapsed().as_secs_f64());
}

/// `kind` is `timeout`, `fault` or `panic`.
pub fn record_interceptor_failure(interceptor: &str, kind: &'static str) {
    metrics::counter!(
        "waypoint_interceptor_failures_total",
        "interceptor" => interceptor.to_string(),
        "kind" => kind
    )
    .increment(1);
}

pub fn record_routes_registered(count: usize) {
    metrics::gauge!("waypoint_routes_registered").set(count as f64);
}
