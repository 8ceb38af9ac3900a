//! Metrics collection and exposition.
//!
//! # Metrics
//! - `portal_requests_total` (counter): total requests by method, status
//! - `portal_request_duration_seconds` (histogram): latency distribution
//! - `portal_rate_limited_total` (counter): requests rejected with 429
//! - `portal_rate_limit_buckets` (gauge): client keys tracked by the limiter
//! - `portal_cache_hits_total` / `portal_cache_misses_total` (counter): per cache region
//! - `portal_shipments_created_total` (counter)
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, which keeps tests free of setup
//! - The Prometheus exporter runs its own listener, separate from the API

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed HTTP request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    counter!("portal_requests_total", &labels).increment(1);
    histogram!("portal_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

/// Record a request rejected by the rate limiter.
pub fn record_rate_limited() {
    counter!("portal_rate_limited_total").increment(1);
}

/// Record the number of client keys the limiter holds buckets for.
pub fn record_bucket_count(count: usize) {
    gauge!("portal_rate_limit_buckets").set(count as f64);
}

/// Record a cache lookup in `region`.
pub fn record_cache_lookup(region: &'static str, hit: bool) {
    if hit {
        counter!("portal_cache_hits_total", "region" => region).increment(1);
    } else {
        counter!("portal_cache_misses_total", "region" => region).increment(1);
    }
}

/// Record a successfully created shipment.
pub fn record_shipment_created() {
    counter!("portal_shipments_created_total").increment(1);
}
