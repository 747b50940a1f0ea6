//! Metrics collection and exposition.
//!
//! # Metrics
//! - `nicotrans_requests_total` (counter): handled requests by status
//! - `nicotrans_request_duration_seconds` (histogram): end-to-end latency
//! - `nicotrans_translation_chunks_total` (counter): translator calls issued
//! - `nicotrans_translation_failures_total` (counter): requests aborted by a failed chunk
//! - `nicotrans_dns_lookups_total` (counter): resolver cache hits and misses
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus recorder.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished inbound request.
pub fn record_request(status: u16, start: Instant) {
    counter!("nicotrans_requests_total", "status" => status.to_string()).increment(1);
    histogram!("nicotrans_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record the number of chunks dispatched for one request.
pub fn record_chunks(count: usize) {
    counter!("nicotrans_translation_chunks_total").increment(count as u64);
}

/// Record a request whose translation was abandoned.
pub fn record_translation_failure() {
    counter!("nicotrans_translation_failures_total").increment(1);
}

/// Record a resolver cache lookup.
pub fn record_dns_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("nicotrans_dns_lookups_total", "result" => result).increment(1);
}
