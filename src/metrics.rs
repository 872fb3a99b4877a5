//! Prometheus metrics.
//!
//! Recording goes through the `metrics` facade; the Prometheus recorder is
//! installed once per process by [`init`]. Before that (or when another
//! recorder already owns the global slot) recording is a no-op.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::warn;

static PROMETHEUS: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Install the Prometheus recorder and return its render handle.
pub fn init() -> Option<PrometheusHandle> {
    PROMETHEUS
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Prometheus recorder not installed: {}", e);
                None
            }
        })
        .clone()
}

/// Count one finished request on `endpoint` ("playlist" or "segment").
pub fn record_request(endpoint: &'static str, status: u16) {
    counter!("proxy_requests_total", "endpoint" => endpoint, "status" => status.to_string())
        .increment(1);
}

pub fn record_duration(endpoint: &'static str, start: Instant) {
    histogram!("proxy_request_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_origin_error() {
    counter!("proxy_origin_errors_total").increment(1);
}

pub fn record_identity_fallback() {
    counter!("proxy_identity_fallbacks_total").increment(1);
}

pub fn record_segment_bytes(bytes: usize) {
    counter!("proxy_segment_bytes_total").increment(bytes as u64);
}
