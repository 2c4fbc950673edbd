//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define dispatcher metrics
//! - Install the Prometheus recorder once per process
//! - Render the exposition text for the metrics endpoint
//!
//! # Metrics
//! - `dispatch_requests_total` (counter): requests by destination
//! - `readiness_consecutive_failures` (gauge): failure counter after each readiness probe
//! - `liveness_cascaded_total` (counter): liveness probes answered CASCADED
//! - `admission_permits_available` (gauge): free admission permits by gate
//! - `admission_timeouts_total` (counter): requests rejected after a bounded wait
//! - `app_requests_total` (counter): application requests by route, status
//! - `app_request_duration_seconds` (histogram): application latency by route
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; a no-op without a recorder
//! - Installing twice returns the first handle

use std::sync::OnceLock;
use std::time::Instant;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus recorder, or return the one already installed.
///
/// When some other recorder owns the global slot, a detached handle is
/// returned and the exposition stays empty.
pub fn install() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                tracing::debug!("Prometheus recorder installed");
                handle
            }
            Err(e) => {
                tracing::warn!(error = %e, "Global metrics recorder unavailable");
                PrometheusBuilder::new().build_recorder().handle()
            }
        })
        .clone()
}

pub fn record_dispatch(destination: &'static str) {
    metrics::counter!("dispatch_requests_total", "destination" => destination).increment(1);
}

pub fn record_readiness(consecutive_failures: i64) {
    metrics::gauge!("readiness_consecutive_failures").set(consecutive_failures as f64);
}

pub fn record_cascaded() {
    metrics::counter!("liveness_cascaded_total").increment(1);
}

pub fn set_permits_available(gate: usize, available: usize) {
    metrics::gauge!("admission_permits_available", "gate" => gate.to_string())
        .set(available as f64);
}

pub fn record_admission_timeout() {
    metrics::counter!("admission_timeouts_total").increment(1);
}

/// Record a completed application request.
pub fn record_app_request(route: &str, status: u16, start: Instant) {
    metrics::counter!(
        "app_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("app_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}
