//! Readiness and liveness evaluation.
//!
//! # Responsibilities
//! - Readiness: run every check, build the plain-text report, update the
//!   failure counter
//! - Liveness: read the failure counter and apply the cascade rule
//!
//! # Design Decisions
//! - Liveness never runs checks and never mutates the counter
//! - Report lines are joined with `\n`, no trailing newline
//! - An empty registry reports the literal `OK`

use axum::http::StatusCode;

use crate::health::registry::{CheckReport, Registry};
use crate::health::state::FailureCounter;
use crate::observability::metrics;

/// Liveness body once the cascade threshold is exceeded.
pub const CASCADED: &str = "CASCADED";

/// Result of a probe, ready to be written as a plain-text response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub status: StatusCode,
    pub body: String,
}

impl ProbeOutcome {
    fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.into(),
        }
    }

    fn failed(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: body.into(),
        }
    }
}

/// Render check reports as `"<name>: OK"` / `"<name>: <error>"` lines.
pub fn render_report(reports: &[CheckReport]) -> String {
    if reports.is_empty() {
        return "OK".to_string();
    }
    reports
        .iter()
        .map(|r| match &r.result {
            Ok(()) => format!("{}: OK", r.name),
            Err(e) => format!("{}: {}", r.name, e),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run all checks and record the outcome on `failures`.
pub async fn readiness(registry: &Registry, failures: &FailureCounter) -> ProbeOutcome {
    let reports = registry.check().await;
    let passed = reports.iter().all(CheckReport::passed);
    let body = render_report(&reports);

    let consecutive = failures.record(passed);
    metrics::record_readiness(consecutive);

    if passed {
        ProbeOutcome::ok(body)
    } else {
        tracing::warn!(consecutive_failures = consecutive, "Readiness check failed");
        ProbeOutcome::failed(body)
    }
}

/// Apply the cascade rule to the current failure count.
pub fn liveness(failures: &FailureCounter, readiness_cascade: u32) -> ProbeOutcome {
    if failures.is_cascaded(readiness_cascade) {
        tracing::error!(
            consecutive_failures = failures.current(),
            readiness_cascade,
            "Readiness failures cascaded to liveness"
        );
        metrics::record_cascaded();
        ProbeOutcome::failed(CASCADED)
    } else {
        ProbeOutcome::ok("OK")
    }
}
