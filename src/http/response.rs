//! Plain-text responses for dispatcher-owned endpoints.
//!
//! # Design Decisions
//! - Reserved endpoints answer `text/plain` with an explicit status
//! - No content negotiation

use axum::http::header::{HeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::health::ProbeOutcome;

/// Build a plain-text response.
pub fn respond_internal(body: impl Into<String>, status: StatusCode) -> Response {
    (
        status,
        [(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
        body.into(),
    )
        .into_response()
}

impl IntoResponse for ProbeOutcome {
    fn into_response(self) -> Response {
        respond_internal(self.body, self.status)
    }
}
