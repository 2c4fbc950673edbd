//! Request identification.
//!
//! # Responsibilities
//! - Reuse the caller's `x-request-id` when present
//! - Generate a UUID v4 otherwise
//!
//! # Design Decisions
//! - Request ID is fixed when the Context is created, before any handler runs
//! - Non-UTF-8 or empty incoming IDs are replaced, never rejected

use axum::http::HeaderMap;
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID from headers, or a fresh one.
pub fn request_id_from(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
