//! Route tagging for distributed tracing.
//!
//! # Responsibilities
//! - Create one span per application request carrying the route pattern
//!
//! # Design Decisions
//! - Spans only annotate; they never influence dispatch
//! - The pattern is the registration pattern, not the raw path, to keep
//!   cardinality bounded

use tracing::Span;

/// Span wrapping a handler registered under `pattern`.
pub fn route_span(pattern: &str) -> Span {
    tracing::info_span!("route", http.route = %pattern)
}
