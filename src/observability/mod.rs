//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher and handlers produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!     → tracing.rs (route spans)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Diagnostic endpoints (profiling.rs, under /debug/)
//! ```
//!
//! # Design Decisions
//! - Metrics are cheap (atomic increments behind the `metrics` facade)
//! - Route spans carry the registration pattern, not the raw path

pub mod logging;
pub mod metrics;
pub mod profiling;
pub mod tracing;
