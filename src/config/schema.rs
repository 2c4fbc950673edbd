//! Configuration schema definitions.
//!
//! This module defines the configuration structure for the dispatcher and the
//! demo host. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Default path answering readiness probes.
pub const DEFAULT_READINESS_PATH: &str = "/debug/ready";

/// Default path answering liveness probes.
pub const DEFAULT_LIVENESS_PATH: &str = "/debug/alive";

/// Default path exposing Prometheus metrics.
pub const DEFAULT_METRICS_PATH: &str = "/debug/metrics";

/// Root configuration for the host process.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Dispatcher options.
    pub dispatcher: Options,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            bind_address: "0.0.0.0:8080".to_string(),
            dispatcher: Options::default(),
        }
    }
}

/// Immutable dispatcher options.
///
/// Built once from [`Options::default`] and then overridden by option functions
/// (see [`crate::config::options`]) in the order they were supplied.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Options {
    /// Maximum application requests executing at once. `0` disables the gate.
    pub concurrency: usize,

    /// Consecutive readiness failures tolerated before liveness fails.
    /// `0` disables the cascade.
    pub readiness_cascade: u32,

    /// Path answering readiness probes.
    pub readiness_path: String,

    /// Path answering liveness probes.
    pub liveness_path: String,

    /// Path exposing metrics.
    pub metrics_path: String,

    /// Upper bound on the wait for an admission permit, in milliseconds.
    /// `None` blocks until a permit frees up.
    pub admission_timeout_ms: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            concurrency: 128,
            readiness_cascade: 5,
            readiness_path: DEFAULT_READINESS_PATH.to_string(),
            liveness_path: DEFAULT_LIVENESS_PATH.to_string(),
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
            admission_timeout_ms: None,
        }
    }
}
