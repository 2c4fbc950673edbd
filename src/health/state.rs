//! Readiness failure counter and the liveness cascade rule.
//!
//! # States
//! The state is the counter value itself; there is no explicit enum.
//! - `0`: last readiness evaluation passed
//! - `n > 0`: the last `n` evaluations failed
//!
//! # State Transitions
//! ```text
//! readiness all-pass    → store(0)
//! readiness any-failure → fetch_add(1)
//! liveness              → load() only; CASCADED when threshold > 0 && n > threshold
//! ```
//!
//! # Race Semantics
//! Concurrent readiness evaluations are not ordered relative to each other. A
//! passing evaluation's reset can overwrite a concurrent failing one's
//! increment (last write wins), so the value approximates the run of
//! consecutive failures rather than counting it exactly.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Shared count of consecutive readiness failures.
///
/// Cloning yields a handle to the same counter.
#[derive(Debug, Clone, Default)]
pub struct FailureCounter {
    failures: Arc<AtomicI64>,
}

impl FailureCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one readiness evaluation and return the new value.
    pub fn record(&self, passed: bool) -> i64 {
        if passed {
            self.reset();
            0
        } else {
            self.increment()
        }
    }

    /// Add one failure. Returns the value after the increment.
    pub fn increment(&self) -> i64 {
        self.failures.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Unconditionally store zero.
    pub fn reset(&self) {
        self.failures.store(0, Ordering::SeqCst);
    }

    pub fn current(&self) -> i64 {
        self.failures.load(Ordering::SeqCst)
    }

    /// Whether liveness should report the cascade.
    ///
    /// A threshold of `0` disables the cascade entirely.
    pub fn is_cascaded(&self, threshold: u32) -> bool {
        threshold > 0 && self.current() > i64::from(threshold)
    }
}
