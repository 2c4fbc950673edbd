//! Option functions overriding [`Options`] fields.
//!
//! Each function returns a closure editing one field. They are applied in the
//! order supplied, so a later option wins over an earlier one on the same field.
//!
//! ```
//! use opsgate::config::options;
//! use opsgate::config::Options;
//!
//! let opts = Options::from_fns([
//!     options::concurrency(8),
//!     options::readiness_cascade(2),
//!     options::concurrency(16),
//! ]);
//! assert_eq!(opts.concurrency, 16);
//! ```

use std::time::Duration;

use crate::config::schema::Options;

/// A boxed option function.
pub type OptionFn = Box<dyn FnOnce(&mut Options) + Send>;

impl Options {
    /// Start from defaults and apply `fns` in order.
    pub fn from_fns<I>(fns: I) -> Self
    where
        I: IntoIterator<Item = OptionFn>,
    {
        let mut opts = Self::default();
        for f in fns {
            f(&mut opts);
        }
        opts
    }
}

/// Set the admission gate capacity. `0` disables the gate.
pub fn concurrency(n: usize) -> OptionFn {
    Box::new(move |o| o.concurrency = n)
}

/// Set the readiness cascade threshold. `0` disables the cascade.
pub fn readiness_cascade(n: u32) -> OptionFn {
    Box::new(move |o| o.readiness_cascade = n)
}

pub fn readiness_path(path: impl Into<String>) -> OptionFn {
    let path = path.into();
    Box::new(move |o| o.readiness_path = path)
}

pub fn liveness_path(path: impl Into<String>) -> OptionFn {
    let path = path.into();
    Box::new(move |o| o.liveness_path = path)
}

pub fn metrics_path(path: impl Into<String>) -> OptionFn {
    let path = path.into();
    Box::new(move |o| o.metrics_path = path)
}

/// Bound the wait for an admission permit.
///
/// Stored in whole milliseconds; a non-zero duration below 1 ms rounds up to 1 ms.
pub fn admission_timeout(timeout: Duration) -> OptionFn {
    let mut ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    if ms == 0 && !timeout.is_zero() {
        ms = 1;
    }
    Box::new(move |o| o.admission_timeout_ms = Some(ms))
}
