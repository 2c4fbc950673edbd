//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reserved endpoint paths must be usable as exact request paths
//! - Value ranges (concurrency within the semaphore limit, admission timeout
//!   > 0 when set)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Coinciding reserved paths are allowed; readiness wins over liveness

use thiserror::Error;
use tokio::sync::Semaphore;

use crate::config::schema::Options;

/// A single semantic problem in [`Options`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    EmptyPath { field: &'static str },

    #[error("{field} must start with '/', got {value:?}")]
    RelativePath { field: &'static str, value: String },

    #[error("admission_timeout_ms must be greater than zero")]
    ZeroAdmissionTimeout,

    #[error("concurrency must be at most {max}, got {value}")]
    ConcurrencyTooLarge { max: usize, value: usize },
}

/// Validate dispatcher options.
pub fn validate_options(opts: &Options) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("readiness_path", &opts.readiness_path),
        ("liveness_path", &opts.liveness_path),
        ("metrics_path", &opts.metrics_path),
    ] {
        if value.is_empty() {
            errors.push(ValidationError::EmptyPath { field });
        } else if !value.starts_with('/') {
            errors.push(ValidationError::RelativePath {
                field,
                value: value.clone(),
            });
        }
    }

    if opts.concurrency > Semaphore::MAX_PERMITS {
        errors.push(ValidationError::ConcurrencyTooLarge {
            max: Semaphore::MAX_PERMITS,
            value: opts.concurrency,
        });
    }

    if opts.admission_timeout_ms == Some(0) {
        errors.push(ValidationError::ZeroAdmissionTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
