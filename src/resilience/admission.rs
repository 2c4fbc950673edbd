//! Admission gate bounding concurrent application requests.
//!
//! # Responsibilities
//! - Hold a fixed pool of `concurrency` interchangeable permits
//! - Block application requests while the pool is exhausted
//! - Release each permit exactly once on every exit path
//!
//! # Design Decisions
//! - Backed by a `tokio::sync::Semaphore`; permits are created once and never
//!   added or forgotten, so held + available is constant
//! - Waiting is cancel-safe: dropping the acquire future leaves the pool intact
//! - Optional bounded wait; unbounded blocking otherwise
//! - Each gate reports its free permits under its own `gate` label; the gauge
//!   is sampled after each acquire and release, so it can lag concurrent changes

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::observability::metrics;

static NEXT_GATE_ID: AtomicUsize = AtomicUsize::new(0);

/// Error returned when a permit could not be obtained.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// No permit was released within the configured wait.
    #[error("no admission permit within {0:?}")]
    Timeout(Duration),

    /// The semaphore was closed. Never happens while the gate is alive.
    #[error("admission gate closed")]
    Closed,
}

/// A counting semaphore gating application traffic.
///
/// A gate with zero capacity is disabled: [`AdmissionGate::acquire`] returns
/// immediately with an empty permit.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    id: usize,
    permits: Option<Arc<Semaphore>>,
    capacity: usize,
    timeout: Option<Duration>,
}

impl AdmissionGate {
    /// Create a gate with `capacity` permits. `0` disables the gate.
    ///
    /// Capacity is capped at [`Semaphore::MAX_PERMITS`]; option validation
    /// rejects larger values before a dispatcher gets here.
    pub fn new(capacity: usize, timeout: Option<Duration>) -> Self {
        let id = NEXT_GATE_ID.fetch_add(1, Ordering::Relaxed);
        let capacity = capacity.min(Semaphore::MAX_PERMITS);
        let permits = (capacity > 0).then(|| Arc::new(Semaphore::new(capacity)));
        if permits.is_some() {
            metrics::set_permits_available(id, capacity);
        }
        Self {
            id,
            permits,
            capacity,
            timeout,
        }
    }

    /// Process-unique id, used as the `gate` metric label.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn is_enabled(&self) -> bool {
        self.permits.is_some()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently free, or `None` when the gate is disabled.
    pub fn available_permits(&self) -> Option<usize> {
        self.permits.as_ref().map(|s| s.available_permits())
    }

    /// Wait for a permit.
    ///
    /// The returned guard releases the permit when dropped, including during
    /// unwinding. Dropping this future before it resolves abandons the wait
    /// without taking a permit.
    pub async fn acquire(&self) -> Result<GatePermit, AdmissionError> {
        let Some(semaphore) = &self.permits else {
            return Ok(GatePermit::unlimited());
        };

        let acquire = semaphore.clone().acquire_owned();
        let permit = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, acquire)
                .await
                .map_err(|_| AdmissionError::Timeout(limit))?,
            None => acquire.await,
        }
        .map_err(|_| AdmissionError::Closed)?;

        metrics::set_permits_available(self.id, semaphore.available_permits());
        Ok(GatePermit {
            gate: self.id,
            permit: Some(permit),
            semaphore: Some(semaphore.clone()),
        })
    }
}

/// A held admission permit.
///
/// When dropped, the slot is returned to the gate.
#[derive(Debug)]
pub struct GatePermit {
    gate: usize,
    permit: Option<OwnedSemaphorePermit>,
    semaphore: Option<Arc<Semaphore>>,
}

impl GatePermit {
    fn unlimited() -> Self {
        Self {
            gate: 0,
            permit: None,
            semaphore: None,
        }
    }

    /// True when the permit came from an enabled gate.
    pub fn is_limited(&self) -> bool {
        self.permit.is_some()
    }
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        if let Some(permit) = self.permit.take() {
            drop(permit);
            if let Some(semaphore) = &self.semaphore {
                metrics::set_permits_available(self.gate, semaphore.available_permits());
            }
            tracing::trace!("Admission permit released");
        }
    }
}
