//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Readiness probe (probes.rs):
//!     → registry.rs runs every check in order
//!     → report lines rendered
//!     → state.rs counter reset (all pass) or incremented (any failure)
//!
//! Liveness probe (probes.rs):
//!     → state.rs counter read
//!     → CASCADED once failures exceed readiness_cascade
//! ```
//!
//! # Design Decisions
//! - Liveness is derived from sustained readiness failure, not probed directly
//! - A single blip never fails liveness; only a run of failures does
//! - The counter is the only state; no explicit state enum

pub mod probes;
pub mod registry;
pub mod state;

pub use probes::{ProbeOutcome, CASCADED};
pub use registry::{check_fn, CheckReport, Components, HealthCheck, Registry};
pub use state::FailureCounter;
