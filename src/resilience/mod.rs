//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Application request:
//!     → admission.rs (wait for a permit, or time out when bounded)
//!     → route table (handler runs while the permit is held)
//!     → permit dropped (slot returned)
//! ```
//!
//! # Design Decisions
//! - Backpressure is expressed as waiting, not rejection, unless a bound is set
//! - Operational endpoints never touch the gate

pub mod admission;

pub use admission::{AdmissionError, AdmissionGate, GatePermit};
