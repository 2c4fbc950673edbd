//! Lifecycle management for hosts embedding the dispatcher.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Bind listener → serve dispatcher router
//!
//! Shutdown (shutdown.rs):
//!     Trigger → server stops accepting → in-flight requests drain → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - The dispatcher owns no transport; these helpers are for the demo host
//!   and integration tests
//! - A cascaded liveness probe never triggers shutdown here; restarting is the
//!   orchestrator's call

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
