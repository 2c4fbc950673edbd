//! HTTP dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! host transport (axum::serve, hyper, ...)
//!     → server.rs (Dispatcher: pick destination)
//!         → readiness / liveness (inline plain-text answers)
//!         → metrics / profiling routers
//!         → admission gate → routes.rs (route table)
//!             → context.rs (create → inject → handler → finalize)
//!     → response.rs (plain-text helpers)
//! ```

pub mod context;
pub mod request;
pub mod response;
pub mod routes;
pub mod server;

pub use context::{BasicContext, Context, ContextFactory};
pub use request::X_REQUEST_ID;
pub use server::{BuildError, Destination, Dispatcher, DispatcherBuilder};
