//! Embeddable HTTP request dispatcher.
//!
//! One listener, four concerns: readiness/liveness/metrics endpoints, a
//! `/debug/` diagnostic surface, and application routes running behind a
//! global admission gate. Liveness is derived from sustained readiness failure.
//!
//! ```no_run
//! use std::sync::Arc;
//! use axum::http::StatusCode;
//! use opsgate::config::options;
//! use opsgate::{BasicContext, Dispatcher};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = Dispatcher::basic()
//!     .option(options::concurrency(64))
//!     .handle("/hello", |ctx: Arc<BasicContext>| async move {
//!         ctx.text(StatusCode::OK, "hello");
//!     })
//!     .build()?;
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, dispatcher.into_router()).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::{Options, Settings};
pub use health::{check_fn, Components, HealthCheck};
pub use http::{BasicContext, Context, Dispatcher, DispatcherBuilder};
pub use lifecycle::Shutdown;
