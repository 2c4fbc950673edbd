//! Diagnostic endpoints under the `/debug/` prefix.
//!
//! # Endpoints
//! - `/debug/pprof/` : index of the available endpoints
//! - `/debug/pprof/cmdline` : process arguments, NUL-separated
//! - `/debug/pprof/runtime` : tokio runtime counters
//! - `/debug/pprof/profile`, `/debug/pprof/symbol`, `/debug/pprof/trace` :
//!   501, no sampling profiler is built in
//!
//! Anything else below the prefix answers 404. Hosts that need CPU profiles
//! swap the whole router for their own profiler via
//! `DispatcherBuilder::profiler`.

use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use crate::http::response::respond_internal;

/// Paths starting with this prefix go to the profiling router.
pub const DEBUG_PREFIX: &str = "/debug/";

const INDEX: &str = "/debug/pprof/\n/debug/pprof/cmdline\n/debug/pprof/runtime";

const NO_PROFILER: &str =
    "no sampling profiler installed; provide one with DispatcherBuilder::profiler";

/// Default profiling router.
pub fn router() -> Router {
    Router::new()
        .route("/debug/pprof/", get(index))
        .route("/debug/pprof/cmdline", get(cmdline))
        .route("/debug/pprof/runtime", get(runtime))
        .route("/debug/pprof/profile", get(not_installed))
        .route("/debug/pprof/symbol", get(not_installed))
        .route("/debug/pprof/trace", get(not_installed))
        .fallback(not_found)
}

async fn index() -> Response {
    respond_internal(INDEX, StatusCode::OK)
}

async fn cmdline() -> Response {
    let args: Vec<String> = std::env::args().collect();
    respond_internal(args.join("\0"), StatusCode::OK)
}

async fn runtime() -> Response {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let metrics = handle.metrics();
            let body = format!(
                "workers: {}\nalive_tasks: {}",
                metrics.num_workers(),
                metrics.num_alive_tasks()
            );
            respond_internal(body, StatusCode::OK)
        }
        Err(_) => respond_internal("no runtime", StatusCode::SERVICE_UNAVAILABLE),
    }
}

async fn not_installed() -> Response {
    respond_internal(NO_PROFILER, StatusCode::NOT_IMPLEMENTED)
}

async fn not_found() -> Response {
    respond_internal("404 page not found", StatusCode::NOT_FOUND)
}
