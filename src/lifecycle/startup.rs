//! Serving a dispatcher on a bound listener.
//!
//! # Responsibilities
//! - Hand the dispatcher to `axum::serve`
//! - Turn handler panics into 500 responses at the outer boundary
//! - Stop accepting on shutdown and let in-flight requests finish

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::catch_panic::CatchPanicLayer;

use crate::http::Dispatcher;
use crate::lifecycle::shutdown;

/// Serve until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    dispatcher: Dispatcher,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "HTTP server starting");

    let app = dispatcher.into_router().layer(CatchPanicLayer::new());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::recv(shutdown))
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}
