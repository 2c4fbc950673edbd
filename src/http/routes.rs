//! Application route table.
//!
//! # Responsibilities
//! - Collect (pattern, handler) pairs before traffic starts
//! - Reject patterns the exact-match table cannot serve
//! - Freeze into an axum `Router` that runs the Context lifecycle per request
//!
//! # Design Decisions
//! - Patterns are matched exactly; no parameters or wildcards
//! - Registration only happens on the builder, so the table is read-only once
//!   requests flow
//! - Unknown application paths answer a plain-text 404

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::any;
use axum::Router;
use futures_util::future::BoxFuture;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::health::Registry;
use crate::http::context::{Context, ContextFactory, Finalizer};
use crate::http::response::respond_internal;
use crate::observability::{metrics, tracing::route_span};

/// Error for a route that cannot be registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route pattern {0:?} must start with '/'")]
    Relative(String),

    #[error("route pattern {0:?} contains a path parameter or wildcard")]
    Parameter(String),

    #[error("route pattern {0:?} registered twice")]
    Duplicate(String),
}

type BoxHandler<C> = Arc<dyn Fn(Arc<C>) -> BoxFuture<'static, ()> + Send + Sync>;

struct Route<C> {
    pattern: Arc<str>,
    handler: BoxHandler<C>,
}

/// Registered application routes.
pub struct RouteTable<C> {
    routes: Vec<Route<C>>,
    _context: PhantomData<fn() -> C>,
}

impl<C: Context> RouteTable<C> {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            _context: PhantomData,
        }
    }

    /// Register `handler` under `pattern`.
    pub fn insert<H, Fut>(&mut self, pattern: impl Into<String>, handler: H) -> Result<(), RouteError>
    where
        H: Fn(Arc<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let pattern = pattern.into();
        if !pattern.starts_with('/') {
            return Err(RouteError::Relative(pattern));
        }
        if pattern.contains(['{', '}', '*', ':']) {
            return Err(RouteError::Parameter(pattern));
        }
        if self.patterns().any(|p| p == pattern) {
            return Err(RouteError::Duplicate(pattern));
        }

        self.routes.push(Route {
            pattern: pattern.into(),
            handler: Arc::new(move |ctx| Box::pin(handler(ctx))),
        });
        Ok(())
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| &*r.pattern)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Freeze the table into a router.
    pub(crate) fn into_router(
        self,
        factory: Arc<dyn ContextFactory<C>>,
        registry: Arc<Registry>,
    ) -> Router {
        let mut router = Router::new();
        for route in self.routes {
            let pattern = route.pattern.clone();
            let handler = route.handler;
            let factory = factory.clone();
            let registry = registry.clone();
            router = router.route(
                &route.pattern,
                any(move |request: Request| {
                    serve_route(
                        pattern.clone(),
                        handler.clone(),
                        factory.clone(),
                        registry.clone(),
                        request,
                    )
                }),
            );
        }
        router
            .fallback(not_found)
            .layer(TraceLayer::new_for_http())
    }
}

impl<C: Context> Default for RouteTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Create, inject, invoke, finalize.
async fn serve_route<C: Context>(
    pattern: Arc<str>,
    handler: BoxHandler<C>,
    factory: Arc<dyn ContextFactory<C>>,
    registry: Arc<Registry>,
    request: Request,
) -> Response {
    let span = route_span(&pattern);
    async move {
        let start = Instant::now();
        let ctx = Arc::new(factory.create(request));
        let finalizer = Finalizer::new(ctx.clone());

        registry.inject(&*ctx);
        handler(ctx).await;

        let response = finalizer.finish();
        metrics::record_app_request(&pattern, response.status().as_u16(), start);
        response
    }
    .instrument(span)
    .await
}

async fn not_found() -> Response {
    respond_internal("404 page not found", StatusCode::NOT_FOUND)
}
