//! Request dispatcher.
//!
//! # Responsibilities
//! - Resolve every request to exactly one destination, in fixed priority order
//! - Answer readiness and liveness probes inline
//! - Delegate metrics and `/debug/` traffic to their collaborators
//! - Gate application traffic through the admission semaphore
//!
//! # Routing Priority
//! ```text
//! path == readiness_path   → readiness (runs checks)
//! path == liveness_path    → liveness  (reads failure counter)
//! path == metrics_path     → metrics exporter
//! path starts with /debug/ → profiling router
//! otherwise                → admission gate → route table
//! ```
//! Readiness is tested first, so it wins when readiness and liveness share a path.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::Duration;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Router;
use futures_util::future::BoxFuture;
use thiserror::Error;
use tower::{Service, ServiceExt};

use crate::config::validation::{validate_options, ValidationError};
use crate::config::{OptionFn, Options};
use crate::health::{probes, FailureCounter, HealthCheck, Registry};
use crate::http::context::{BasicContext, Context, ContextFactory};
use crate::http::response::respond_internal;
use crate::http::routes::{RouteError, RouteTable};
use crate::observability::{metrics, profiling};
use crate::resilience::AdmissionGate;

/// Body of the 503 returned when a bounded admission wait expires.
pub const ADMISSION_TIMEOUT: &str = "ADMISSION TIMEOUT";

/// Where a request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Readiness,
    Liveness,
    Metrics,
    Profiling,
    Application,
}

impl Destination {
    pub fn as_str(self) -> &'static str {
        match self {
            Destination::Readiness => "readiness",
            Destination::Liveness => "liveness",
            Destination::Metrics => "metrics",
            Destination::Profiling => "profiling",
            Destination::Application => "application",
        }
    }
}

/// Error building a [`Dispatcher`].
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid options: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    Options(Vec<ValidationError>),

    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Collects options, checks, components and routes before traffic starts.
pub struct DispatcherBuilder<C: Context> {
    factory: Arc<dyn ContextFactory<C>>,
    options: Options,
    registry: Registry,
    routes: RouteTable<C>,
    route_errors: Vec<RouteError>,
    metrics: Option<Router>,
    profiler: Option<Router>,
}

impl<C: Context> DispatcherBuilder<C> {
    fn new(factory: impl ContextFactory<C>) -> Self {
        Self {
            factory: Arc::new(factory),
            options: Options::default(),
            registry: Registry::new(),
            routes: RouteTable::new(),
            route_errors: Vec::new(),
            metrics: None,
            profiler: None,
        }
    }

    /// Apply one option function on top of the current options.
    pub fn option(mut self, f: OptionFn) -> Self {
        f(&mut self.options);
        self
    }

    /// Replace the whole options snapshot, e.g. one loaded from a config file.
    /// Option functions supplied afterwards still apply on top.
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Register a named health check.
    pub fn check(mut self, name: impl Into<String>, check: impl HealthCheck + 'static) -> Self {
        self.registry.add_check(name, check);
        self
    }

    /// Provide a component injected into every Context.
    pub fn provide<T>(mut self, component: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.registry.provide(component);
        self
    }

    /// Register an application handler under an exact path.
    ///
    /// Invalid or duplicate patterns are reported by [`DispatcherBuilder::build`].
    pub fn handle<H, Fut>(mut self, pattern: impl Into<String>, handler: H) -> Self
    where
        H: Fn(Arc<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if let Err(e) = self.routes.insert(pattern, handler) {
            self.route_errors.push(e);
        }
        self
    }

    /// Replace the default Prometheus exporter.
    pub fn metrics_exporter(mut self, router: Router) -> Self {
        self.metrics = Some(router);
        self
    }

    /// Replace the default `/debug/` router.
    pub fn profiler(mut self, router: Router) -> Self {
        self.profiler = Some(router);
        self
    }

    /// Validate everything and freeze it into a [`Dispatcher`].
    pub fn build(mut self) -> Result<Dispatcher, BuildError> {
        validate_options(&self.options).map_err(BuildError::Options)?;
        if !self.route_errors.is_empty() {
            return Err(self.route_errors.remove(0).into());
        }

        let options = self.options;
        for pattern in self.routes.patterns() {
            if pattern == options.readiness_path
                || pattern == options.liveness_path
                || pattern == options.metrics_path
                || pattern.starts_with(profiling::DEBUG_PREFIX)
            {
                tracing::warn!(route = %pattern, "Route is shadowed by a reserved endpoint");
            }
        }

        let registry = Arc::new(self.registry);
        let gate = AdmissionGate::new(
            options.concurrency,
            options.admission_timeout_ms.map(Duration::from_millis),
        );
        let metrics = self.metrics.unwrap_or_else(default_metrics_router);
        let profiler = self.profiler.unwrap_or_else(profiling::router);

        tracing::info!(
            concurrency = options.concurrency,
            readiness_cascade = options.readiness_cascade,
            readiness_path = %options.readiness_path,
            liveness_path = %options.liveness_path,
            metrics_path = %options.metrics_path,
            routes = self.routes.len(),
            checks = registry.check_names().count(),
            "Dispatcher built"
        );

        let app = self.routes.into_router(self.factory, registry.clone());

        Ok(Dispatcher {
            inner: Arc::new(Inner {
                options,
                registry,
                failures: FailureCounter::new(),
                gate,
                app,
                metrics,
                profiler,
            }),
        })
    }
}

fn default_metrics_router() -> Router {
    let handle = metrics::install();
    Router::new().fallback(move || {
        let handle = handle.clone();
        async move {
            (
                [(
                    axum::http::header::CONTENT_TYPE,
                    "text/plain; version=0.0.4; charset=utf-8",
                )],
                handle.render(),
            )
        }
    })
}

struct Inner {
    options: Options,
    registry: Arc<Registry>,
    failures: FailureCounter,
    gate: AdmissionGate,
    app: Router,
    metrics: Router,
    profiler: Router,
}

/// The request dispatcher. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    /// Start building a dispatcher whose application routes use contexts
    /// produced by `factory`.
    pub fn builder<C: Context>(factory: impl ContextFactory<C>) -> DispatcherBuilder<C> {
        DispatcherBuilder::new(factory)
    }

    /// Builder using [`BasicContext`].
    pub fn basic() -> DispatcherBuilder<BasicContext> {
        DispatcherBuilder::new(BasicContext::from_request)
    }

    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    /// Consecutive readiness failures shared with the liveness probe.
    pub fn failures(&self) -> &FailureCounter {
        &self.inner.failures
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.inner.gate
    }

    /// Pick the destination for `path`. First match wins.
    pub fn destination(&self, path: &str) -> Destination {
        let opts = &self.inner.options;
        if path == opts.readiness_path {
            Destination::Readiness
        } else if path == opts.liveness_path {
            Destination::Liveness
        } else if path == opts.metrics_path {
            Destination::Metrics
        } else if path.starts_with(profiling::DEBUG_PREFIX) {
            Destination::Profiling
        } else {
            Destination::Application
        }
    }

    /// Handle one request.
    pub async fn dispatch(&self, request: Request) -> Response {
        let destination = self.destination(request.uri().path());
        metrics::record_dispatch(destination.as_str());
        tracing::trace!(
            destination = destination.as_str(),
            path = %request.uri().path(),
            "Dispatching request"
        );

        match destination {
            Destination::Readiness => {
                probes::readiness(&self.inner.registry, &self.inner.failures)
                    .await
                    .into_response()
            }
            Destination::Liveness => {
                probes::liveness(&self.inner.failures, self.inner.options.readiness_cascade)
                    .into_response()
            }
            Destination::Metrics => forward(&self.inner.metrics, request).await,
            Destination::Profiling => forward(&self.inner.profiler, request).await,
            Destination::Application => self.serve_application(request).await,
        }
    }

    /// Hold a permit for the whole route execution. The route finalizes its
    /// Context before returning, so the permit is always released after.
    async fn serve_application(&self, request: Request) -> Response {
        let permit = match self.inner.gate.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                tracing::warn!(error = %e, path = %request.uri().path(), "Admission rejected");
                metrics::record_admission_timeout();
                return respond_internal(ADMISSION_TIMEOUT, StatusCode::SERVICE_UNAVAILABLE);
            }
        };

        let response = forward(&self.inner.app, request).await;
        drop(permit);
        response
    }

    /// Wrap into a router suitable for `axum::serve`.
    pub fn into_router(self) -> Router {
        Router::new().fallback_service(self)
    }
}

async fn forward(router: &Router, request: Request) -> Response {
    match router.clone().oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}

impl Service<Request> for Dispatcher {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let this = self.clone();
        Box::pin(async move { Ok(this.dispatch(request).await) })
    }
}
