//! Registry of named health checks and injectable components.
//!
//! # Responsibilities
//! - Hold health checks in registration order
//! - Run them one after another for a readiness evaluation
//! - Inject shared components into each request's Context
//!
//! # Design Decisions
//! - Registration happens on the builder; the registry is read-only once the
//!   dispatcher is built
//! - Check order is registration order, so reports are reproducible
//! - Components are a type map keyed by type, cloned out on lookup

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::Extensions;
use tower::BoxError;

use crate::http::context::Context;

/// A named probe of some dependency.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Return `Err` when the dependency is unusable.
    async fn check(&self) -> Result<(), BoxError>;
}

/// Health check built from an async closure.
///
/// See [`check_fn`].
#[derive(Clone)]
pub struct CheckFn<F> {
    f: F,
}

/// Wrap a closure returning a future as a [`HealthCheck`].
pub fn check_fn<F, Fut>(f: F) -> CheckFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    CheckFn { f }
}

#[async_trait]
impl<F, Fut> HealthCheck for CheckFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    async fn check(&self) -> Result<(), BoxError> {
        (self.f)().await
    }
}

/// Outcome of one health check.
#[derive(Debug)]
pub struct CheckReport {
    pub name: String,
    pub result: Result<(), BoxError>,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Shared components handed to every Context on injection.
#[derive(Debug, Clone, Default)]
pub struct Components {
    inner: Arc<Extensions>,
}

impl Components {
    /// Clone out the component of type `T`, if one was provided.
    pub fn get<T>(&self) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.inner.get::<T>().cloned()
    }

    fn insert<T>(&mut self, component: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.inner).insert(component);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Health checks plus dependency injection.
#[derive(Default)]
pub struct Registry {
    checks: Vec<(String, Arc<dyn HealthCheck>)>,
    components: Components,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named health check. Checks run in registration order.
    pub fn add_check(&mut self, name: impl Into<String>, check: impl HealthCheck + 'static) {
        let name = name.into();
        tracing::debug!(check = %name, "Health check registered");
        self.checks.push((name, Arc::new(check)));
    }

    /// Provide a component for injection. A later value of the same type
    /// replaces an earlier one.
    pub fn provide<T>(&mut self, component: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        self.components.insert(component);
    }

    pub fn check_names(&self) -> impl Iterator<Item = &str> {
        self.checks.iter().map(|(name, _)| name.as_str())
    }

    pub fn components(&self) -> &Components {
        &self.components
    }

    /// Run every registered check sequentially.
    pub async fn check(&self) -> Vec<CheckReport> {
        let mut reports = Vec::with_capacity(self.checks.len());
        for (name, check) in &self.checks {
            let result = check.check().await;
            if let Err(e) = &result {
                tracing::warn!(check = %name, error = %e, "Health check failed");
            }
            reports.push(CheckReport {
                name: name.clone(),
                result,
            });
        }
        reports
    }

    /// Populate a Context's dependencies.
    pub fn inject<C: Context>(&self, ctx: &C) {
        ctx.inject(&self.components);
    }
}
