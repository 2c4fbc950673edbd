//! Per-request Context and its lifecycle.
//!
//! # Lifecycle
//! ```text
//! factory.create(request) → Finalizer armed → registry.inject(ctx)
//!     → handler(ctx).await → Finalizer::finish → perform() → Response
//! ```
//! If the handler unwinds or the request future is dropped, the Finalizer's
//! `Drop` runs `perform()` instead, so finalize happens exactly once on every
//! exit path.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::health::registry::Components;
use crate::http::request::{request_id_from, X_REQUEST_ID};

/// Capabilities every per-request Context must provide.
pub trait Context: Send + Sync + 'static {
    /// Receive shared components. Called once per request, before the handler.
    fn inject(&self, _components: &Components) {}

    /// Finalize the request and produce its response. Called exactly once.
    fn perform(&self) -> Response;
}

/// Builds one Context per application request.
pub trait ContextFactory<C>: Send + Sync + 'static {
    fn create(&self, request: Request) -> C;
}

impl<C, F> ContextFactory<C> for F
where
    F: Fn(Request) -> C + Send + Sync + 'static,
{
    fn create(&self, request: Request) -> C {
        self(request)
    }
}

/// Guard guaranteeing `perform()` runs once.
pub(crate) struct Finalizer<C: Context> {
    ctx: Option<Arc<C>>,
}

impl<C: Context> Finalizer<C> {
    pub(crate) fn new(ctx: Arc<C>) -> Self {
        Self { ctx: Some(ctx) }
    }

    /// Finalize after a normal return.
    pub(crate) fn finish(mut self) -> Response {
        match self.ctx.take() {
            Some(ctx) => ctx.perform(),
            None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl<C: Context> Drop for Finalizer<C> {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            tracing::warn!("Handler did not complete; finalizing context");
            let _ = ctx.perform();
        }
    }
}

#[derive(Debug)]
struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Default for Reply {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }
}

/// The vanilla [`Context`].
///
/// Handlers read the request through accessors and build the response with
/// [`BasicContext::text`], [`BasicContext::json`] and friends. Nothing is
/// sent until the context is finalized.
#[derive(Debug)]
pub struct BasicContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    request_id: String,
    body: Mutex<Option<Body>>,
    components: OnceLock<Components>,
    reply: Mutex<Reply>,
}

impl BasicContext {
    /// Context factory for [`BasicContext`].
    pub fn from_request(request: Request) -> Self {
        let (parts, body) = request.into_parts();
        let request_id = request_id_from(&parts.headers);
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            request_id,
            body: Mutex::new(Some(body)),
            components: OnceLock::new(),
            reply: Mutex::new(Reply::default()),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Incoming `x-request-id`, or a generated UUID.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Take the request body. Returns `None` after the first call.
    pub fn take_body(&self) -> Option<Body> {
        self.body.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    /// Read the whole request body, up to `limit` bytes.
    pub async fn body_bytes(&self, limit: usize) -> Result<Bytes, axum::Error> {
        match self.take_body() {
            Some(body) => axum::body::to_bytes(body, limit).await,
            None => Ok(Bytes::new()),
        }
    }

    /// Look up an injected component.
    pub fn component<T>(&self) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.components.get().and_then(Components::get::<T>)
    }

    pub fn set_status(&self, status: StatusCode) {
        self.reply().status = status;
    }

    pub fn set_header(&self, name: HeaderName, value: HeaderValue) {
        self.reply().headers.insert(name, value);
    }

    /// Respond with plain text.
    pub fn text(&self, status: StatusCode, body: impl Into<String>) {
        let mut reply = self.reply();
        reply.status = status;
        reply.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        reply.body = Bytes::from(body.into());
    }

    /// Respond with a JSON document. Serialization failures become a 500.
    pub fn json<T: Serialize>(&self, status: StatusCode, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                let mut reply = self.reply();
                reply.status = status;
                reply
                    .headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                reply.body = Bytes::from(bytes);
            }
            Err(e) => {
                tracing::error!(request_id = %self.request_id, error = %e, "JSON serialization failed");
                self.text(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
            }
        }
    }

    /// Status the response will carry.
    pub fn status(&self) -> StatusCode {
        self.reply().status
    }

    fn reply(&self) -> std::sync::MutexGuard<'_, Reply> {
        self.reply.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Context for BasicContext {
    fn inject(&self, components: &Components) {
        let _ = self.components.set(components.clone());
    }

    fn perform(&self) -> Response {
        let reply = std::mem::take(&mut *self.reply());
        let mut response = Response::new(Body::from(reply.body));
        *response.status_mut() = reply.status;
        *response.headers_mut() = reply.headers;
        if let Ok(id) = HeaderValue::from_str(&self.request_id) {
            response.headers_mut().insert(X_REQUEST_ID, id);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        performed: AtomicUsize,
    }

    impl Context for Counting {
        fn perform(&self) -> Response {
            self.performed.fetch_add(1, Ordering::SeqCst);
            StatusCode::NO_CONTENT.into_response()
        }
    }

    fn request(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::from("payload")).unwrap()
    }

    #[test]
    fn finish_performs_once() {
        let ctx = Arc::new(Counting::default());
        let response = Finalizer::new(ctx.clone()).finish();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(ctx.performed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_performs_once() {
        let ctx = Arc::new(Counting::default());
        drop(Finalizer::new(ctx.clone()));
        assert_eq!(ctx.performed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unwind_performs_once() {
        let ctx = Arc::new(Counting::default());
        let guarded = ctx.clone();
        let result = std::panic::catch_unwind(move || {
            let _finalizer = Finalizer::new(guarded);
            panic!("handler blew up");
        });
        assert!(result.is_err());
        assert_eq!(ctx.performed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn closures_are_factories() {
        let factory = |req: Request| req.uri().path().to_string();
        assert_eq!(ContextFactory::create(&factory, request("/a/b")), "/a/b");
    }

    #[tokio::test]
    async fn basic_context_reads_request() {
        let ctx = BasicContext::from_request(
            Request::builder()
                .method(Method::POST)
                .uri("/echo?x=1")
                .header(X_REQUEST_ID, "req-7")
                .body(Body::from("hello"))
                .unwrap(),
        );
        assert_eq!(ctx.method(), Method::POST);
        assert_eq!(ctx.path(), "/echo");
        assert_eq!(ctx.request_id(), "req-7");
        assert_eq!(ctx.body_bytes(1024).await.unwrap(), "hello");
        assert!(ctx.take_body().is_none());
    }

    #[test]
    fn basic_context_builds_response() {
        let ctx = BasicContext::from_request(request("/"));
        ctx.json(StatusCode::CREATED, &serde_json::json!({ "ok": true }));

        let response = ctx.perform();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert!(response.headers().contains_key(X_REQUEST_ID));
    }

    #[test]
    fn basic_context_receives_components() {
        let mut registry = crate::health::Registry::new();
        registry.provide(String::from("shared"));

        let ctx = BasicContext::from_request(request("/"));
        assert_eq!(ctx.component::<String>(), None);
        registry.inject(&ctx);
        assert_eq!(ctx.component::<String>(), Some("shared".to_string()));
    }

    #[test]
    fn untouched_context_is_empty_ok() {
        let ctx = BasicContext::from_request(request("/"));
        assert_eq!(ctx.status(), StatusCode::OK);
        assert_eq!(ctx.perform().status(), StatusCode::OK);
    }
}
