//! Per-request context and property bag
//!
//! Each request gets a fresh [`RequestContext`] from [`attach_request_context`]
//! before any handler runs. Handlers take it by value with the
//! [`FromRequestParts`] extractor and thread it through the grant flow stages,
//! so no two requests ever share a bag.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use std::any::Any;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{Instrument, debug, info_span};
use uuid::Uuid;

/// Bag key of the grant request body built for the current request
pub const FORM_DATA: &str = "form_data";

/// Bag key of the parsed provider result
pub const OAUTH_RESULT: &str = "oauth_result";

/// Request-scoped key/value store
#[derive(Clone, Default)]
pub struct PropertyBag {
    entries: HashMap<&'static str, Arc<dyn Any + Send + Sync>>,
}

impl PropertyBag {
    /// Create an empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value stored under `key`, if present and of type `T`
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.entries.get(key).and_then(|value| value.downcast_ref::<T>())
    }

    /// Store `value` under `key`, replacing any previous value
    pub fn set<T: Any + Send + Sync>(&mut self, key: &'static str, value: T) {
        self.entries.insert(key, Arc::new(value));
    }

    /// Whether a value is stored under `key`
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been stored yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for PropertyBag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// Context threaded through the stages of one request
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique request ID
    pub request_id: Uuid,
    bag: PropertyBag,
}

impl RequestContext {
    /// Create a new context with an empty bag
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            bag: PropertyBag::new(),
        }
    }

    /// Typed read from the bag
    pub fn get_property<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.bag.get(key)
    }

    /// Store a value in the bag
    pub fn set_property<T: Any + Send + Sync>(&mut self, key: &'static str, value: T) {
        self.bag.set(key, value);
    }

    /// Read-only view of the whole bag
    pub fn bag(&self) -> &PropertyBag {
        &self.bag
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Middleware attaching an empty [`RequestContext`] to every request
pub async fn attach_request_context(mut request: Request, next: Next) -> Response {
    let context = RequestContext::new();
    let span = info_span!(
        "request",
        request_id = %context.request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    request.extensions_mut().insert(context);
    next.run(request).instrument(span).await
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .remove::<RequestContext>()
            .unwrap_or_else(|| {
                debug!("request context layer not installed, starting with an empty bag");
                RequestContext::new()
            }))
    }
}
