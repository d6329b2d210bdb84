//! Middleware context types.
//!
//! The [`MiddlewareContext`] carries per-request state through the pipeline:
//! the request ID, the start instant, whether the response has started, and
//! typed extensions stages use to talk to each other.

use lintel_core::RequestId;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Shared flag recording that response bytes have been sent.
///
/// Once set, the exception handler can no longer replace the response and
/// only reports the failure. Handlers that stream or hand the response off
/// early take a clone of this flag from
/// [`MiddlewareContext::response_started_flag`] and call [`mark`](Self::mark).
#[derive(Debug, Clone, Default)]
pub struct ResponseStarted(Arc<AtomicBool>);

impl ResponseStarted {
    /// Records that the response has started.
    pub fn mark(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once the response has started.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Context that flows through the middleware pipeline.
///
/// # Example
///
/// ```
/// use lintel_middleware::MiddlewareContext;
///
/// let ctx = MiddlewareContext::new();
/// assert!(!ctx.response_started());
///
/// ctx.mark_response_started();
/// assert!(ctx.response_started());
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    /// Unique identifier for this request.
    request_id: RequestId,

    /// When the request started processing.
    started_at: Instant,

    /// Whether the response has started.
    response_started: ResponseStarted,

    /// Type-erased extension data.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl MiddlewareContext {
    /// Creates a new middleware context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with a specific request ID.
    ///
    /// Useful when the request ID was provided by a client or upstream service.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            started_at: Instant::now(),
            response_started: ResponseStarted::default(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Sets the request ID.
    ///
    /// This should only be called by the request ID middleware.
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// Returns when the request started processing.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Records that the response has started.
    pub fn mark_response_started(&self) {
        self.response_started.mark();
    }

    /// Returns `true` once the response has started.
    #[must_use]
    pub fn response_started(&self) -> bool {
        self.response_started.is_started()
    }

    /// Returns a handle to the response-started flag that outlives the borrow
    /// of this context.
    #[must_use]
    pub fn response_started_flag(&self) -> ResponseStarted {
        self.response_started.clone()
    }

    /// Stores a typed extension value, replacing any previous one.
    ///
    /// # Example
    ///
    /// ```
    /// use lintel_middleware::MiddlewareContext;
    ///
    /// struct Tenant(&'static str);
    ///
    /// let mut ctx = MiddlewareContext::new();
    /// ctx.set_extension(Tenant("acme"));
    ///
    /// assert_eq!(ctx.get_extension::<Tenant>().unwrap().0, "acme");
    /// ```
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Checks if an extension of the given type exists.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}
