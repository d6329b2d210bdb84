//! Exception-handling middleware.
//!
//! Intercepts every failure raised downstream, whether returned as
//! `Err(LintelError)` or thrown as a panic, reports it to the injected
//! [`TelemetryPublisher`] and answers it with a JSON payload.
//!
//! | Failure                 | Status                          | Body               |
//! |-------------------------|---------------------------------|--------------------|
//! | `BadRequest`            | `400`                           | [`BadRequestBody`] |
//! | anything else or panic  | configured, `500` by default    | [`ErrorBody`]      |
//!
//! Aggregates are answered as their first inner error. When the response has
//! already started, the failure is reported and the original error is
//! returned to the caller unchanged.
//!
//! # Example
//!
//! ```
//! use http::StatusCode;
//! use lintel_middleware::stages::ExceptionHandlerMiddleware;
//! use lintel_telemetry::TracingPublisher;
//!
//! let handler = ExceptionHandlerMiddleware::new(TracingPublisher)
//!     .status_code(StatusCode::SERVICE_UNAVAILABLE)
//!     .include_stack_trace(true);
//!
//! assert_eq!(handler.configured_status(), StatusCode::SERVICE_UNAVAILABLE);
//! ```
//!
//! [`BadRequestBody`]: lintel_core::BadRequestBody
//! [`ErrorBody`]: lintel_core::ErrorBody

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{HandlerResult, Request, Response, ResponseExt};
use futures_util::FutureExt;
use http::StatusCode;
use lintel_core::{LintelError, RequestId};
use lintel_telemetry::{metrics, TelemetryEvent, TelemetryPublisher};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Summary of the failure the exception handler dealt with, stored in the
/// [`MiddlewareContext`] for outer stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandledException {
    /// Request the failure belongs to.
    pub request_id: RequestId,
    /// Short type name of the failure.
    pub exception_type: String,
    /// Failure message.
    pub message: String,
    /// Status code written, `None` when the response had already started.
    pub status_code: Option<u16>,
    /// Whether the failure was a bad request.
    pub bad_request: bool,
    /// Whether the failure came from a panic.
    pub panicked: bool,
    /// Whether the response had already started.
    pub response_started: bool,
}

/// Middleware that turns unhandled failures into JSON error responses.
#[derive(Clone)]
pub struct ExceptionHandlerMiddleware {
    publisher: Arc<dyn TelemetryPublisher>,
    status_code: StatusCode,
    include_stack_trace: bool,
}

impl ExceptionHandlerMiddleware {
    /// Creates the middleware with the default status (`500`) and no stack
    /// traces in responses.
    #[must_use]
    pub fn new<P: TelemetryPublisher + 'static>(publisher: P) -> Self {
        Self::with_publisher(Arc::new(publisher))
    }

    /// Creates the middleware around an already shared publisher.
    #[must_use]
    pub fn with_publisher(publisher: Arc<dyn TelemetryPublisher>) -> Self {
        Self {
            publisher,
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
            include_stack_trace: false,
        }
    }

    /// Sets the status used for everything except bad requests.
    #[must_use]
    pub fn status_code(mut self, status_code: StatusCode) -> Self {
        self.status_code = status_code;
        self
    }

    /// Sets whether captured stack traces are written into responses.
    #[must_use]
    pub fn include_stack_trace(mut self, include: bool) -> Self {
        self.include_stack_trace = include;
        self
    }

    /// Returns the status used for everything except bad requests.
    #[must_use]
    pub fn configured_status(&self) -> StatusCode {
        self.status_code
    }

    /// Returns whether stack traces are written into responses.
    #[must_use]
    pub fn includes_stack_trace(&self) -> bool {
        self.include_stack_trace
    }

    /// Builds the error response for `error`.
    fn build_response(&self, error: &LintelError) -> HandlerResult {
        if error.is_bad_request() {
            Response::json(StatusCode::BAD_REQUEST, &error.to_bad_request_body())
        } else {
            Response::json(
                self.status_code,
                &error.to_error_body(self.include_stack_trace),
            )
        }
    }

    fn report(
        &self,
        ctx: &mut MiddlewareContext,
        origin: &RequestOrigin,
        error: &LintelError,
        status_code: Option<u16>,
        response_started: bool,
    ) {
        let event = TelemetryEvent::from_error(error)
            .with_request(ctx.request_id(), origin.method.as_str(), origin.path.as_str())
            .with_status(status_code)
            .with_response_started(response_started);

        self.publisher.publish(&event);

        ctx.set_extension(HandledException {
            request_id: event.request_id,
            exception_type: event.exception_type,
            message: event.message,
            status_code,
            bad_request: event.bad_request,
            panicked: error.is_panic(),
            response_started,
        });
    }
}

impl Default for ExceptionHandlerMiddleware {
    fn default() -> Self {
        Self::new(lintel_telemetry::TracingPublisher)
    }
}

impl std::fmt::Debug for ExceptionHandlerMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExceptionHandlerMiddleware")
            .field("status_code", &self.status_code)
            .field("include_stack_trace", &self.include_stack_trace)
            .finish_non_exhaustive()
    }
}

/// Request line captured before the request is handed downstream.
struct RequestOrigin {
    method: String,
    path: String,
}

impl Middleware for ExceptionHandlerMiddleware {
    fn name(&self) -> &'static str {
        "exception_handler"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let origin = RequestOrigin {
                method: request.method().to_string(),
                path: request.uri().path().to_string(),
            };

            let outcome = AssertUnwindSafe(next.run(ctx, request))
                .catch_unwind()
                .await;

            let error = match outcome {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(error)) => error,
                Err(payload) => LintelError::from_panic_payload(payload),
            };

            let innermost = error.innermost();

            if ctx.response_started() {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    error = %innermost,
                    "Response already started, propagating exception"
                );
                self.report(ctx, &origin, innermost, None, true);
                return Err(error);
            }

            let response = self.build_response(innermost)?;
            let status = response.status().as_u16();

            self.report(ctx, &origin, innermost, Some(status), false);
            metrics::record_handled_response(status);

            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Request as HttpRequest, Response as HttpResponse};
    use http_body_util::{BodyExt, Full};
    use lintel_core::FieldErrors;
    use lintel_telemetry::MemoryPublisher;

    fn request() -> Request {
        HttpRequest::builder()
            .method("POST")
            .uri("/orders?draft=true")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn failing(error: fn() -> LintelError) -> Next<'static> {
        Next::handler(move |_ctx, _req| Box::pin(async move { Err(error()) }))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn middleware() -> (ExceptionHandlerMiddleware, Arc<MemoryPublisher>) {
        let publisher = Arc::new(MemoryPublisher::new());
        (ExceptionHandlerMiddleware::new(publisher.clone()), publisher)
    }

    #[test]
    fn test_defaults() {
        let (mw, _) = middleware();
        assert_eq!(mw.name(), "exception_handler");
        assert_eq!(mw.configured_status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!mw.includes_stack_trace());
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let (mw, publisher) = middleware();
        let mut ctx = MiddlewareContext::new();
        let next = Next::handler(|_ctx, _req| {
            Box::pin(async {
                Ok(HttpResponse::builder()
                    .status(StatusCode::CREATED)
                    .body(Full::new(Bytes::from("created")))
                    .unwrap())
            })
        });

        let response = mw.process(&mut ctx, request(), next).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(publisher.is_empty());
        assert!(!ctx.has_extension::<HandledException>());
    }

    #[tokio::test]
    async fn test_internal_error_uses_configured_status() {
        let (mw, publisher) = middleware();
        let mw = mw.status_code(StatusCode::SERVICE_UNAVAILABLE);
        let mut ctx = MiddlewareContext::new();

        let response = mw
            .process(&mut ctx, request(), failing(|| LintelError::internal("db down")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(body_json(response).await, serde_json::json!({"message": "db down"}));

        let event = publisher.last().unwrap();
        assert_eq!(event.status_code, Some(503));
        assert_eq!(event.method, "POST");
        assert_eq!(event.path, "/orders");
        assert_eq!(event.request_id, ctx.request_id());
        assert_eq!(event.exception_type, "LintelError::Internal");
    }

    #[tokio::test]
    async fn test_bad_request_answers_400_with_field_errors() {
        let (mw, publisher) = middleware();
        let mut ctx = MiddlewareContext::new();
        let next = failing(|| {
            LintelError::bad_request_with_fields(
                "Invalid order",
                FieldErrors::new().with("quantity", "must be positive"),
            )
        });

        let response = mw.process(&mut ctx, request(), next).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({
                "message": "Invalid order",
                "errors": {"quantity": ["must be positive"]}
            })
        );
        assert!(publisher.last().unwrap().bad_request);
        assert!(ctx.get_extension::<HandledException>().unwrap().bad_request);
    }

    #[tokio::test]
    async fn test_aggregate_is_answered_as_first_inner_error() {
        let (mw, publisher) = middleware();
        let mut ctx = MiddlewareContext::new();
        let next = failing(|| {
            LintelError::aggregate([
                LintelError::bad_request("first"),
                LintelError::internal("second"),
            ])
        });

        let response = mw.process(&mut ctx, request(), next).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "first");
        assert_eq!(publisher.last().unwrap().exception_type, "LintelError::BadRequest");
    }

    #[tokio::test]
    async fn test_panic_is_caught() {
        let (mw, publisher) = middleware();
        let mut ctx = MiddlewareContext::new();
        async fn explode() -> HandlerResult {
            panic!("handler exploded")
        }
        let next = Next::handler(|_ctx, _req| Box::pin(explode()));

        let response = mw.process(&mut ctx, request(), next).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["message"], "handler exploded");

        let handled = ctx.get_extension::<HandledException>().unwrap();
        assert!(handled.panicked);
        assert_eq!(publisher.last().unwrap().exception_type, "LintelError::Panic");
    }

    #[tokio::test]
    async fn test_stack_trace_only_when_enabled() {
        let failing_with_trace = || {
            Next::handler(|_ctx, _req| {
                Box::pin(async {
                    Err(LintelError::Internal {
                        message: "boom".to_string(),
                        source: None,
                        type_name: None,
                        stack_trace: Some("0: orders::create".to_string()),
                    })
                })
            })
        };

        let (mw, _) = middleware();
        let response = mw
            .process(&mut MiddlewareContext::new(), request(), failing_with_trace())
            .await
            .unwrap();
        assert!(body_json(response).await.get("stackTrace").is_none());

        let mw = mw.include_stack_trace(true);
        let response = mw
            .process(&mut MiddlewareContext::new(), request(), failing_with_trace())
            .await
            .unwrap();
        assert_eq!(body_json(response).await["stackTrace"], "0: orders::create");
    }

    #[tokio::test]
    async fn test_started_response_only_publishes_and_propagates() {
        let (mw, publisher) = middleware();
        let mut ctx = MiddlewareContext::new();
        let next = Next::handler(|ctx, _req| {
            ctx.mark_response_started();
            Box::pin(async { Err(LintelError::internal("stream broke")) })
        });

        let error = mw.process(&mut ctx, request(), next).await.unwrap_err();

        assert_eq!(error.message(), "stream broke");
        let event = publisher.last().unwrap();
        assert!(event.response_started);
        assert_eq!(event.status_code, None);
        assert_eq!(ctx.get_extension::<HandledException>().unwrap().status_code, None);
    }

    #[tokio::test]
    async fn test_started_response_propagates_aggregate_unchanged() {
        let (mw, publisher) = middleware();
        let mut ctx = MiddlewareContext::new();
        let next = Next::handler(|ctx, _req| {
            let started = ctx.response_started_flag();
            Box::pin(async move {
                started.mark();
                Err(LintelError::aggregate([LintelError::internal("inner")]))
            })
        });

        let error = mw.process(&mut ctx, request(), next).await.unwrap_err();

        assert_eq!(error.kind(), "Aggregate");
        assert_eq!(publisher.last().unwrap().message, "inner");
    }
}
