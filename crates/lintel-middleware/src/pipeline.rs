//! Ordered middleware pipeline.
//!
//! A [`Pipeline`] wraps a terminal handler in a fixed list of stages. Stages
//! run in the order they were added on the way in and unwind in reverse on
//! the way out, so the first stage sees the final result.
//!
//! A typical pipeline puts the request ID stage first and the exception
//! handler right after it:
//!
//! ```text
//! Request → RequestId → ExceptionHandler → ... → Handler
//!                                                   ↓
//! Response ← RequestId ← ExceptionHandler ← ... ←───┘
//! ```

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{HandlerResult, Request};
use std::sync::Arc;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An immutable, ordered middleware pipeline.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use http_body_util::Full;
/// use lintel_middleware::stages::{ExceptionHandlerMiddleware, RequestIdMiddleware};
/// use lintel_middleware::{LintelError, MiddlewareContext, Pipeline};
/// use lintel_telemetry::NoopPublisher;
///
/// # tokio_test::block_on(async {
/// let pipeline = Pipeline::builder()
///     .stage(RequestIdMiddleware::new())
///     .stage(ExceptionHandlerMiddleware::new(NoopPublisher))
///     .build();
///
/// let request = http::Request::new(Full::new(Bytes::new()));
/// let response = pipeline
///     .process(MiddlewareContext::new(), request, |_ctx, _req| {
///         Box::pin(async { Err(LintelError::internal("boom")) })
///     })
///     .await
///     .unwrap();
///
/// assert_eq!(response.status(), 500);
/// # });
/// ```
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Processes a request through every stage and then the handler.
    pub async fn process<H>(
        &self,
        mut ctx: MiddlewareContext,
        request: Request,
        handler: H,
    ) -> HandlerResult
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, HandlerResult>
            + Send
            + 'static,
    {
        self.process_with(&mut ctx, request, handler).await
    }

    /// Like [`process`](Self::process), but leaves the context with the
    /// caller so stage extensions can be inspected afterwards.
    pub async fn process_with<H>(
        &self,
        ctx: &mut MiddlewareContext,
        request: Request,
        handler: H,
    ) -> HandlerResult
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, HandlerResult>
            + Send
            + 'static,
    {
        let next = self.build_chain(handler);
        next.run(ctx, request).await
    }

    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, HandlerResult> + Send + 'a,
    {
        let mut next = Next::handler(handler);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the names of all middleware stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of middleware stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends an already shared stage.
    #[must_use]
    pub fn shared_stage(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
    use http_body_util::Full;
    use lintel_core::LintelError;
    use std::sync::Mutex;

    /// Records entry and exit of each stage.
    struct OrderTrackingMiddleware {
        name: &'static str,
        order: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for OrderTrackingMiddleware {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut MiddlewareContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, HandlerResult> {
            Box::pin(async move {
                self.order.lock().unwrap().push(format!("enter:{}", self.name));
                let result = next.run(ctx, request).await;
                self.order.lock().unwrap().push(format!("exit:{}", self.name));
                result
            })
        }
    }

    fn request() -> Request {
        HttpRequest::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_pipeline_executes_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let tracker = |name| OrderTrackingMiddleware {
            name,
            order: order.clone(),
        };

        let pipeline = Pipeline::builder()
            .stage(tracker("first"))
            .stage(tracker("second"))
            .build();

        let handler_order = order.clone();
        let response = pipeline
            .process(MiddlewareContext::new(), request(), move |_ctx, _req| {
                handler_order.lock().unwrap().push("handler".to_string());
                Box::pin(async {
                    Ok(HttpResponse::builder()
                        .status(StatusCode::OK)
                        .body(Full::new(Bytes::from("OK")))
                        .unwrap())
                })
            })
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            *order.lock().unwrap(),
            vec![
                "enter:first",
                "enter:second",
                "handler",
                "exit:second",
                "exit:first"
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_pipeline_returns_handler_error() {
        let pipeline = Pipeline::builder().build();
        assert_eq!(pipeline.stage_count(), 0);

        let error = pipeline
            .process(MiddlewareContext::new(), request(), |_ctx, _req| {
                Box::pin(async { Err(LintelError::internal("unhandled")) })
            })
            .await
            .unwrap_err();

        assert_eq!(error.message(), "unhandled");
    }

    #[test]
    fn test_stage_names() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::builder()
            .stage(OrderTrackingMiddleware {
                name: "a",
                order: order.clone(),
            })
            .shared_stage(Arc::new(OrderTrackingMiddleware { name: "b", order }))
            .build();

        assert_eq!(pipeline.stage_names(), vec!["a", "b"]);
        assert_eq!(pipeline.stage_count(), 2);
    }
}
