//! # Lintel Middleware
//!
//! Request pipeline and exception handling for Lintel services.
//!
//! A [`Pipeline`] wraps a terminal handler in an ordered list of stages.
//! Handlers return [`HandlerResult`], so any failure is an ordinary
//! `Err(LintelError)` that flows back out through the stages. The
//! [`ExceptionHandlerMiddleware`](stages::ExceptionHandlerMiddleware) turns
//! those failures, and panics, into JSON error responses and reports each
//! one to a telemetry publisher.
//!
//! ```text
//! Request → RequestId → ExceptionHandler → Handler
//!                                             ↓
//! Response ← RequestId ← ExceptionHandler ←───┘
//! ```
//!
//! ## Error responses
//!
//! | Failure                 | Status              | Body                                  |
//! |-------------------------|---------------------|---------------------------------------|
//! | `LintelError::BadRequest` | `400`             | `{"message", "errors"?}`              |
//! | anything else, or panic | configured (`500`)  | `{"message", "stackTrace"?}`          |
//!
//! If the handler already started the response (see
//! [`MiddlewareContext::mark_response_started`]) the failure is reported and
//! the original error is returned unchanged.

#![doc(html_root_url = "https://docs.rs/lintel-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

// Re-export main types at crate root
pub use context::{MiddlewareContext, ResponseStarted};
pub use lintel_core::LintelError;
pub use middleware::{BoxFuture, FnMiddleware, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder};
pub use types::{HandlerResult, Request, Response, ResponseExt, APPLICATION_JSON};
