//! Built-in middleware stages.
//!
//! 1. [`request_id`] - Generate/propagate request ID
//! 2. [`exception`] - Turn failures into JSON error responses and report them
//!
//! Register the request ID stage first so the exception handler sees the
//! final request ID and error responses carry the header.

pub mod exception;
pub mod request_id;

pub use exception::{ExceptionHandlerMiddleware, HandledException};
pub use request_id::{RequestIdMiddleware, REQUEST_ID_HEADER};
