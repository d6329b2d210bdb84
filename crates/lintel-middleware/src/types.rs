//! Common types used throughout the middleware pipeline.

use bytes::Bytes;
use http_body_util::Full;
use lintel_core::LintelError;
use serde::Serialize;

/// The HTTP request type used in the middleware pipeline.
///
/// This is a standard `http::Request` with a `Full<Bytes>` body.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the middleware pipeline.
///
/// This is a standard `http::Response` with a `Full<Bytes>` body.
pub type Response = http::Response<Full<Bytes>>;

/// What a handler or middleware stage produces.
pub type HandlerResult = Result<Response, LintelError>;

/// The content type of every error payload.
pub const APPLICATION_JSON: &str = "application/json";

/// Extension trait for building JSON responses.
pub trait ResponseExt {
    /// Creates a response with `body` serialized as JSON.
    fn json<T: Serialize>(status: http::StatusCode, body: &T) -> HandlerResult;
}

impl ResponseExt for Response {
    fn json<T: Serialize>(status: http::StatusCode, body: &T) -> HandlerResult {
        let bytes = serde_json::to_vec(body).map_err(LintelError::from_error)?;

        http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, APPLICATION_JSON)
            .body(Full::new(Bytes::from(bytes)))
            .map_err(LintelError::from_error)
    }
}
