//! Exception telemetry events.

use chrono::{DateTime, Utc};
use lintel_core::{LintelError, RequestId};
use serde::{Deserialize, Serialize};

/// A single intercepted failure, as reported to a
/// [`TelemetryPublisher`](crate::TelemetryPublisher).
///
/// # Example
///
/// ```
/// use lintel_core::{LintelError, RequestId};
/// use lintel_telemetry::TelemetryEvent;
///
/// let error = LintelError::bad_request("missing sku");
/// let event = TelemetryEvent::from_error(&error)
///     .with_request(RequestId::new(), "POST", "/orders")
///     .with_status(Some(400));
///
/// assert_eq!(event.exception_type, "LintelError::BadRequest");
/// assert!(event.bad_request);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Request the failure belongs to.
    pub request_id: RequestId,

    /// HTTP method.
    pub method: String,

    /// Request path.
    pub path: String,

    /// Short type name of the failure.
    pub exception_type: String,

    /// Failure message.
    pub message: String,

    /// Status code written for the failure, `None` when no response was
    /// produced because the response had already started.
    pub status_code: Option<u16>,

    /// Whether the response had already started when the failure was seen.
    pub response_started: bool,

    /// Whether the failure is a bad request.
    pub bad_request: bool,

    /// When the failure was intercepted.
    pub timestamp: DateTime<Utc>,
}

impl TelemetryEvent {
    /// Creates an event describing `error`.
    ///
    /// Request fields start empty and are filled in with
    /// [`with_request`](Self::with_request).
    #[must_use]
    pub fn from_error(error: &LintelError) -> Self {
        Self {
            request_id: RequestId::new(),
            method: String::new(),
            path: String::new(),
            exception_type: error.type_descriptor().short_name(),
            message: error.message(),
            status_code: None,
            response_started: false,
            bad_request: error.is_bad_request(),
            timestamp: Utc::now(),
        }
    }

    /// Sets the request the failure belongs to.
    #[must_use]
    pub fn with_request(
        mut self,
        request_id: RequestId,
        method: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        self.request_id = request_id;
        self.method = method.into();
        self.path = path.into();
        self
    }

    /// Sets the status code written for the failure.
    #[must_use]
    pub fn with_status(mut self, status_code: Option<u16>) -> Self {
        self.status_code = status_code;
        self
    }

    /// Marks whether the response had already started.
    #[must_use]
    pub fn with_response_started(mut self, started: bool) -> Self {
        self.response_started = started;
        self
    }

    /// Label used for the status dimension in logs and metrics.
    #[must_use]
    pub fn status_label(&self) -> String {
        match self.status_code {
            Some(code) => code.to_string(),
            None if self.response_started => "response_started".to_string(),
            None => "none".to_string(),
        }
    }
}
