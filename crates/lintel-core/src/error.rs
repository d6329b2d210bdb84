//! Error types for Lintel.
//!
//! [`LintelError`] is the failure type handlers return into the middleware
//! pipeline. The exception handler turns it into one of two JSON payloads:
//!
//! | Variant             | Status             | Body               |
//! |---------------------|--------------------|--------------------|
//! | `BadRequest`        | `400`              | [`BadRequestBody`] |
//! | `Internal`, `Panic` | configured (`500`) | [`ErrorBody`]      |
//!
//! An `Aggregate` is answered as its first inner error.

use lintel_typename::{PathSegment, TypeDescriptor, TypePath};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::BTreeMap;
use thiserror::Error;

/// Result type alias using [`LintelError`].
pub type LintelResult<T> = Result<T, LintelError>;

/// Standard error type for Lintel handlers.
///
/// # Example
///
/// ```
/// use lintel_core::LintelError;
///
/// fn parse_quantity(raw: &str) -> Result<u32, LintelError> {
///     raw.parse()
///         .map_err(|_| LintelError::bad_request("quantity must be a number"))
/// }
///
/// assert!(parse_quantity("x").unwrap_err().is_bad_request());
/// ```
#[derive(Error, Debug)]
pub enum LintelError {
    /// The request was malformed.
    #[error("Bad request: {message}")]
    BadRequest {
        /// Human-readable error message.
        message: String,
        /// Field-specific validation errors.
        field_errors: Option<FieldErrors>,
    },

    /// Several failures reported together.
    #[error("{} error(s) occurred", .errors.len())]
    Aggregate {
        /// The inner errors, in the order they occurred.
        errors: Vec<LintelError>,
    },

    /// Any other failure.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
        /// `std::any::type_name` of the underlying error, when known.
        type_name: Option<&'static str>,
        /// Backtrace captured at construction, when `RUST_BACKTRACE` enables it.
        stack_trace: Option<String>,
    },

    /// A handler panicked.
    #[error("Handler panicked: {message}")]
    Panic {
        /// The panic message.
        message: String,
    },
}

impl LintelError {
    /// Creates a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            field_errors: None,
        }
    }

    /// Creates a bad request error with field-specific errors.
    #[must_use]
    pub fn bad_request_with_fields(message: impl Into<String>, field_errors: FieldErrors) -> Self {
        Self::BadRequest {
            message: message.into(),
            field_errors: Some(field_errors),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
            type_name: None,
            stack_trace: capture_stack_trace(),
        }
    }

    /// Creates an internal error with a source error, recording its type.
    pub fn internal_with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: Into<anyhow::Error> + 'static,
    {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
            type_name: Some(std::any::type_name::<E>()),
            stack_trace: capture_stack_trace(),
        }
    }

    /// Wraps any error as an internal error using its display text as message.
    pub fn from_error<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let message = error.to_string();
        Self::internal_with_source(message, error)
    }

    /// Creates an aggregate of several errors.
    #[must_use]
    pub fn aggregate(errors: impl IntoIterator<Item = Self>) -> Self {
        Self::Aggregate {
            errors: errors.into_iter().collect(),
        }
    }

    /// Creates a panic error.
    #[must_use]
    pub fn panic(message: impl Into<String>) -> Self {
        Self::Panic {
            message: message.into(),
        }
    }

    /// Converts a payload caught by `catch_unwind` into a panic error.
    #[must_use]
    pub fn from_panic_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else {
            "no error details".to_string()
        };
        Self::panic(message)
    }

    /// Returns the first non-aggregate error, unwrapping nested aggregates.
    ///
    /// An empty aggregate is returned as is.
    #[must_use]
    pub fn innermost(&self) -> &Self {
        let mut current = self;
        while let Self::Aggregate { errors } = current {
            match errors.first() {
                Some(first) => current = first,
                None => break,
            }
        }
        current
    }

    /// Owned version of [`innermost`](Self::innermost).
    #[must_use]
    pub fn into_innermost(self) -> Self {
        let mut current = self;
        loop {
            match current {
                Self::Aggregate { mut errors } if !errors.is_empty() => {
                    current = errors.swap_remove(0);
                }
                other => return other,
            }
        }
    }

    /// Returns `true` for [`LintelError::BadRequest`].
    #[must_use]
    pub const fn is_bad_request(&self) -> bool {
        matches!(self, Self::BadRequest { .. })
    }

    /// Returns `true` for [`LintelError::Panic`].
    #[must_use]
    pub const fn is_panic(&self) -> bool {
        matches!(self, Self::Panic { .. })
    }

    /// Returns the human-readable message without the variant prefix.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::BadRequest { message, .. }
            | Self::Internal { message, .. }
            | Self::Panic { message } => message.clone(),
            Self::Aggregate { .. } => self.to_string(),
        }
    }

    /// Returns the field errors of a bad request, if any.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::BadRequest {
                field_errors: Some(fields),
                ..
            } => Some(fields),
            _ => None,
        }
    }

    /// Returns the captured stack trace, if any.
    #[must_use]
    pub fn stack_trace(&self) -> Option<&str> {
        match self {
            Self::Internal { stack_trace, .. } => stack_trace.as_deref(),
            _ => None,
        }
    }

    /// Returns the variant name.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "BadRequest",
            Self::Aggregate { .. } => "Aggregate",
            Self::Internal { .. } => "Internal",
            Self::Panic { .. } => "Panic",
        }
    }

    /// Describes the type of this failure.
    ///
    /// Internal errors built from a source report the source's type.
    /// Everything else reports the variant as a nested path, for example
    /// `lintel_core::LintelError::BadRequest`.
    #[must_use]
    pub fn type_descriptor(&self) -> TypeDescriptor {
        if let Self::Internal {
            type_name: Some(name),
            ..
        } = self
        {
            return TypeDescriptor::from_type_name(name);
        }

        TypeDescriptor::Path(TypePath::new(
            ["lintel_core"],
            vec![PathSegment::new("LintelError"), PathSegment::new(self.kind())],
        ))
    }

    /// Builds the generic error payload.
    #[must_use]
    pub fn to_error_body(&self, include_stack_trace: bool) -> ErrorBody {
        ErrorBody {
            message: self.message(),
            stack_trace: if include_stack_trace {
                self.stack_trace().map(ToString::to_string)
            } else {
                None
            },
        }
    }

    /// Builds the bad request payload.
    #[must_use]
    pub fn to_bad_request_body(&self) -> BadRequestBody {
        BadRequestBody {
            message: self.message(),
            errors: self.field_errors().cloned(),
        }
    }
}

impl From<anyhow::Error> for LintelError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<Self>() {
            Ok(inner) => inner,
            Err(error) => Self::Internal {
                message: error.to_string(),
                source: Some(error),
                type_name: None,
                stack_trace: capture_stack_trace(),
            },
        }
    }
}

fn capture_stack_trace() -> Option<String> {
    let trace = Backtrace::capture();
    match trace.status() {
        BacktraceStatus::Captured => Some(trace.to_string()),
        _ => None,
    }
}

/// Field-specific validation errors.
///
/// Serializes as a map of field path to messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors {
    /// Map of field path to list of error messages.
    pub fields: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    /// Creates a new empty `FieldErrors`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an error for a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Builder form of [`add`](Self::add).
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.add(field, message);
        self
    }

    /// Returns `true` if there are no field errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of fields with errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// JSON payload for unhandled failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Error message.
    pub message: String,
    /// Stack trace, only when enabled and captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

/// JSON payload for bad requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadRequestBody {
    /// Error message.
    pub message: String,
    /// Field errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}
