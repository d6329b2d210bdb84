//! # Lintel Core
//!
//! Core types shared by the Lintel crates:
//!
//! - [`LintelError`] - Failure type returned by handlers
//! - [`ErrorBody`] / [`BadRequestBody`] - JSON payloads written for failures
//! - [`FieldErrors`] - Per-field validation messages
//! - [`RequestId`] - UUID v7 request identifier

#![doc(html_root_url = "https://docs.rs/lintel-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod request_id;

pub use error::{BadRequestBody, ErrorBody, FieldErrors, LintelError, LintelResult};
pub use request_id::RequestId;
