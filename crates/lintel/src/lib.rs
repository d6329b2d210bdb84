//! # Lintel
//!
//! **Type-name rendering and exception handling for HTTP services**
//!
//! - **Type names** – Render `std::any::type_name` output or hand-built
//!   descriptors as readable names (`Vec<String>`, `[[u8; 2]; 3]`)
//! - **Exception handling** – Turn handler errors and panics into JSON
//!   error responses
//! - **Telemetry** – Report every intercepted failure to a pluggable
//!   publisher, structured logs and Prometheus metrics
//! - **Configuration** – Layered TOML/JSON/env configuration
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lintel::prelude::*;
//! use std::sync::Arc;
//!
//! let config = ConfigLoader::new().with_env_prefix("LINTEL").load()?;
//! let publisher = init_telemetry(&config.telemetry.to_telemetry_config())?;
//! let pipeline = lintel::exception_pipeline(&config, Arc::new(publisher))?;
//!
//! let response = pipeline
//!     .process(MiddlewareContext::new(), request, |_ctx, _req| {
//!         Box::pin(async { Err(LintelError::bad_request("missing sku")) })
//!     })
//!     .await?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → RequestId → ExceptionHandler → Handler
//!                                             ↓
//! Response ← RequestId ← ExceptionHandler ←───┘
//!                              │
//!                              └→ TelemetryPublisher
//! ```

#![doc(html_root_url = "https://docs.rs/lintel/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::sync::Arc;

// Re-export type-name rendering
pub use lintel_typename as typename;

// Re-export core types
pub use lintel_core as core;

// Re-export telemetry types
pub use lintel_telemetry as telemetry;

// Re-export middleware types
pub use lintel_middleware as middleware;

// Re-export configuration types
pub use lintel_config as config;

/// Builds the standard pipeline from configuration: request IDs first,
/// then the exception handler reporting to `publisher`.
///
/// # Errors
///
/// Returns `ConfigError` if the exception handler section is invalid.
pub fn exception_pipeline(
    config: &lintel_config::LintelConfig,
    publisher: Arc<dyn lintel_telemetry::TelemetryPublisher>,
) -> Result<lintel_middleware::Pipeline, lintel_config::ConfigError> {
    let handler = config.exception_handler.build(publisher)?;

    Ok(lintel_middleware::Pipeline::builder()
        .stage(lintel_middleware::stages::RequestIdMiddleware::new())
        .stage(handler)
        .build())
}

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use lintel::prelude::*;
///
/// assert_eq!(short_type_name::<Vec<String>>(), "Vec<String>");
/// ```
pub mod prelude {
    pub use lintel_typename::{
        format_type_name, short_type_name, type_display_name, TypeDescriptor, TypeNameOptions,
    };

    pub use lintel_core::{FieldErrors, LintelError, LintelResult, RequestId};

    pub use lintel_telemetry::{
        init_telemetry, FanoutPublisher, MemoryPublisher, TelemetryEvent, TelemetryPublisher,
        TracingPublisher,
    };

    pub use lintel_middleware::stages::{
        ExceptionHandlerMiddleware, HandledException, RequestIdMiddleware,
    };
    pub use lintel_middleware::{
        HandlerResult, Middleware, MiddlewareContext, Next, Pipeline, Request, Response,
        ResponseExt,
    };

    pub use lintel_config::{ConfigLoader, LintelConfig};
}
