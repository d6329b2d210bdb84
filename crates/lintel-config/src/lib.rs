//! Typed configuration for Lintel.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides (`PREFIX__SECTION__KEY`)
//! - `.env` files via `dotenvy`
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → files → env)
//!
//! # Example
//!
//! ```no_run
//! use lintel_config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("lintel.toml")?
//!     .with_dotenv()?
//!     .with_env_prefix("LINTEL")
//!     .load()?;
//!
//! let publisher = lintel_telemetry::init_telemetry(&config.telemetry.to_telemetry_config())?;
//! let handler = config.exception_handler.build(std::sync::Arc::new(publisher))?;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [exception_handler]
//! status_code = 500
//! include_stack_trace = false
//!
//! [telemetry]
//! service_name = "orders"
//! environment = "production"
//!
//! [telemetry.metrics]
//! enabled = true
//! addr = "0.0.0.0:9090"
//!
//! [telemetry.logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ```

#![doc(html_root_url = "https://docs.rs/lintel-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{LintelConfig, LintelConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{
    ExceptionHandlerConfig, LogFormat, LoggingSection, MetricsSection, TelemetrySection,
};
