//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use crate::ConfigError;
use http::StatusCode;
use lintel_middleware::stages::ExceptionHandlerMiddleware;
use lintel_telemetry::{LogConfig, MetricsConfig, TelemetryConfig, TelemetryPublisher};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Exception handler configuration section.
///
/// # Example
///
/// ```
/// use lintel_config::ExceptionHandlerConfig;
///
/// let config = ExceptionHandlerConfig {
///     status_code: 503,
///     include_stack_trace: false,
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExceptionHandlerConfig {
    /// Status written for every failure except bad requests.
    #[serde(default = "default_status_code")]
    pub status_code: u16,

    /// Whether captured stack traces are written into error responses.
    #[serde(default)]
    pub include_stack_trace: bool,
}

impl Default for ExceptionHandlerConfig {
    fn default() -> Self {
        Self {
            status_code: default_status_code(),
            include_stack_trace: false,
        }
    }
}

impl ExceptionHandlerConfig {
    /// Parses the configured status code.
    ///
    /// Only `400..=599` is accepted, since a success or redirect status would
    /// hide the failure from clients.
    pub fn status(&self) -> Result<StatusCode, ConfigError> {
        if !(400..=599).contains(&self.status_code) {
            return Err(ConfigError::invalid_value(
                "exception_handler.status_code",
                format!("{} is not an error status (400..=599)", self.status_code),
            ));
        }

        StatusCode::from_u16(self.status_code)
            .map_err(|e| ConfigError::invalid_value("exception_handler.status_code", e.to_string()))
    }

    /// Builds the exception handler this section describes.
    ///
    /// # Example
    ///
    /// ```
    /// use lintel_config::ExceptionHandlerConfig;
    /// use lintel_telemetry::NoopPublisher;
    /// use std::sync::Arc;
    ///
    /// let config = ExceptionHandlerConfig {
    ///     status_code: 502,
    ///     include_stack_trace: true,
    /// };
    /// let handler = config.build(Arc::new(NoopPublisher)).unwrap();
    ///
    /// assert_eq!(handler.configured_status(), 502);
    /// assert!(handler.includes_stack_trace());
    /// ```
    pub fn build(
        &self,
        publisher: Arc<dyn TelemetryPublisher>,
    ) -> Result<ExceptionHandlerMiddleware, ConfigError> {
        Ok(ExceptionHandlerMiddleware::with_publisher(publisher)
            .status_code(self.status()?)
            .include_stack_trace(self.include_stack_trace))
    }
}

fn default_status_code() -> u16 {
    500
}

/// Metrics configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Enable Prometheus metrics.
    #[serde(default)]
    pub enabled: bool,

    /// Address to serve `/metrics` on. Without one the recorder is installed
    /// and read in-process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addr: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON structured logs.
    #[default]
    Json,
    /// Human-readable logs.
    Pretty,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Emit span open and close events.
    #[serde(default)]
    pub span_events: bool,

    /// Include file and line in log records.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            span_events: false,
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telemetry configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TelemetrySection {
    /// Service name attached to logs and metrics.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Deployment environment.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            environment: default_environment(),
            metrics: MetricsSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

impl TelemetrySection {
    /// Converts this section into the runtime telemetry configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use lintel_config::TelemetrySection;
    ///
    /// let section = TelemetrySection {
    ///     service_name: "billing".to_string(),
    ///     ..Default::default()
    /// };
    /// let config = section.to_telemetry_config();
    ///
    /// assert_eq!(config.logging.service_name, "billing");
    /// assert_eq!(config.metrics.service_name, "billing");
    /// ```
    #[must_use]
    pub fn to_telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig {
            service_name: self.service_name.clone(),
            environment: self.environment.clone(),
            metrics: MetricsConfig {
                enabled: self.metrics.enabled,
                addr: self.metrics.addr.clone(),
                service_name: self.service_name.clone(),
            },
            logging: LogConfig {
                enabled: self.logging.enabled,
                level: self.logging.level.clone(),
                json_format: self.logging.format == LogFormat::Json,
                span_events: self.logging.span_events,
                file_line_info: self.logging.include_location,
                include_target: true,
                service_name: self.service_name.clone(),
            },
        }
    }
}

fn default_service_name() -> String {
    "lintel".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_true() -> bool {
    true
}
