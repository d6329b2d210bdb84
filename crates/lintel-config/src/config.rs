//! Main configuration types.
//!
//! This module provides the top-level [`LintelConfig`] struct and its builder.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ExceptionHandlerConfig, LogFormat, TelemetrySection};

/// Complete Lintel configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use lintel_config::LintelConfig;
///
/// let config = LintelConfig::default();
/// assert_eq!(config.exception_handler.status_code, 500);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct LintelConfig {
    /// Exception handler configuration.
    #[serde(default)]
    pub exception_handler: ExceptionHandlerConfig,

    /// Telemetry configuration (metrics and logging).
    #[serde(default)]
    pub telemetry: TelemetrySection,
}

impl LintelConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> LintelConfigBuilder {
        LintelConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The exception handler status is not in `400..=599`
    /// - Metrics are enabled with an address that does not parse
    /// - The log level is not a valid filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.exception_handler.status()?;

        if self.telemetry.metrics.enabled {
            if let Some(addr) = &self.telemetry.metrics.addr {
                if addr.parse::<std::net::SocketAddr>().is_err() {
                    return Err(ConfigError::invalid_value(
                        "telemetry.metrics.addr",
                        format!("invalid socket address: {addr}"),
                    ));
                }
            }
        }

        if self.telemetry.logging.enabled {
            lintel_telemetry::logging::create_env_filter(&self.telemetry.logging.level)
                .map_err(|e| ConfigError::invalid_value("telemetry.logging.level", e.to_string()))?;
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// - Pretty log formatting with span events and locations
    /// - Debug log level
    /// - Stack traces in error responses
    ///
    /// # Example
    ///
    /// ```
    /// use lintel_config::LintelConfig;
    ///
    /// let config = LintelConfig::development();
    /// assert!(config.exception_handler.include_stack_trace);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.logging.span_events = true;
        config.telemetry.logging.include_location = true;
        config.telemetry.environment = "development".to_string();

        config.exception_handler.include_stack_trace = true;

        config
    }

    /// Create a production configuration preset.
    ///
    /// - JSON log formatting at info level
    /// - Metrics enabled
    /// - No stack traces in error responses
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;
        config.telemetry.environment = "production".to_string();
        config.telemetry.metrics.enabled = true;

        config.exception_handler.include_stack_trace = false;

        config
    }
}

/// Builder for [`LintelConfig`].
#[derive(Debug, Default)]
pub struct LintelConfigBuilder {
    exception_handler: Option<ExceptionHandlerConfig>,
    telemetry: Option<TelemetrySection>,
}

impl LintelConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the exception handler configuration.
    #[must_use]
    pub fn exception_handler(mut self, exception_handler: ExceptionHandlerConfig) -> Self {
        self.exception_handler = Some(exception_handler);
        self
    }

    /// Set the telemetry configuration.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetrySection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> LintelConfig {
        LintelConfig {
            exception_handler: self.exception_handler.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<LintelConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
