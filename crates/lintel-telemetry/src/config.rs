//! Telemetry configuration.
//!
//! [`TelemetryConfig`] bundles the log subscriber and metrics recorder
//! settings under one service name. The name is copied into both
//! subsystems when the config is built, so log lines and the `service`
//! metric label always agree.

use crate::error::TelemetryError;
use crate::logging::{create_env_filter, LogConfig};
use crate::metrics::MetricsConfig;
use crate::TelemetryResult;

/// Configuration for exception logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to log lines and metrics.
    pub service_name: String,

    /// Deployment environment (production, staging, development).
    pub environment: String,

    /// Metrics configuration.
    pub metrics: MetricsConfig,

    /// Logging configuration.
    pub logging: LogConfig,
}

impl TelemetryConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> TelemetryConfigBuilder {
        TelemetryConfigBuilder::default()
    }

    /// Returns `true` when intercepted failures should also be counted.
    #[must_use]
    pub fn counts_exceptions(&self) -> bool {
        self.metrics.enabled
    }

    /// Checks every setting that would otherwise only fail halfway
    /// through [`init_telemetry`](crate::init_telemetry).
    ///
    /// # Errors
    ///
    /// - `TelemetryError::InvalidConfig` for an empty service name
    /// - `TelemetryError::InvalidAddress` for an unparseable metrics address
    /// - `TelemetryError::InvalidLogFilter` for an unparseable log level
    pub fn validate(&self) -> TelemetryResult<()> {
        if self.service_name.trim().is_empty() {
            return Err(TelemetryError::InvalidConfig(
                "service name must not be empty".to_string(),
            ));
        }

        if self.metrics.enabled {
            self.metrics.socket_addr()?;
        }

        if self.logging.enabled {
            create_env_filter(&self.logging.level)?;
        }

        Ok(())
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "lintel".to_string(),
            environment: "development".to_string(),
            metrics: MetricsConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Builder for [`TelemetryConfig`].
///
/// ```
/// use lintel_telemetry::TelemetryConfig;
///
/// let config = TelemetryConfig::builder()
///     .service_name("orders")
///     .log_level("lintel_middleware=debug,info")
///     .count_exceptions()
///     .build();
///
/// assert!(config.counts_exceptions());
/// assert_eq!(config.logging.service_name, "orders");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Default)]
pub struct TelemetryConfigBuilder {
    config: TelemetryConfig,
}

impl TelemetryConfigBuilder {
    /// Sets the service name.
    #[must_use]
    pub fn service_name(mut self, name: &str) -> Self {
        self.config.service_name = name.to_string();
        self
    }

    /// Sets the environment.
    #[must_use]
    pub fn environment(mut self, env: &str) -> Self {
        self.config.environment = env.to_string();
        self
    }

    /// Replaces the logging configuration.
    #[must_use]
    pub fn logging(mut self, config: LogConfig) -> Self {
        self.config.logging = config;
        self
    }

    /// Sets the log level or filter directive.
    #[must_use]
    pub fn log_level(mut self, level: &str) -> Self {
        self.config.logging.level = level.to_string();
        self
    }

    /// Replaces the metrics configuration.
    #[must_use]
    pub fn metrics(mut self, config: MetricsConfig) -> Self {
        self.config.metrics = config;
        self
    }

    /// Counts intercepted failures without serving them over HTTP.
    ///
    /// Read the counters with [`render_metrics`](crate::render_metrics).
    #[must_use]
    pub fn count_exceptions(mut self) -> Self {
        self.config.metrics.enabled = true;
        self
    }

    /// Counts intercepted failures and serves `/metrics` on `addr`.
    #[must_use]
    pub fn metrics_addr(mut self, addr: &str) -> Self {
        self.config.metrics.enabled = true;
        self.config.metrics.addr = Some(addr.to_string());
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> TelemetryConfig {
        let mut config = self.config;
        config.metrics.service_name.clone_from(&config.service_name);
        config.logging.service_name.clone_from(&config.service_name);
        config
    }
}
