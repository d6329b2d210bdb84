//! Exception telemetry for Lintel.
//!
//! - **Events**: [`TelemetryEvent`] describes one intercepted failure
//! - **Publishers**: [`TelemetryPublisher`] sinks that receive events
//! - **Logging**: structured JSON or pretty logs via `tracing-subscriber`
//! - **Metrics**: Prometheus counters via the `metrics` crate
//!
//! # Publishers
//!
//! | Publisher | Destination |
//! |-----------|-------------|
//! | [`TracingPublisher`] | `tracing` event (`WARN` for bad requests, `ERROR` otherwise) |
//! | [`MetricsPublisher`] | `lintel_exceptions_total{exception_type, status}` |
//! | [`ChannelPublisher`] | tokio unbounded channel |
//! | [`MemoryPublisher`] | in-memory list |
//! | [`FanoutPublisher`] | several publishers |
//! | [`NoopPublisher`] | nowhere |
//!
//! # Example
//!
//! ```rust,ignore
//! use lintel_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::builder()
//!     .service_name("orders")
//!     .metrics_addr("0.0.0.0:9090")
//!     .build();
//!
//! let publisher = init_telemetry(&config)?;
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
mod event;
pub mod logging;
pub mod metrics;
mod publisher;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use event::TelemetryEvent;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, render_metrics, MetricsConfig};
pub use publisher::{
    ChannelPublisher, FanoutPublisher, MemoryPublisher, MetricsPublisher, NoopPublisher,
    TelemetryPublisher, TracingPublisher,
};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging and metrics and returns the matching publisher.
///
/// The publisher always logs through [`TracingPublisher`] and also counts
/// through [`MetricsPublisher`] when metrics are enabled.
///
/// The whole config is validated before any global is installed.
///
/// # Errors
///
/// Returns `TelemetryError` if the config is invalid or any subsystem
/// fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<FanoutPublisher> {
    config.validate()?;
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;

    tracing::info!(
        service.name = %config.service_name,
        environment = %config.environment,
        metrics = config.metrics.enabled,
        "Telemetry initialized"
    );

    Ok(default_publisher(config))
}

/// Builds the publisher [`init_telemetry`] returns, without initializing
/// anything global.
#[must_use]
pub fn default_publisher(config: &TelemetryConfig) -> FanoutPublisher {
    let publisher = FanoutPublisher::new().with(TracingPublisher);
    if config.counts_exceptions() {
        publisher.with(MetricsPublisher)
    } else {
        publisher
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_publisher_follows_metrics_flag() {
        let config = TelemetryConfig::default();
        assert_eq!(default_publisher(&config).len(), 1);

        let config = TelemetryConfig::builder().count_exceptions().build();
        assert_eq!(default_publisher(&config).len(), 2);
    }

    #[test]
    fn test_init_telemetry_rejects_invalid_config_up_front() {
        let config = TelemetryConfig::builder().log_level("lintel=loud").build();
        let err = init_telemetry(&config).unwrap_err();
        assert!(err.is_config_error());
    }
}
