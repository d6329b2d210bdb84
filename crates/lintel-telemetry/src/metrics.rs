//! Prometheus metrics for Lintel.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `lintel_exceptions_total` | Counter | `exception_type`, `status` | Intercepted failures |
//! | `lintel_handled_responses_total` | Counter | `status` | Error responses written |
//!
//! # Example
//!
//! ```rust,ignore
//! use lintel_telemetry::metrics::{init_metrics, render_metrics, MetricsConfig};
//!
//! init_metrics(&MetricsConfig { enabled: true, ..Default::default() })?;
//! println!("{}", render_metrics().unwrap_or_default());
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Name of the exception counter.
pub const EXCEPTIONS_TOTAL: &str = "lintel_exceptions_total";

/// Name of the error response counter.
pub const HANDLED_RESPONSES_TOTAL: &str = "lintel_handled_responses_total";

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Address to serve `/metrics` on (e.g., "0.0.0.0:9090").
    ///
    /// When `None`, the recorder is installed without a listener and
    /// metrics are read with [`render_metrics`].
    pub addr: Option<String>,

    /// Service name, attached to every metric as the `service` label.
    pub service_name: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: None,
            service_name: "lintel".to_string(),
        }
    }
}

impl MetricsConfig {
    /// Parses the listener address, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError::InvalidAddress` if the address does not parse.
    pub fn socket_addr(&self) -> TelemetryResult<Option<SocketAddr>> {
        self.addr
            .as_deref()
            .map(|addr| {
                addr.parse::<SocketAddr>()
                    .map_err(|e| TelemetryError::InvalidAddress {
                        addr: addr.to_string(),
                        reason: e.to_string(),
                    })
            })
            .transpose()
    }
}

/// Initializes the metrics subsystem.
///
/// Serving `/metrics` over HTTP requires a running tokio runtime.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for an unparseable address and
/// `TelemetryError::MetricsInit` if a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr = config.socket_addr()?;
    let builder = PrometheusBuilder::new().add_global_label("service", &config.service_name);

    let handle = match addr {
        Some(addr) => {
            let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
                TelemetryError::MetricsInit(
                    "serving metrics over HTTP requires a tokio runtime".to_string(),
                )
            })?;
            let _entered = runtime.enter();

            let (recorder, exporter) = builder
                .with_http_listener(addr)
                .build()
                .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
            let handle = recorder.handle();
            metrics::set_global_recorder(recorder)
                .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

            runtime.spawn(async move {
                if let Err(e) = exporter.await {
                    tracing::error!(error = ?e, "Metrics exporter stopped");
                }
            });
            tracing::info!(%addr, "Serving Prometheus metrics");
            handle
        }
        None => builder
            .install_recorder()
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?,
    };

    let _ = METRICS_HANDLE.set(handle);
    register_metric_descriptions();

    Ok(())
}

/// Renders metrics in Prometheus format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(
        EXCEPTIONS_TOTAL,
        "Total number of failures intercepted by the exception handler"
    );
    describe_counter!(
        HANDLED_RESPONSES_TOTAL,
        "Total number of error responses written by the exception handler"
    );
}

/// Records an intercepted failure.
///
/// # Arguments
///
/// * `exception_type` - Short type name of the failure
/// * `status` - Status label (`"500"`, `"response_started"`, ...)
pub fn record_exception(exception_type: &str, status: &str) {
    counter!(
        EXCEPTIONS_TOTAL,
        "exception_type" => exception_type.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Records an error response written by the exception handler.
pub fn record_handled_response(status_code: u16) {
    counter!(HANDLED_RESPONSES_TOTAL, "status" => status_code.to_string()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.addr, None);
        assert_eq!(config.service_name, "lintel");
    }

    #[test]
    fn test_socket_addr() {
        let config = MetricsConfig {
            addr: Some("127.0.0.1:9090".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.socket_addr().unwrap(),
            Some("127.0.0.1:9090".parse().unwrap())
        );

        let config = MetricsConfig {
            addr: Some("not an address".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.socket_addr(),
            Err(TelemetryError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_disabled_metrics_is_noop() {
        assert!(init_metrics(&MetricsConfig::default()).is_ok());
    }

    #[test]
    fn test_record_functions_dont_panic() {
        // No recorder is installed in unit tests; the metrics crate drops these.
        record_exception("LintelError::Internal", "500");
        record_handled_response(500);
    }
}
