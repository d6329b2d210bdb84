//! Errors raised while setting up telemetry.
//!
//! Publishing an event never fails; only installing the global log
//! subscriber or metrics recorder can.

use thiserror::Error;

/// Telemetry setup failures.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The Prometheus recorder or its listener could not be installed.
    #[error("cannot install metrics recorder: {0}")]
    MetricsInit(String),

    /// The global `tracing` subscriber could not be installed.
    #[error("cannot install log subscriber: {0}")]
    LoggingInit(String),

    /// A log level or filter directive did not parse.
    #[error("invalid log filter `{filter}`: {reason}")]
    InvalidLogFilter {
        /// The rejected directive.
        filter: String,
        /// Parser message.
        reason: String,
    },

    /// The metrics listener address did not parse.
    #[error("invalid metrics address `{addr}`: {reason}")]
    InvalidAddress {
        /// The rejected address.
        addr: String,
        /// Parser message.
        reason: String,
    },

    /// A required setting is missing or empty.
    #[error("invalid telemetry configuration: {0}")]
    InvalidConfig(String),
}

impl TelemetryError {
    /// Returns `true` when the failure comes from a bad setting rather
    /// than from installing a global.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidLogFilter { .. } | Self::InvalidAddress { .. } | Self::InvalidConfig(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::InvalidAddress {
            addr: "nowhere".to_string(),
            reason: "invalid socket address syntax".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid metrics address `nowhere`: invalid socket address syntax"
        );

        let err = TelemetryError::LoggingInit("already set".to_string());
        assert_eq!(err.to_string(), "cannot install log subscriber: already set");
    }

    #[test]
    fn test_config_errors_are_classified() {
        assert!(TelemetryError::InvalidConfig("empty service name".to_string()).is_config_error());
        assert!(TelemetryError::InvalidLogFilter {
            filter: "x=y".to_string(),
            reason: "bad".to_string(),
        }
        .is_config_error());
        assert!(!TelemetryError::MetricsInit("taken".to_string()).is_config_error());
    }
}
