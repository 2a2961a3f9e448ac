//! Telemetry error types.

use thiserror::Error;

/// Errors raised while installing the log subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global subscriber could not be installed.
    #[error("logging setup failed: {0}")]
    LoggingInit(String),

    /// The filter directive does not parse.
    #[error("{0}")]
    InvalidFilter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::LoggingInit("subscriber already set".to_string());
        assert_eq!(err.to_string(), "logging setup failed: subscriber already set");
    }

    #[test]
    fn test_filter_error_carries_directive() {
        let err = crate::logging::create_env_filter("stratum=loud").unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidFilter(_)));
        assert!(err.to_string().contains("stratum=loud"));
    }
}
