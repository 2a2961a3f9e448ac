//! Observability for Stratum.
//!
//! - **Logging**: structured JSON or pretty output on stderr via
//!   `tracing-subscriber`
//! - **Metrics**: counters and histograms via the `metrics` facade, picked up
//!   by whatever recorder the host installs
//!
//! # Example
//!
//! ```rust,ignore
//! use stratum_telemetry::{init_telemetry, LogConfig};
//!
//! init_telemetry(&LogConfig::development())?;
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use crate::metrics::describe_metrics;

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging and registers metric descriptions.
///
/// # Errors
///
/// Returns `TelemetryError` if logging fails to initialize.
pub fn init_telemetry(config: &LogConfig) -> TelemetryResult<()> {
    init_logging(config)?;
    describe_metrics();
    Ok(())
}
