//! Metrics emitted while resolving configuration.
//!
//! Recording is a no-op until the host installs a `metrics` recorder.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `stratum_cache_downgrades_total` | Counter | `action` | Rewritten cache entries |
//! | `stratum_layer_files_total` | Counter | - | Override files applied |
//! | `stratum_env_overrides_total` | Counter | - | Environment overrides applied |
//! | `stratum_resolution_duration_seconds` | Histogram | `kind` | Resolution latency |

use std::time::Duration;

use ::metrics::{counter, describe_counter, describe_histogram, histogram};

/// Counter of rewritten cache entries.
pub const CACHE_DOWNGRADES_TOTAL: &str = "stratum_cache_downgrades_total";

/// Counter of override files applied.
pub const LAYER_FILES_TOTAL: &str = "stratum_layer_files_total";

/// Counter of environment overrides applied.
pub const ENV_OVERRIDES_TOTAL: &str = "stratum_env_overrides_total";

/// Histogram of full resolution time.
pub const RESOLUTION_DURATION_SECONDS: &str = "stratum_resolution_duration_seconds";

/// Registers descriptions for every Stratum metric.
pub fn describe_metrics() {
    describe_counter!(
        CACHE_DOWNGRADES_TOTAL,
        "Cache configurations rewritten to non-persistent storage"
    );
    describe_counter!(LAYER_FILES_TOTAL, "Context override files applied");
    describe_counter!(
        ENV_OVERRIDES_TOTAL,
        "Configuration values overridden from the environment"
    );
    describe_histogram!(
        RESOLUTION_DURATION_SECONDS,
        "Time to resolve configuration for a context in seconds"
    );
}

/// Records one rewritten cache entry.
pub fn record_cache_downgrade(action: &str) {
    counter!(CACHE_DOWNGRADES_TOTAL, "action" => action.to_string()).increment(1);
}

/// Records applied override files.
pub fn record_layer_files(count: usize) {
    counter!(LAYER_FILES_TOTAL).increment(count as u64);
}

/// Records applied environment overrides.
pub fn record_env_overrides(count: usize) {
    counter!(ENV_OVERRIDES_TOTAL).increment(count as u64);
}

/// Records a completed resolution.
///
/// `kind` is the context kind label, e.g. `development`.
pub fn record_resolution(kind: &str, duration: Duration) {
    histogram!(RESOLUTION_DURATION_SECONDS, "kind" => kind.to_string())
        .record(duration.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_functions_dont_panic() {
        describe_metrics();
        record_cache_downgrade("null_backend");
        record_layer_files(2);
        record_env_overrides(0);
        record_resolution("production", Duration::from_millis(3));
    }

    #[test]
    fn test_metric_names() {
        assert!(CACHE_DOWNGRADES_TOTAL.starts_with("stratum_"));
        assert!(RESOLUTION_DURATION_SECONDS.ends_with("_seconds"));
    }
}
