//! Startup error type.

use stratum_cache::CacheError;
use stratum_config::ConfigError;
use thiserror::Error;

/// Result type for bootstrap operations.
pub type StratumResult<T> = Result<T, StratumError>;

/// Any failure that aborts startup.
#[derive(Debug, Error)]
pub enum StratumError {
    /// Context parsing, layer resolution or override file failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Malformed cache registry in the resolved tree.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl StratumError {
    /// Returns `true` when a file outside the sandbox was rejected.
    pub fn is_security_violation(&self) -> bool {
        matches!(self, Self::Config(e) if e.is_security_violation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparent_display() {
        let err: StratumError = ConfigError::file_not_found("/srv/context/1_env/Live.toml").into();
        assert!(err.to_string().contains("Live.toml"));
        assert!(!err.is_security_violation());

        let err: StratumError = CacheError::InvalidRegistry {
            path: "SYS.caching.cacheConfigurations".to_string(),
        }
        .into();
        assert!(err.to_string().contains("SYS.caching.cacheConfigurations"));
    }
}
