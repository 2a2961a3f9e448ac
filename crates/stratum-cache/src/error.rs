//! Cache registry error types.

use thiserror::Error;

/// Result type for cache registry operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors raised while reading cache configuration from a tree.
///
/// Malformed entries are never an error: they are read as undeclared and
/// take the fallback rule. The downgrade pass itself never fails.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The registry section is not a table of entries.
    #[error("cache registry at {path} must be a table of cache configurations")]
    InvalidRegistry {
        /// Tree path of the registry section.
        path: String,
    },
}
