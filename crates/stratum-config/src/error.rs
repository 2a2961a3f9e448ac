//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration resolution.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while resolving configuration.
///
/// Every variant except [`ConfigError::EnvironmentOverlayMalformed`] is fatal
/// to startup: the resolver never continues with a partially applied tree.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A context label contains characters outside `[A-Za-z0-9_-]`.
    #[error(
        "context parts may only contain the characters a-z, A-Z, 0-9, _ and -, \
         but part \"{segment}\" of context \"{context}\" does not"
    )]
    InvalidContextFormat {
        /// The offending slash-delimited segment.
        segment: String,
        /// The full raw context string.
        context: String,
    },

    /// The sandbox root does not exist or cannot be canonicalized.
    #[error("configuration sandbox {} is not available", .path.display())]
    SandboxUnavailable {
        /// Path that was configured as sandbox root.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// No layer directory exists for an ordinal referenced by the context.
    #[error(
        "part {ordinal} (\"{segment}\") of context \"{context}\" has no corresponding folder; \
         the folder must be located inside {} and start with \"{ordinal}_\", \
         for example {}",
        .root.display(),
        .example.display()
    )]
    LayerDirectoryMissing {
        /// The 1-based ordinal that has no directory.
        ordinal: usize,
        /// The context segment that referenced the ordinal.
        segment: String,
        /// The full raw context string.
        context: String,
        /// The canonical sandbox root.
        root: PathBuf,
        /// An example directory name that would satisfy the ordinal.
        example: PathBuf,
    },

    /// The override file for a context label does not exist.
    #[error("override file {} does not exist", .path.display())]
    OverrideFileNotFound {
        /// The candidate path that was looked up.
        path: PathBuf,
    },

    /// An override file resolves to a location outside the sandbox root.
    #[error("override file {} is not inside folder {}", .path.display(), .root.display())]
    PathEscapesSandbox {
        /// The canonical path of the resolved file.
        path: PathBuf,
        /// The canonical sandbox root.
        root: PathBuf,
    },

    /// Failed to read an override file.
    #[error("failed to read override file: {}", .path.display())]
    ReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An override file could not be parsed.
    #[error("failed to parse override file {}: {reason}", .path.display())]
    ParseError {
        /// Path to the file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// An override file parsed, but is not a table of settings.
    #[error("override file {} must contain a table at the top level", .path.display())]
    InvalidOverlay {
        /// Path to the file.
        path: PathBuf,
    },

    /// An environment key carries the prefix but no usable path.
    ///
    /// The loader logs and skips these; environment overlay is best-effort.
    #[error("environment variable {var} cannot be mapped to a configuration path: {reason}")]
    EnvironmentOverlayMalformed {
        /// The environment variable name.
        var: String,
        /// Explanation of the problem.
        reason: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Create a new invalid context error.
    pub fn invalid_context(segment: impl Into<String>, context: impl Into<String>) -> Self {
        Self::InvalidContextFormat {
            segment: segment.into(),
            context: context.into(),
        }
    }

    /// Create a new sandbox unavailable error.
    pub fn sandbox_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SandboxUnavailable {
            path: path.into(),
            source,
        }
    }

    /// Create a new missing layer directory error.
    pub fn layer_missing(
        ordinal: usize,
        segment: impl Into<String>,
        context: impl Into<String>,
        root: impl Into<PathBuf>,
    ) -> Self {
        let root: PathBuf = root.into();
        Self::LayerDirectoryMissing {
            ordinal,
            segment: segment.into(),
            context: context.into(),
            example: root.join(format!("{ordinal}_something")),
            root,
        }
    }

    /// Create a new override file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::OverrideFileNotFound { path: path.into() }
    }

    /// Create a new sandbox escape error.
    pub fn escapes_sandbox(path: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        Self::PathEscapesSandbox {
            path: path.into(),
            root: root.into(),
        }
    }

    /// Create a new read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Create a new parse error.
    pub fn parse_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ParseError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new malformed environment key error.
    pub fn env_malformed(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvironmentOverlayMalformed {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors that indicate a security violation.
    pub fn is_security_violation(&self) -> bool {
        matches!(self, Self::PathEscapesSandbox { .. })
    }
}
