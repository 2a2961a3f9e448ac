//! Options controlling where and how configuration is resolved.

use std::path::{Path, PathBuf};

use stratum_config::{EnvSource, DEFAULT_ENV_PREFIX, DEFAULT_EXTENSION, DEFAULT_SANDBOX_ROOT};

/// Resolver options with builder-style setters.
///
/// ```
/// use stratum::LoaderOptions;
///
/// let options = LoaderOptions::default()
///     .with_sandbox_root("/srv/app/config/context")
///     .with_env_prefix("APP");
/// assert_eq!(options.env_prefix(), "APP");
/// assert_eq!(options.extension(), "toml");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    sandbox_root: PathBuf,
    extension: String,
    env_prefix: String,
    env: EnvSource,
    dotenv: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            sandbox_root: PathBuf::from(DEFAULT_SANDBOX_ROOT),
            extension: DEFAULT_EXTENSION.to_string(),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            env: EnvSource::Process,
            dotenv: false,
        }
    }
}

impl LoaderOptions {
    /// Directory holding the numbered layer folders.
    #[must_use]
    pub fn with_sandbox_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sandbox_root = root.into();
        self
    }

    /// Override file extension (`toml` or `json`).
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Environment variable prefix.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Where environment overrides come from.
    #[must_use]
    pub fn with_env(mut self, source: EnvSource) -> Self {
        self.env = source;
        self
    }

    /// Load `.env` into the process environment before resolving.
    #[must_use]
    pub fn with_dotenv(mut self, enabled: bool) -> Self {
        self.dotenv = enabled;
        self
    }

    /// Sandbox root.
    pub fn sandbox_root(&self) -> &Path {
        &self.sandbox_root
    }

    /// Override file extension.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Environment variable prefix.
    pub fn env_prefix(&self) -> &str {
        &self.env_prefix
    }

    /// Environment source.
    pub fn env(&self) -> &EnvSource {
        &self.env
    }

    /// Whether `.env` is loaded.
    pub fn dotenv(&self) -> bool {
        self.dotenv
    }
}
