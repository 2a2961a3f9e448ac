//! Environment variable overlay.
//!
//! Variables named `PREFIX__Section__Sub__key` are written to the tree path
//! `Section.Sub.key`. Values are stored as strings. The overlay runs after
//! every layer file, so the environment always has the final word.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::{ConfigError, ConfigResult, ConfigTree};

/// Default variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "STRATUM";

/// Delimiter between the prefix and path components.
pub const ENV_DELIMITER: &str = "__";

/// Maps prefixed environment variables onto a [`ConfigTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvOverlay {
    prefix: String,
}

impl Default for EnvOverlay {
    fn default() -> Self {
        Self::new(DEFAULT_ENV_PREFIX)
    }
}

impl EnvOverlay {
    /// Create an overlay for `prefix` (matched case-sensitively).
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The variable prefix, without the trailing delimiter.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Tree path components for `key`.
    ///
    /// Returns `Ok(None)` for variables without the prefix.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EnvironmentOverlayMalformed`] when the key has
    /// the prefix but no path, or a path with an empty component.
    pub fn path_for<'k>(&self, key: &'k str) -> ConfigResult<Option<Vec<&'k str>>> {
        let Some(remainder) = key
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix(ENV_DELIMITER))
        else {
            return Ok(None);
        };

        if remainder.is_empty() {
            return Err(ConfigError::env_malformed(key, "no configuration path after prefix"));
        }

        let parts: Vec<&str> = remainder.split(ENV_DELIMITER).collect();
        if parts.iter().any(|part| part.is_empty()) {
            return Err(ConfigError::env_malformed(key, "empty path component"));
        }

        Ok(Some(parts))
    }

    /// Apply every matching variable in `vars` to `tree`.
    ///
    /// Variables are applied in key order so the outcome does not depend on
    /// how the caller iterates its environment. Malformed keys are logged and
    /// skipped. Returns the number of values written.
    pub fn apply<I, K, V>(&self, tree: &mut ConfigTree, vars: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let sorted: BTreeMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let mut applied = 0;
        for (key, value) in &sorted {
            match self.path_for(key) {
                Ok(Some(path)) => {
                    debug!(var = %key, path = %path.join("."), "applying environment override");
                    tree.set_path(&path, Value::String(value.clone()));
                    applied += 1;
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "skipping environment variable"),
            }
        }
        applied
    }

    /// Apply the current process environment.
    ///
    /// Variables whose name or value is not valid unicode are ignored.
    pub fn apply_process_env(&self, tree: &mut ConfigTree) -> usize {
        self.apply(tree, std::env::vars_os().filter_map(|(k, v)| {
            Some((k.into_string().ok()?, v.into_string().ok()?))
        }))
    }
}
