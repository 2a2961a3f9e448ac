//! Sandboxed override file lookup.
//!
//! Context labels end up in file paths. Label validation already rules out
//! separators and `..`, but symlinks inside the sandbox can still point
//! elsewhere, so every candidate is canonicalized and checked against the
//! canonical sandbox root before it is read.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::{ConfigError, ConfigResult};

/// Default extension of override files.
pub const DEFAULT_EXTENSION: &str = "toml";

/// Resolves `<layer-dir>/<label>.<ext>` inside a sandbox root.
#[derive(Debug, Clone)]
pub struct SecureFileResolver {
    root: PathBuf,
    extension: String,
}

impl SecureFileResolver {
    /// Create a resolver for an already canonical sandbox root.
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    /// The sandbox root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The conventional override file extension.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// The literal candidate path for `label`, before canonicalization.
    pub fn candidate(&self, layer_dir: &Path, label: &str) -> PathBuf {
        layer_dir.join(format!("{label}.{}", self.extension))
    }

    /// Resolve the override file for `label` in `layer_dir`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::OverrideFileNotFound`] if the candidate does not exist
    ///   or is not a regular file
    /// - [`ConfigError::PathEscapesSandbox`] if the canonical path lies outside
    ///   the sandbox root
    pub fn resolve(&self, layer_dir: &Path, label: &str) -> ConfigResult<PathBuf> {
        let candidate = self.candidate(layer_dir, label);

        let canonical = match fs::canonicalize(&candidate) {
            Ok(path) => path,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ConfigError::file_not_found(candidate));
            }
            Err(e) => return Err(ConfigError::read_error(candidate, e)),
        };

        // Component-wise prefix check; "/srv/config2" is not inside "/srv/config".
        if !canonical.starts_with(&self.root) {
            return Err(ConfigError::escapes_sandbox(canonical, &self.root));
        }

        if !canonical.is_file() {
            return Err(ConfigError::file_not_found(candidate));
        }

        Ok(canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        root: PathBuf,
        layer: PathBuf,
    }

    fn fixture() -> Fixture {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("context");
        let layer = root.join("1_base");
        fs::create_dir_all(&layer).unwrap();
        fs::write(layer.join("base.toml"), "[SYS]\nsitename = \"x\"\n").unwrap();
        let root = fs::canonicalize(root).unwrap();
        let layer = root.join("1_base");
        Fixture { _tmp: tmp, root, layer }
    }

    #[test]
    fn test_resolves_existing_file() {
        let fx = fixture();
        let resolver = SecureFileResolver::new(&fx.root, DEFAULT_EXTENSION);
        let path = resolver.resolve(&fx.layer, "base").unwrap();
        assert_eq!(path, fx.layer.join("base.toml"));
    }

    #[test]
    fn test_missing_file() {
        let fx = fixture();
        let resolver = SecureFileResolver::new(&fx.root, DEFAULT_EXTENSION);
        let err = resolver.resolve(&fx.layer, "staging").unwrap_err();
        match err {
            ConfigError::OverrideFileNotFound { path } => {
                assert_eq!(path, fx.layer.join("staging.toml"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_directory_is_not_an_override_file() {
        let fx = fixture();
        fs::create_dir(fx.layer.join("folder.toml")).unwrap();
        let resolver = SecureFileResolver::new(&fx.root, DEFAULT_EXTENSION);
        let err = resolver.resolve(&fx.layer, "folder").unwrap_err();
        assert!(matches!(err, ConfigError::OverrideFileNotFound { .. }));
    }

    #[test]
    fn test_uses_configured_extension() {
        let fx = fixture();
        fs::write(fx.layer.join("base.json"), "{}").unwrap();
        let resolver = SecureFileResolver::new(&fx.root, "json");
        let path = resolver.resolve(&fx.layer, "base").unwrap();
        assert_eq!(path.extension().unwrap(), "json");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escaping_root_is_rejected() {
        let fx = fixture();
        let outside = fx.root.parent().unwrap().join("outside.toml");
        fs::write(&outside, "[SYS]\nencryptionKey = \"stolen\"\n").unwrap();
        std::os::unix::fs::symlink(&outside, fx.layer.join("evil.toml")).unwrap();

        let resolver = SecureFileResolver::new(&fx.root, DEFAULT_EXTENSION);
        let err = resolver.resolve(&fx.layer, "evil").unwrap_err();
        assert!(err.is_security_violation());
        match err {
            ConfigError::PathEscapesSandbox { path, root } => {
                assert_eq!(path, fs::canonicalize(&outside).unwrap());
                assert_eq!(root, fx.root);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_sibling_with_shared_prefix_is_outside() {
        let fx = fixture();
        let sibling = PathBuf::from(format!("{}2", fx.root.display()));
        fs::create_dir_all(&sibling).unwrap();
        fs::write(sibling.join("base.toml"), "").unwrap();
        std::os::unix::fs::symlink(sibling.join("base.toml"), fx.layer.join("shared.toml")).unwrap();

        let resolver = SecureFileResolver::new(&fx.root, DEFAULT_EXTENSION);
        let err = resolver.resolve(&fx.layer, "shared").unwrap_err();
        assert!(matches!(err, ConfigError::PathEscapesSandbox { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_inside_root_is_allowed() {
        let fx = fixture();
        std::os::unix::fs::symlink(fx.layer.join("base.toml"), fx.layer.join("alias.toml")).unwrap();

        let resolver = SecureFileResolver::new(&fx.root, DEFAULT_EXTENSION);
        let path = resolver.resolve(&fx.layer, "alias").unwrap();
        assert_eq!(path, fx.layer.join("base.toml"));
    }
}
