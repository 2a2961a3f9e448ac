//! Layer directory discovery.
//!
//! The sandbox root holds one directory per context ordinal, named
//! `<ordinal>_<description>` (for example `1_environment`, `2_server`).
//! Anything else in the root is ignored so that new, unrelated folders do not
//! break resolution.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{ConfigError, ConfigResult, SegmentGroup};

/// Ordinal → directory mapping for one sandbox root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerRegistry {
    root: PathBuf,
    layers: BTreeMap<usize, PathBuf>,
}

impl LayerRegistry {
    /// Scan the immediate children of `root`.
    ///
    /// The root is canonicalized, so every registered directory is absolute.
    /// Children are visited in file-name order; when two directories claim the
    /// same ordinal, the later one wins.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SandboxUnavailable`] if the root does not exist
    /// or is not a directory, and [`ConfigError::Io`] if it cannot be listed.
    pub fn scan(root: impl AsRef<Path>) -> ConfigResult<Self> {
        let configured = root.as_ref();
        let root = fs::canonicalize(configured)
            .map_err(|e| ConfigError::sandbox_unavailable(configured, e))?;
        if !root.is_dir() {
            return Err(ConfigError::sandbox_unavailable(
                configured,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            ));
        }

        let mut entries = fs::read_dir(&root)?.collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(fs::DirEntry::file_name);

        let mut layers = BTreeMap::new();
        for entry in entries {
            if !entry.file_type()?.is_dir() && !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(ordinal) = name.to_str().and_then(parse_ordinal) else {
                debug!(entry = %entry.path().display(), "ignoring non-layer entry");
                continue;
            };

            if let Some(previous) = layers.insert(ordinal, entry.path()) {
                warn!(
                    ordinal,
                    replaced = %previous.display(),
                    layer = %entry.path().display(),
                    "multiple layer directories share an ordinal, using the last one"
                );
            }
        }

        debug!(root = %root.display(), layers = layers.len(), "scanned layer directories");
        Ok(Self { root, layers })
    }

    /// The canonical sandbox root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory registered for `ordinal`, if any.
    pub fn get(&self, ordinal: usize) -> Option<&Path> {
        self.layers.get(&ordinal).map(PathBuf::as_path)
    }

    /// Directory for the ordinal of `group`, failing when it is missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::LayerDirectoryMissing`] naming the ordinal and an
    /// example directory name.
    pub fn require(&self, group: &SegmentGroup, context: &str) -> ConfigResult<&Path> {
        self.get(group.ordinal()).ok_or_else(|| {
            ConfigError::layer_missing(group.ordinal(), group.raw(), context, &self.root)
        })
    }

    /// Registered `(ordinal, directory)` pairs in ascending ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Path)> {
        self.layers.iter().map(|(ordinal, dir)| (*ordinal, dir.as_path()))
    }

    /// Number of registered layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns `true` if no layer directories were found.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Ordinal encoded in a layer directory name: the positive integer before the first `_`.
fn parse_ordinal(name: &str) -> Option<usize> {
    let (prefix, _) = name.split_once('_')?;
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok().filter(|ordinal| *ordinal > 0)
}
