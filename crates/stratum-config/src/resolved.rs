//! Immutable resolved configuration.

use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{ApplicationContext, ConfigTree};

/// The outcome of configuration resolution.
///
/// Cloning is cheap; the tree is shared.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    context: ApplicationContext,
    tree: Arc<ConfigTree>,
    files: Arc<[PathBuf]>,
}

impl ResolvedConfig {
    /// Freeze a tree.
    pub fn new(context: ApplicationContext, tree: ConfigTree, files: Vec<PathBuf>) -> Self {
        Self {
            context,
            tree: Arc::new(tree),
            files: files.into(),
        }
    }

    /// The context the configuration was resolved for.
    pub fn context(&self) -> &ApplicationContext {
        &self.context
    }

    /// Returns `true` when the context is development-like.
    pub fn is_development(&self) -> bool {
        self.context.is_development()
    }

    /// The whole tree.
    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    /// Override files that contributed, in application order.
    pub fn layer_files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Value at a dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.tree.get(path)
    }

    /// String value at a dotted path.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Boolean value at a dotted path.
    ///
    /// Environment overrides arrive as strings, so `"true"`, `"1"`, `"yes"`
    /// and `"on"` (and their negations) are accepted as well.
    pub fn get_bool(&self, path: &str) -> Option<bool> {
        match self.get(path)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            Value::String(s) => parse_bool(s),
            _ => None,
        }
    }

    /// Deserialize a typed section.
    ///
    /// Returns `None` if the path is absent.
    pub fn section<T: DeserializeOwned>(&self, path: &str) -> Option<serde_json::Result<T>> {
        self.tree.section(path)
    }
}

/// Parse a boolean from a string.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
