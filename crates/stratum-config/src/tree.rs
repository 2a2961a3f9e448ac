//! Nested configuration tree.
//!
//! The tree is a JSON object whose leaves are opaque values. Overlays either
//! deep-merge a whole patch (layer files) or set a single leaf by path
//! (environment variables). In both cases the last writer wins.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Separator used by dotted paths such as `DB.Connections.Default.dbname`.
pub const PATH_SEPARATOR: char = '.';

/// A nested key/value configuration tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigTree {
    root: Map<String, Value>,
}

impl ConfigTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the top-level mapping.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Consume the tree into a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    /// Returns `true` if the tree has no keys.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Look up a value by path components.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.root.get(first.as_ref())?;
        for segment in rest {
            current = current.as_object()?.get(segment.as_ref())?;
        }
        Some(current)
    }

    /// Look up a value by dotted path.
    ///
    /// # Example
    ///
    /// ```
    /// use stratum_config::ConfigTree;
    /// use serde_json::json;
    ///
    /// let mut tree = ConfigTree::new();
    /// tree.set("DB.Connections.Default.dbname", json!("app"));
    /// assert_eq!(tree.get("DB.Connections.Default.dbname"), Some(&json!("app")));
    /// ```
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.get_path(&split_path(path))
    }

    /// Mutable lookup by path components.
    pub fn get_path_mut<S: AsRef<str>>(&mut self, path: &[S]) -> Option<&mut Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.root.get_mut(first.as_ref())?;
        for segment in rest {
            current = current.as_object_mut()?.get_mut(segment.as_ref())?;
        }
        Some(current)
    }

    /// Set a leaf by path components, creating intermediate tables.
    ///
    /// A non-table value found where a table is needed is replaced by a table.
    /// An empty path is ignored.
    pub fn set_path<S: AsRef<str>>(&mut self, path: &[S], value: Value) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };

        let mut current = &mut self.root;
        for segment in parents {
            let slot = current
                .entry(segment.as_ref().to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            current = match slot {
                Value::Object(map) => map,
                _ => unreachable!("slot was just made a table"),
            };
        }
        current.insert(last.as_ref().to_string(), value);
    }

    /// Set a leaf by dotted path.
    pub fn set(&mut self, path: &str, value: Value) {
        self.set_path(&split_path(path), value);
    }

    /// Remove a value by dotted path, returning it.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let parts = split_path(path);
        let (last, parents) = parts.split_last()?;
        if parents.is_empty() {
            return self.root.remove(*last);
        }
        self.get_path_mut(parents)?.as_object_mut()?.remove(*last)
    }

    /// Deep-merge `patch` into the tree.
    ///
    /// Tables merge key by key; any other value replaces what was there.
    pub fn merge(&mut self, patch: Map<String, Value>) {
        merge_maps(&mut self.root, patch);
    }

    /// Deep-merge `patch` into the tree without overwriting existing leaves.
    ///
    /// Used by presets that supply defaults the existing configuration may
    /// already have customised.
    pub fn merge_defaults(&mut self, defaults: Map<String, Value>) {
        let mut merged = defaults;
        merge_maps(&mut merged, std::mem::take(&mut self.root));
        self.root = merged;
    }

    /// Deserialize the value at `path` into a typed section.
    ///
    /// Returns `None` when the path is absent.
    pub fn section<T: DeserializeOwned>(&self, path: &str) -> Option<serde_json::Result<T>> {
        self.get(path).map(|value| T::deserialize(value))
    }
}

impl From<Map<String, Value>> for ConfigTree {
    fn from(root: Map<String, Value>) -> Self {
        Self { root }
    }
}

/// Split a dotted path into components.
pub fn split_path(path: &str) -> Vec<&str> {
    if path.is_empty() {
        return Vec::new();
    }
    path.split(PATH_SEPARATOR).collect()
}

fn merge_maps(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_maps(existing, incoming);
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: Value) -> ConfigTree {
        match value {
            Value::Object(map) => ConfigTree::from(map),
            _ => panic!("expected object"),
        }
    }

    fn patch(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_set_creates_intermediate_tables() {
        let mut t = ConfigTree::new();
        t.set("DB.Connections.Default.dbname", json!("mydb"));
        assert_eq!(
            t.into_value(),
            json!({"DB": {"Connections": {"Default": {"dbname": "mydb"}}}})
        );
    }

    #[test]
    fn test_set_keeps_siblings() {
        let mut t = tree(json!({"DB": {"Connections": {"Default": {"host": "db", "dbname": "old"}}}}));
        t.set("DB.Connections.Default.dbname", json!("new"));
        assert_eq!(t.get("DB.Connections.Default.host"), Some(&json!("db")));
        assert_eq!(t.get("DB.Connections.Default.dbname"), Some(&json!("new")));
    }

    #[test]
    fn test_set_replaces_scalar_parent() {
        let mut t = tree(json!({"SYS": "flat"}));
        t.set("SYS.sitename", json!("Site"));
        assert_eq!(t.get("SYS"), Some(&json!({"sitename": "Site"})));
    }

    #[test]
    fn test_set_empty_path_is_ignored() {
        let mut t = ConfigTree::new();
        t.set_path::<&str>(&[], json!(1));
        assert!(t.is_empty());
    }

    #[test]
    fn test_get_missing_and_through_scalar() {
        let t = tree(json!({"a": {"b": 1}}));
        assert_eq!(t.get("a.b"), Some(&json!(1)));
        assert_eq!(t.get("a.c"), None);
        assert_eq!(t.get("a.b.c"), None);
        assert_eq!(t.get(""), None);
    }

    #[test]
    fn test_merge_is_deep_and_last_writer_wins() {
        let mut t = tree(json!({"SYS": {"sitename": "Base", "debug": false}, "keep": 1}));
        t.merge(patch(json!({"SYS": {"sitename": "Staging"}, "new": [1, 2]})));
        assert_eq!(
            t.into_value(),
            json!({"SYS": {"sitename": "Staging", "debug": false}, "keep": 1, "new": [1, 2]})
        );
    }

    #[test]
    fn test_merge_replaces_table_with_scalar() {
        let mut t = tree(json!({"a": {"b": 1}}));
        t.merge(patch(json!({"a": "flat"})));
        assert_eq!(t.get("a"), Some(&json!("flat")));
    }

    #[test]
    fn test_merge_defaults_keeps_existing_leaves() {
        let mut t = tree(json!({"LOG": {"error": {"disabled": true}}}));
        t.merge_defaults(patch(json!({"LOG": {"error": {"disabled": false}, "debug": {"disabled": true}}})));
        assert_eq!(t.get("LOG.error.disabled"), Some(&json!(true)));
        assert_eq!(t.get("LOG.debug.disabled"), Some(&json!(true)));
    }

    #[test]
    fn test_remove() {
        let mut t = tree(json!({"a": {"b": 1, "c": 2}, "d": 3}));
        assert_eq!(t.remove("a.b"), Some(json!(1)));
        assert_eq!(t.remove("d"), Some(json!(3)));
        assert_eq!(t.remove("x.y"), None);
        assert_eq!(t.into_value(), json!({"a": {"c": 2}}));
    }

    #[test]
    fn test_section() {
        #[derive(Deserialize)]
        struct Connection {
            host: String,
            port: u16,
        }

        let t = tree(json!({"DB": {"Default": {"host": "db", "port": 3306}}}));
        let conn: Connection = t.section("DB.Default").unwrap().unwrap();
        assert_eq!(conn.host, "db");
        assert_eq!(conn.port, 3306);
        assert!(t.section::<Connection>("DB.Other").is_none());
    }
}
