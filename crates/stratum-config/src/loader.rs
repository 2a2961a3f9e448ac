//! Context-driven configuration loader.
//!
//! This module provides the [`ContextLoader`], which applies configuration in
//! layers, later layers overriding earlier ones:
//! 1. Base values (optional, from a string or an existing tree)
//! 2. One override file per context label, in ascending ordinal order
//! 3. Environment variables

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::env::{EnvOverlay, DEFAULT_ENV_PREFIX};
use crate::resolver::{SecureFileResolver, DEFAULT_EXTENSION};
use crate::{ApplicationContext, ConfigError, ConfigResult, ConfigTree, LayerRegistry, ResolvedConfig};

/// Default sandbox root, relative to the working directory.
pub const DEFAULT_SANDBOX_ROOT: &str = "config/context";

/// Where environment overrides are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvSource {
    /// The process environment at the time the overlay runs.
    Process,
    /// A fixed set of variables.
    Snapshot(BTreeMap<String, String>),
    /// No environment overlay.
    Disabled,
}

/// Configuration loader driven by an [`ApplicationContext`].
///
/// # Example
///
/// ```no_run
/// use stratum_config::{ApplicationContext, ContextLoader};
///
/// # fn main() -> Result<(), stratum_config::ConfigError> {
/// let context = ApplicationContext::parse("Production/Staging")?;
/// let config = ContextLoader::new(context)
///     .with_sandbox_root("config/context")
///     .with_env_prefix("STRATUM")
///     .load()?;
///
/// println!("site: {:?}", config.get_str("SYS.sitename"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ContextLoader {
    context: ApplicationContext,
    sandbox_root: PathBuf,
    extension: String,
    env_overlay: EnvOverlay,
    env_source: EnvSource,
    tree: ConfigTree,
    applied_files: Vec<PathBuf>,
}

impl ContextLoader {
    /// Create a loader for `context` with default options.
    pub fn new(context: ApplicationContext) -> Self {
        Self {
            context,
            sandbox_root: PathBuf::from(DEFAULT_SANDBOX_ROOT),
            extension: DEFAULT_EXTENSION.to_string(),
            env_overlay: EnvOverlay::new(DEFAULT_ENV_PREFIX),
            env_source: EnvSource::Process,
            tree: ConfigTree::new(),
            applied_files: Vec::new(),
        }
    }

    /// Set the directory holding the numbered layer folders.
    #[must_use]
    pub fn with_sandbox_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sandbox_root = root.into();
        self
    }

    /// Set the override file extension (`toml` or `json`).
    #[must_use]
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_lowercase();
        self
    }

    /// Set the environment variable prefix.
    ///
    /// Variables use the format `PREFIX__Section__key`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_overlay = EnvOverlay::new(prefix);
        self
    }

    /// Read environment overrides from a fixed set of variables.
    #[must_use]
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_source = EnvSource::Snapshot(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Skip the environment overlay entirely.
    #[must_use]
    pub fn without_env(mut self) -> Self {
        self.env_source = EnvSource::Disabled;
        self
    }

    /// Replace the environment source.
    #[must_use]
    pub fn with_env_source(mut self, source: EnvSource) -> Self {
        self.env_source = source;
        self
    }

    /// Load a `.env` file into the process environment.
    ///
    /// A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file exists but cannot be read.
    pub fn with_dotenv(self) -> ConfigResult<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(ConfigError::Io(std::io::Error::other(e.to_string()))),
        }
        Ok(self)
    }

    /// Start from an existing tree instead of an empty one.
    #[must_use]
    pub fn with_base(mut self, tree: ConfigTree) -> Self {
        self.tree = tree;
        self
    }

    /// Merge base values from a string.
    ///
    /// # Arguments
    ///
    /// * `content` - Configuration content as a string
    /// * `format` - File format ("toml" or "json")
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use stratum_config::{ApplicationContext, ContextLoader};
    ///
    /// let context = ApplicationContext::parse("").unwrap();
    /// let config = ContextLoader::new(context)
    ///     .with_string("[SYS]\nsitename = \"Demo\"", "toml")
    ///     .unwrap()
    ///     .without_env()
    ///     .finish();
    ///
    /// assert_eq!(config.get_str("SYS.sitename"), Some("Demo"));
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> ConfigResult<Self> {
        let patch = parse_patch(content, format, Path::new("<string>"))?;
        self.tree.merge(patch);
        Ok(self)
    }

    /// The context this loader resolves.
    pub fn context(&self) -> &ApplicationContext {
        &self.context
    }

    /// The tree as resolved so far.
    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    /// Mutable access to the tree while loading.
    pub fn tree_mut(&mut self) -> &mut ConfigTree {
        &mut self.tree
    }

    /// Override files applied so far, in application order.
    pub fn applied_files(&self) -> &[PathBuf] {
        &self.applied_files
    }

    /// Apply the override file of every context label.
    ///
    /// Segment groups are processed in ordinal order, labels within a group in
    /// listed order; empty labels are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error: a missing sandbox or layer directory, a
    /// missing, escaping, unreadable or unparsable override file.
    pub fn apply_layers(&mut self) -> ConfigResult<()> {
        let registry = LayerRegistry::scan(&self.sandbox_root)?;
        let resolver = SecureFileResolver::new(registry.root(), self.extension.clone());
        let context = self.context.path().as_str().to_string();

        for group in self.context.path().groups() {
            if !group.is_active() {
                continue;
            }
            let layer_dir = registry.require(group, &context)?;

            for label in group.active_labels() {
                let file = resolver.resolve(layer_dir, label)?;
                let patch = read_patch(&file)?;
                debug!(
                    ordinal = group.ordinal(),
                    label,
                    file = %file.display(),
                    "applying override file"
                );
                self.tree.merge(patch);
                self.applied_files.push(file);
            }
        }

        Ok(())
    }

    /// Apply environment overrides from the configured source.
    ///
    /// Returns the number of values written.
    pub fn apply_environment(&mut self) -> usize {
        match &self.env_source {
            EnvSource::Process => self.env_overlay.apply_process_env(&mut self.tree),
            EnvSource::Snapshot(vars) => self.env_overlay.apply(&mut self.tree, vars.clone()),
            EnvSource::Disabled => 0,
        }
    }

    /// Apply layer files, then environment overrides, and freeze the result.
    ///
    /// # Errors
    ///
    /// See [`ContextLoader::apply_layers`].
    pub fn load(mut self) -> ConfigResult<ResolvedConfig> {
        self.apply_layers()?;
        self.apply_environment();
        Ok(self.finish())
    }

    /// Freeze the tree as it currently is.
    pub fn finish(self) -> ResolvedConfig {
        info!(
            context = %self.context,
            files = self.applied_files.len(),
            "configuration resolved"
        );
        ResolvedConfig::new(self.context, self.tree, self.applied_files)
    }
}

fn read_patch(path: &Path) -> ConfigResult<Map<String, Value>> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
    let format = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    parse_patch(&content, &format, path)
}

// Parse a declarative patch; the top level must be a table.
fn parse_patch(content: &str, format: &str, path: &Path) -> ConfigResult<Map<String, Value>> {
    let value: Value = match format.to_lowercase().as_str() {
        "toml" => {
            let table: toml::Table =
                toml::from_str(content).map_err(|e| ConfigError::parse_error(path, e.to_string()))?;
            serde_json::to_value(table).map_err(|e| ConfigError::parse_error(path, e.to_string()))?
        }
        "json" => {
            serde_json::from_str(content).map_err(|e| ConfigError::parse_error(path, e.to_string()))?
        }
        other => {
            return Err(ConfigError::parse_error(
                path,
                format!("unsupported configuration format: {other}"),
            ))
        }
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::InvalidOverlay {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn loader(root: &Path, context: &str) -> ContextLoader {
        ContextLoader::new(ApplicationContext::parse(context).unwrap())
            .with_sandbox_root(root)
            .without_env()
    }

    #[test]
    fn test_parse_patch_toml_and_json() {
        let toml = parse_patch("[SYS]\nsitename = \"A\"", "toml", Path::new("a.toml")).unwrap();
        assert_eq!(Value::Object(toml), json!({"SYS": {"sitename": "A"}}));

        let json = parse_patch(r#"{"SYS": {"sitename": "B"}}"#, "json", Path::new("b.json")).unwrap();
        assert_eq!(Value::Object(json), json!({"SYS": {"sitename": "B"}}));
    }

    #[test]
    fn test_parse_patch_rejects_non_table() {
        let err = parse_patch("[1, 2]", "json", Path::new("list.json")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOverlay { .. }));
    }

    #[test]
    fn test_parse_patch_reports_syntax_errors() {
        let err = parse_patch("[SYS", "toml", Path::new("broken.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_parse_patch_unsupported_format() {
        assert!(parse_patch("", "yaml", Path::new("x.yaml")).is_err());
    }

    #[test]
    fn test_layers_apply_in_ordinal_order() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "1_base/base.toml", "[SYS]\nsitename = \"Base\"\nlang = \"en\"\n");
        write(tmp.path(), "2_env/staging.toml", "[SYS]\nsitename = \"Staging\"\n");

        let mut loader = loader(tmp.path(), "base/staging");
        loader.apply_layers().unwrap();

        assert_eq!(loader.tree().get("SYS.sitename"), Some(&json!("Staging")));
        assert_eq!(loader.tree().get("SYS.lang"), Some(&json!("en")));
        let files = loader.applied_files();
        assert!(files[0].ends_with("1_base/base.toml"));
        assert!(files[1].ends_with("2_env/staging.toml"));
    }

    #[test]
    fn test_alternatives_apply_in_listed_order() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "1_base/base.toml", "");
        write(tmp.path(), "2_role/a.toml", "winner = \"a\"\n[a]\nset = true\n");
        write(tmp.path(), "2_role/b.toml", "winner = \"b\"\n[b]\nset = true\n");

        let mut forward = loader(tmp.path(), "base/a,b");
        forward.apply_layers().unwrap();
        assert_eq!(forward.tree().get("winner"), Some(&json!("b")));
        assert_eq!(forward.tree().get("a.set"), Some(&json!(true)));
        assert_eq!(forward.tree().get("b.set"), Some(&json!(true)));

        let mut reverse = loader(tmp.path(), "base/b,a");
        reverse.apply_layers().unwrap();
        assert_eq!(reverse.tree().get("winner"), Some(&json!("a")));
    }

    #[test]
    fn test_empty_groups_need_no_directory() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "1_base/base.toml", "x = 1\n");

        let mut loader = loader(tmp.path(), "base//,/");
        loader.apply_layers().unwrap();
        assert_eq!(loader.applied_files().len(), 1);
    }

    #[test]
    fn test_missing_layer_directory() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "1_base/base.toml", "");
        write(tmp.path(), "2_env/staging.toml", "");

        let err = loader(tmp.path(), "base/staging/debug").load().unwrap_err();
        match err {
            ConfigError::LayerDirectoryMissing { ordinal, .. } => assert_eq!(ordinal, 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_override_file_is_fatal() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "1_base/base.toml", "");

        let err = loader(tmp.path(), "base,extra").load().unwrap_err();
        assert!(matches!(err, ConfigError::OverrideFileNotFound { .. }));
    }

    #[test]
    fn test_environment_wins_over_files() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "1_base/base.toml",
            "[DB.Connections.Default]\ndbname = \"from-file\"\nhost = \"db\"\n",
        );

        let config = loader(tmp.path(), "base")
            .with_env_prefix("PREFIX")
            .with_env_vars([("PREFIX__DB__Connections__Default__dbname", "mydb")])
            .load()
            .unwrap();

        assert_eq!(config.get_str("DB.Connections.Default.dbname"), Some("mydb"));
        assert_eq!(config.get_str("DB.Connections.Default.host"), Some("db"));
    }

    #[test]
    fn test_json_extension() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "1_base/base.json", r#"{"SYS": {"sitename": "Json"}}"#);

        let config = loader(tmp.path(), "base").with_extension(".JSON").load().unwrap();
        assert_eq!(config.get_str("SYS.sitename"), Some("Json"));
    }

    #[test]
    fn test_with_string_base_is_overridden_by_layers() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "1_base/base.toml", "[SYS]\nsitename = \"Layer\"\n");

        let config = loader(tmp.path(), "base")
            .with_string(r#"{"SYS": {"sitename": "Default", "lang": "en"}}"#, "json")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.get_str("SYS.sitename"), Some("Layer"));
        assert_eq!(config.get_str("SYS.lang"), Some("en"));
    }
}
