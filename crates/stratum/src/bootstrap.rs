//! Step-by-step construction of a [`ConfigContext`].

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use stratum_cache::{CacheCatalog, SharedCacheRegistry, CACHE_REGISTRY_PATH, OPT_OUT_PATH};
use stratum_config::{presets, split_path, ApplicationContext, ConfigTree, ContextLoader};
use stratum_telemetry::metrics::{record_env_overrides, record_layer_files, record_resolution};
use tracing::info;

use crate::context::ConfigContext;
use crate::error::StratumResult;
use crate::options::LoaderOptions;

/// Builds the configuration for one application context.
///
/// Steps apply in call order, so a preset applied before
/// [`include_context_files`](Self::include_context_files) can be overridden
/// by the files, and one applied after overrides them.
///
/// ```no_run
/// use stratum::Bootstrap;
///
/// # fn main() -> Result<(), stratum::StratumError> {
/// let context = Bootstrap::new("Production/Staging")?
///     .use_production_preset()
///     .include_context_files()?
///     .load_environment()
///     .append_context_to_site_name(true)
///     .finish()?;
///
/// assert!(!context.is_development());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Bootstrap {
    loader: ContextLoader,
    catalog: CacheCatalog,
    started: Instant,
}

impl Bootstrap {
    /// Start from a context identifier with default options.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier contains illegal characters.
    pub fn new(context: &str) -> StratumResult<Self> {
        Self::with_options(context, LoaderOptions::default())
    }

    /// Start from a context identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier contains illegal characters or the
    /// `.env` file cannot be read.
    pub fn with_options(context: &str, options: LoaderOptions) -> StratumResult<Self> {
        let started = Instant::now();
        let context = ApplicationContext::parse(context)?;

        let mut loader = ContextLoader::new(context)
            .with_sandbox_root(options.sandbox_root())
            .with_extension(options.extension())
            .with_env_prefix(options.env_prefix())
            .with_env_source(options.env().clone());
        if options.dotenv() {
            loader = loader.with_dotenv()?;
        }

        Ok(Self {
            loader,
            catalog: CacheCatalog::default(),
            started,
        })
    }

    /// The parsed context.
    pub fn context(&self) -> &ApplicationContext {
        self.loader.context()
    }

    /// The tree as built so far.
    pub fn tree(&self) -> &ConfigTree {
        self.loader.tree()
    }

    /// Classify cache identifiers with a custom catalog.
    #[must_use]
    pub fn with_catalog(mut self, catalog: CacheCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Apply the override file of every context label.
    ///
    /// # Errors
    ///
    /// Returns the first resolution failure; see
    /// [`ContextLoader::apply_layers`].
    pub fn include_context_files(mut self) -> StratumResult<Self> {
        self.loader.apply_layers()?;
        record_layer_files(self.loader.applied_files().len());
        Ok(self)
    }

    /// Apply `PREFIX__Section__key` environment overrides.
    #[must_use]
    pub fn load_environment(mut self) -> Self {
        let applied = self.loader.apply_environment();
        record_env_overrides(applied);
        self
    }

    /// Debug output, verbose errors and warning-level file logging.
    #[must_use]
    pub fn use_development_preset(self) -> Self {
        self.configure(presets::development)
    }

    /// No debug output and error-level file logging only.
    #[must_use]
    pub fn use_production_preset(self) -> Self {
        self.configure(presets::production)
    }

    /// Settings for a local container stack.
    #[must_use]
    pub fn use_local_container_preset(self) -> Self {
        self.configure(presets::local_container)
    }

    /// Turn the deprecation log file writer on.
    #[must_use]
    pub fn enable_deprecation_logging(self) -> Self {
        self.configure(presets::enable_deprecation_logging)
    }

    /// Turn the deprecation log file writer off.
    #[must_use]
    pub fn disable_deprecation_logging(self) -> Self {
        self.configure(presets::disable_deprecation_logging)
    }

    /// Append `(<context>)` to the site name; `short` keeps one letter per segment.
    #[must_use]
    pub fn append_context_to_site_name(mut self, short: bool) -> Self {
        let path = self.loader.context().path().clone();
        presets::append_context_to_site_name(self.loader.tree_mut(), &path, short);
        self
    }

    /// Keep the named cache persistent even in development.
    #[must_use]
    pub fn keep_cache(mut self, name: &str) -> Self {
        let mut path = split_path(OPT_OUT_PATH);
        path.extend([name, "uncache"]);
        self.loader.tree_mut().set_path(&path, Value::Bool(false));
        self
    }

    /// Edit the tree directly.
    #[must_use]
    pub fn configure(mut self, f: impl FnOnce(&mut ConfigTree)) -> Self {
        f(self.loader.tree_mut());
        self
    }

    /// Freeze the configuration and move the cache registry out of it.
    ///
    /// The frozen tree no longer holds [`CACHE_REGISTRY_PATH`]; the registry
    /// owns those entries from here on.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache registry section is not a table.
    pub fn finish(self) -> StratumResult<Arc<ConfigContext>> {
        let Self {
            mut loader,
            catalog,
            started,
        } = self;
        let caches = SharedCacheRegistry::from_tree(loader.tree(), &catalog)?;
        loader.tree_mut().remove(CACHE_REGISTRY_PATH);
        let config = loader.finish();

        let kind = config.context().kind().to_string().to_lowercase();
        record_resolution(&kind, started.elapsed());
        info!(
            context = %config.context(),
            kind = %kind,
            caches = caches.read().len(),
            development = config.is_development(),
            "configuration context ready"
        );

        Ok(Arc::new(ConfigContext::new(config, caches)))
    }
}
