//! The resolved configuration shared by the application.

use std::sync::Arc;

use serde_json::Value;
use stratum_cache::{DowngradeReport, SharedCacheRegistry};
use stratum_config::{ApplicationContext, ConfigTree, ResolvedConfig};
use stratum_middleware::UncacheMiddleware;

/// Immutable configuration plus the runtime cache registry.
///
/// Built once by [`Bootstrap`](crate::Bootstrap) and handed out as
/// `Arc<ConfigContext>`. The cache entries live only in the registry, so
/// read them through [`cache_configurations`](Self::cache_configurations)
/// or [`to_tree`](Self::to_tree).
#[derive(Debug)]
pub struct ConfigContext {
    config: ResolvedConfig,
    caches: Arc<SharedCacheRegistry>,
}

impl ConfigContext {
    pub(crate) fn new(config: ResolvedConfig, caches: SharedCacheRegistry) -> Self {
        Self {
            config,
            caches: Arc::new(caches),
        }
    }

    /// The resolved configuration, without the cache registry section.
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// The running context.
    pub fn context(&self) -> &ApplicationContext {
        self.config.context()
    }

    /// Whether the first context segment selects `Development`.
    pub fn is_development(&self) -> bool {
        self.config.is_development()
    }

    /// The shared cache registry.
    pub fn caches(&self) -> &Arc<SharedCacheRegistry> {
        &self.caches
    }

    /// Run the development downgrade now.
    ///
    /// Returns `None` outside development.
    pub fn downgrade_caches(&self) -> Option<DowngradeReport> {
        self.is_development().then(|| self.caches.downgrade())
    }

    /// The cache registry in its current state as a tree value.
    pub fn cache_configurations(&self) -> Value {
        self.caches.read().to_value()
    }

    /// The full configuration with the cache registry in its current state.
    pub fn to_tree(&self) -> ConfigTree {
        let mut tree = self.config.tree().clone();
        self.caches.read().write_to(&mut tree);
        tree
    }

    /// The per-request downgrade stage for this context.
    pub fn uncache_stage(&self) -> UncacheMiddleware {
        UncacheMiddleware::new(Arc::clone(&self.caches), self.is_development())
    }
}
