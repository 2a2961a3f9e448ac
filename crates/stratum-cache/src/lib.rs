//! Cache configuration registry and development downgrade.
//!
//! Entries under `SYS.caching.cacheConfigurations` name a backend and a
//! frontend by identifier. A [`CacheCatalog`] tags each identifier with a
//! kind, and [`downgrade`] uses those tags to replace persistent caches with
//! null or per-request memory storage while developing.
//!
//! ```
//! use serde_json::json;
//! use stratum_cache::{CacheCatalog, SharedCacheRegistry, DowngradeAction};
//! use stratum_config::ConfigTree;
//!
//! let mut tree = ConfigTree::new();
//! tree.set("SYS.caching.cacheConfigurations.pages.backend", json!("simple-file"));
//!
//! let shared = SharedCacheRegistry::from_tree(&tree, &CacheCatalog::default()).unwrap();
//! let report = shared.downgrade();
//! assert_eq!(report.action("pages"), Some(DowngradeAction::NullBackend));
//! ```

#![warn(missing_docs)]

mod descriptor;
pub mod downgrade;
mod error;
mod registry;

pub use descriptor::{
    BackendDescriptor, BackendKind, CacheCatalog, FrontendDescriptor, FrontendKind, NULL_BACKEND,
    TRANSIENT_MEMORY_BACKEND, VARIABLE_FRONTEND,
};
pub use downgrade::{downgrade, DowngradeAction, DowngradeReport};
pub use error::{CacheError, CacheResult};
pub use registry::{
    CacheConfiguration, CacheRegistry, Capability, OptOuts, SharedCacheRegistry,
    CACHE_REGISTRY_PATH, OPT_OUT_PATH,
};
