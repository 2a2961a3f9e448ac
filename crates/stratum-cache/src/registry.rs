//! Cache configuration registry read from a resolved tree.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockReadGuard};
use serde_json::{Map, Value};
use stratum_config::{parse_bool, split_path, ConfigTree};
use tracing::warn;

use crate::descriptor::{BackendDescriptor, CacheCatalog, FrontendDescriptor, FrontendKind};
use crate::downgrade::{self, DowngradeReport};
use crate::error::{CacheError, CacheResult};

/// Tree path of the cache registry.
pub const CACHE_REGISTRY_PATH: &str = "SYS.caching.cacheConfigurations";

/// Tree path under which per-cache opt-outs live.
///
/// `<OPT_OUT_PATH>.<name>.uncache = false` keeps cache `<name>` persistent.
pub const OPT_OUT_PATH: &str = "EXTCONF.stratum.caching.cacheConfigurations";

const BACKEND_KEY: &str = "backend";
const FRONTEND_KEY: &str = "frontend";
const OPTIONS_KEY: &str = "options";
const UNCACHE_KEY: &str = "uncache";

/// Which downgrade rule an entry falls under, derived from its descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Backend accepts executable code. The null backend counts as one.
    PersistentExecutable,
    /// Variable frontend on any other backend.
    PersistentVariable,
    /// Anything else, including entries that declare neither side.
    Unknown,
}

/// One named cache configuration.
///
/// Keys other than `backend`, `frontend` and `options` are carried through
/// untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfiguration {
    backend: Option<BackendDescriptor>,
    frontend: Option<FrontendDescriptor>,
    options: Option<Value>,
    uncache: Option<bool>,
    rest: Map<String, Value>,
}

impl CacheConfiguration {
    /// An entry with the given descriptors and nothing else.
    pub fn new(backend: Option<BackendDescriptor>, frontend: Option<FrontendDescriptor>) -> Self {
        Self {
            backend,
            frontend,
            options: None,
            uncache: None,
            rest: Map::new(),
        }
    }

    /// Attach backend options.
    #[must_use]
    pub fn with_options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }

    /// Attach an explicit `uncache` flag.
    #[must_use]
    pub fn with_uncache(mut self, uncache: bool) -> Self {
        self.uncache = Some(uncache);
        self.rest.insert(UNCACHE_KEY.to_string(), Value::Bool(uncache));
        self
    }

    /// Read an entry from its tree value.
    ///
    /// Reading never fails. A value that is not a table reads as an empty
    /// entry, and a `backend` or `frontend` that is not an identifier reads
    /// as undeclared but is written back unchanged until the entry is
    /// rewritten. An unreadable `uncache` flag does not opt the entry out.
    pub fn from_value(name: &str, value: &Value, catalog: &CacheCatalog) -> Self {
        let mut rest = match value {
            Value::Object(map) => map.clone(),
            other => {
                warn!(cache = %name, value = %other, "Cache configuration is not a table, reading it as empty");
                Map::new()
            }
        };

        let backend = take_identifier(&mut rest, BACKEND_KEY, name).map(|id| catalog.backend(&id));
        let frontend = take_identifier(&mut rest, FRONTEND_KEY, name).map(|id| catalog.frontend(&id));
        let options = rest.remove(OPTIONS_KEY);
        let uncache = match rest.get(UNCACHE_KEY).map(flag_value) {
            None => None,
            Some(Ok(flag)) => flag,
            Some(Err(reason)) => {
                warn!(cache = %name, %reason, "Ignoring unreadable uncache flag");
                None
            }
        };

        Self {
            backend,
            frontend,
            options,
            uncache,
            rest,
        }
    }

    /// Write the entry back into a tree value.
    pub fn to_value(&self) -> Value {
        let mut map = self.rest.clone();
        if let Some(backend) = &self.backend {
            map.insert(BACKEND_KEY.to_string(), Value::String(backend.id().to_string()));
        }
        if let Some(frontend) = &self.frontend {
            map.insert(FRONTEND_KEY.to_string(), Value::String(frontend.id().to_string()));
        }
        if let Some(options) = &self.options {
            map.insert(OPTIONS_KEY.to_string(), options.clone());
        }
        Value::Object(map)
    }

    /// Backend descriptor, if declared.
    pub fn backend(&self) -> Option<&BackendDescriptor> {
        self.backend.as_ref()
    }

    /// Frontend descriptor, if declared.
    pub fn frontend(&self) -> Option<&FrontendDescriptor> {
        self.frontend.as_ref()
    }

    /// Backend options, if declared.
    pub fn options(&self) -> Option<&Value> {
        self.options.as_ref()
    }

    /// The entry's own `uncache` flag.
    pub fn uncache(&self) -> Option<bool> {
        self.uncache
    }

    /// Classify the entry.
    pub fn capability(&self) -> Capability {
        let backend = self.backend.as_ref().map(BackendDescriptor::kind);
        let frontend = self.frontend.as_ref().map(FrontendDescriptor::kind);
        match (backend, frontend) {
            (Some(kind), _) if kind.is_executable_capable() => Capability::PersistentExecutable,
            (_, Some(FrontendKind::Variable)) => Capability::PersistentVariable,
            _ => Capability::Unknown,
        }
    }

    /// Whether data written to this cache can outlive the request.
    ///
    /// An undeclared backend counts as persistent.
    pub fn is_persistent(&self) -> bool {
        self.backend
            .as_ref()
            .map_or(true, |backend| backend.kind().is_persistent())
    }

    pub(crate) fn set_backend(&mut self, backend: BackendDescriptor) {
        self.rest.remove(BACKEND_KEY);
        self.backend = Some(backend);
    }

    pub(crate) fn set_frontend(&mut self, frontend: FrontendDescriptor) {
        self.rest.remove(FRONTEND_KEY);
        self.frontend = Some(frontend);
    }

    pub(crate) fn clear_options(&mut self) {
        self.options = None;
    }
}

/// Per-cache opt-outs from [`OPT_OUT_PATH`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptOuts {
    flags: BTreeMap<String, bool>,
}

impl OptOuts {
    /// Read opt-outs from a tree. Entries without a readable flag are ignored.
    pub fn from_tree(tree: &ConfigTree) -> Self {
        let mut flags = BTreeMap::new();
        if let Some(Value::Object(entries)) = tree.get(OPT_OUT_PATH) {
            for (name, entry) in entries {
                let flag = entry.get(UNCACHE_KEY).and_then(|v| flag_value(v).ok().flatten());
                match flag {
                    Some(flag) => {
                        flags.insert(name.clone(), flag);
                    }
                    None => warn!(cache = %name, "Ignoring cache opt-out without a boolean uncache flag"),
                }
            }
        }
        Self { flags }
    }

    /// Record a flag for one cache.
    pub fn set(&mut self, name: impl Into<String>, uncache: bool) {
        self.flags.insert(name.into(), uncache);
    }

    /// The flag recorded for a cache.
    pub fn get(&self, name: &str) -> Option<bool> {
        self.flags.get(name).copied()
    }

    /// Whether `name` asked to stay persistent.
    pub fn is_opted_out(&self, name: &str) -> bool {
        self.get(name) == Some(false)
    }
}

/// Named cache configurations in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheRegistry {
    entries: IndexMap<String, CacheConfiguration>,
}

impl CacheRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the registry at [`CACHE_REGISTRY_PATH`]. A missing section is empty.
    pub fn from_tree(tree: &ConfigTree, catalog: &CacheCatalog) -> CacheResult<Self> {
        let entries = match tree.get(CACHE_REGISTRY_PATH) {
            None | Some(Value::Null) => return Ok(Self::new()),
            Some(Value::Object(entries)) => entries,
            Some(_) => {
                return Err(CacheError::InvalidRegistry {
                    path: CACHE_REGISTRY_PATH.to_string(),
                })
            }
        };

        let mut registry = Self::new();
        for (name, value) in entries {
            registry.insert(name.clone(), CacheConfiguration::from_value(name, value, catalog));
        }
        Ok(registry)
    }

    /// Write every entry back under [`CACHE_REGISTRY_PATH`].
    pub fn write_to(&self, tree: &mut ConfigTree) {
        if self.entries.is_empty() && tree.get(CACHE_REGISTRY_PATH).is_none() {
            return;
        }
        tree.set_path(&split_path(CACHE_REGISTRY_PATH), self.to_value());
    }

    /// The registry as a tree value.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(name, entry)| (name.clone(), entry.to_value()))
                .collect(),
        )
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, name: impl Into<String>, entry: CacheConfiguration) {
        self.entries.insert(name.into(), entry);
    }

    /// Look up an entry.
    pub fn get(&self, name: &str) -> Option<&CacheConfiguration> {
        self.entries.get(name)
    }

    /// Entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CacheConfiguration)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut CacheConfiguration)> {
        self.entries.iter_mut().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A registry shared between request handlers.
///
/// Downgrades take the read lock first and only upgrade to the write lock
/// when an entry still needs rewriting, so steady-state requests never
/// contend.
#[derive(Debug, Default)]
pub struct SharedCacheRegistry {
    registry: RwLock<CacheRegistry>,
    opt_outs: OptOuts,
}

impl SharedCacheRegistry {
    /// Share a registry with its opt-outs.
    pub fn new(registry: CacheRegistry, opt_outs: OptOuts) -> Self {
        Self {
            registry: RwLock::new(registry),
            opt_outs,
        }
    }

    /// Read both the registry and opt-outs from a tree.
    pub fn from_tree(tree: &ConfigTree, catalog: &CacheCatalog) -> CacheResult<Self> {
        Ok(Self::new(
            CacheRegistry::from_tree(tree, catalog)?,
            OptOuts::from_tree(tree),
        ))
    }

    /// Opt-outs consulted by [`downgrade`](Self::downgrade).
    pub fn opt_outs(&self) -> &OptOuts {
        &self.opt_outs
    }

    /// Borrow the registry for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, CacheRegistry> {
        self.registry.read()
    }

    /// Clone the current registry.
    pub fn snapshot(&self) -> CacheRegistry {
        self.registry.read().clone()
    }

    /// Downgrade every persistent entry that did not opt out.
    pub fn downgrade(&self) -> DowngradeReport {
        {
            let registry = self.registry.read();
            let report = downgrade::plan(&registry, &self.opt_outs);
            if report.changed() == 0 {
                return report;
            }
        }
        let mut registry = self.registry.write();
        downgrade::downgrade(&mut registry, &self.opt_outs)
    }
}

/// Remove `key` from `rest` when it holds an identifier.
fn take_identifier(rest: &mut Map<String, Value>, key: &str, name: &str) -> Option<String> {
    match rest.remove(key)? {
        Value::String(id) => Some(id),
        Value::Null => None,
        other => {
            warn!(cache = %name, key, value = %other, "Ignoring cache descriptor that is not an identifier");
            rest.insert(key.to_string(), other);
            None
        }
    }
}

fn flag_value(value: &Value) -> Result<Option<bool>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(*b)),
        Value::Number(n) => Ok(Some(n.as_f64().is_some_and(|n| n != 0.0))),
        Value::String(s) => parse_bool(s)
            .map(Some)
            .ok_or_else(|| format!("uncache must be a boolean, got \"{s}\"")),
        _ => Err("uncache must be a boolean".to_string()),
    }
}
