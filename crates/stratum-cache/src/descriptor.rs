//! Tagged cache backend and frontend descriptors.
//!
//! A cache entry names its backend and frontend by identifier. The
//! [`CacheCatalog`] maps identifiers to a kind tag so the downgrade pass can
//! ask what an entry *is* instead of inspecting identifier strings.

use std::collections::HashMap;
use std::fmt;

/// Identifier of the backend that stores nothing.
pub const NULL_BACKEND: &str = "null";

/// Identifier of the in-process backend that lives for one request.
pub const TRANSIENT_MEMORY_BACKEND: &str = "transient-memory";

/// Identifier of the frontend that stores arbitrary serializable values.
pub const VARIABLE_FRONTEND: &str = "variable";

/// What a cache backend does with its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Persists generated executable code (file based code caches).
    Executable,
    /// Persists data across requests.
    Persistent,
    /// Discards everything. Accepts executable code like [`Self::Executable`].
    Null,
    /// Keeps data in memory for the current request only.
    TransientMemory,
}

impl BackendKind {
    /// Whether data written through this backend survives the request.
    pub fn is_persistent(self) -> bool {
        matches!(self, Self::Executable | Self::Persistent)
    }

    /// Whether the backend accepts generated executable code.
    pub fn is_executable_capable(self) -> bool {
        matches!(self, Self::Executable | Self::Null)
    }
}

/// How a cache frontend treats its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontendKind {
    /// Arbitrary serializable values.
    Variable,
    /// Anything else (code, strings, custom frontends).
    Other,
}

/// A backend identifier together with its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendDescriptor {
    id: String,
    kind: BackendKind,
}

impl BackendDescriptor {
    /// Create a descriptor.
    pub fn new(id: impl Into<String>, kind: BackendKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    /// The backend that stores nothing.
    pub fn null() -> Self {
        Self::new(NULL_BACKEND, BackendKind::Null)
    }

    /// The per-request memory backend.
    pub fn transient_memory() -> Self {
        Self::new(TRANSIENT_MEMORY_BACKEND, BackendKind::TransientMemory)
    }

    /// Identifier as written in configuration.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Kind tag.
    pub fn kind(&self) -> BackendKind {
        self.kind
    }
}

impl fmt::Display for BackendDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// A frontend identifier together with its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontendDescriptor {
    id: String,
    kind: FrontendKind,
}

impl FrontendDescriptor {
    /// Create a descriptor.
    pub fn new(id: impl Into<String>, kind: FrontendKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    /// The variable frontend.
    pub fn variable() -> Self {
        Self::new(VARIABLE_FRONTEND, FrontendKind::Variable)
    }

    /// Identifier as written in configuration.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Kind tag.
    pub fn kind(&self) -> FrontendKind {
        self.kind
    }
}

impl fmt::Display for FrontendDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Maps configuration identifiers to kind tags.
///
/// Unknown backends are treated as [`BackendKind::Persistent`] and unknown
/// frontends as [`FrontendKind::Other`].
#[derive(Debug, Clone)]
pub struct CacheCatalog {
    backends: HashMap<String, BackendKind>,
    frontends: HashMap<String, FrontendKind>,
}

impl CacheCatalog {
    /// A catalog with no registered identifiers.
    pub fn empty() -> Self {
        Self {
            backends: HashMap::new(),
            frontends: HashMap::new(),
        }
    }

    /// Register a backend identifier.
    #[must_use]
    pub fn with_backend(mut self, id: impl Into<String>, kind: BackendKind) -> Self {
        self.backends.insert(id.into(), kind);
        self
    }

    /// Register a frontend identifier.
    #[must_use]
    pub fn with_frontend(mut self, id: impl Into<String>, kind: FrontendKind) -> Self {
        self.frontends.insert(id.into(), kind);
        self
    }

    /// Classify a backend identifier.
    pub fn backend(&self, id: &str) -> BackendDescriptor {
        let kind = self
            .backends
            .get(id)
            .copied()
            .unwrap_or(BackendKind::Persistent);
        BackendDescriptor::new(id, kind)
    }

    /// Classify a frontend identifier.
    pub fn frontend(&self, id: &str) -> FrontendDescriptor {
        let kind = self
            .frontends
            .get(id)
            .copied()
            .unwrap_or(FrontendKind::Other);
        FrontendDescriptor::new(id, kind)
    }
}

impl Default for CacheCatalog {
    fn default() -> Self {
        Self::empty()
            .with_backend(NULL_BACKEND, BackendKind::Null)
            .with_backend(TRANSIENT_MEMORY_BACKEND, BackendKind::TransientMemory)
            .with_backend("file", BackendKind::Executable)
            .with_backend("simple-file", BackendKind::Executable)
            .with_backend("database", BackendKind::Persistent)
            .with_backend("redis", BackendKind::Persistent)
            .with_backend("memcached", BackendKind::Persistent)
            .with_backend("apcu", BackendKind::Persistent)
            .with_frontend(VARIABLE_FRONTEND, FrontendKind::Variable)
            .with_frontend("code", FrontendKind::Other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = CacheCatalog::default();
        assert_eq!(catalog.backend("simple-file").kind(), BackendKind::Executable);
        assert_eq!(catalog.backend("redis").kind(), BackendKind::Persistent);
        assert_eq!(catalog.backend(NULL_BACKEND), BackendDescriptor::null());
        assert_eq!(catalog.frontend(VARIABLE_FRONTEND), FrontendDescriptor::variable());
        assert_eq!(catalog.frontend("code").kind(), FrontendKind::Other);
    }

    #[test]
    fn test_unknown_identifiers() {
        let catalog = CacheCatalog::default();
        let backend = catalog.backend("vendor-s3");
        assert_eq!(backend.id(), "vendor-s3");
        assert!(backend.kind().is_persistent());
        assert_eq!(catalog.frontend("vendor-json").kind(), FrontendKind::Other);
    }

    #[test]
    fn test_custom_registration() {
        let catalog = CacheCatalog::default()
            .with_backend("vendor-code", BackendKind::Executable)
            .with_frontend("vendor-values", FrontendKind::Variable);
        assert_eq!(catalog.backend("vendor-code").kind(), BackendKind::Executable);
        assert_eq!(catalog.frontend("vendor-values").kind(), FrontendKind::Variable);
    }

    #[test]
    fn test_persistence() {
        assert!(BackendKind::Executable.is_persistent());
        assert!(BackendKind::Persistent.is_persistent());
        assert!(!BackendKind::Null.is_persistent());
        assert!(!BackendKind::TransientMemory.is_persistent());
    }

    #[test]
    fn test_executable_capability() {
        assert!(BackendKind::Executable.is_executable_capable());
        assert!(BackendKind::Null.is_executable_capable());
        assert!(!BackendKind::Persistent.is_executable_capable());
        assert!(!BackendKind::TransientMemory.is_executable_capable());
    }
}
