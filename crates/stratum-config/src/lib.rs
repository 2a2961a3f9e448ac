//! Context-layered configuration for Stratum.
//!
//! Configuration is resolved from a *context identifier* such as
//! `Production/Staging,debug`:
//!
//! - each slash-delimited segment selects a layer directory by position
//!   (`1_*`, `2_*`, ...) inside a sandbox root
//! - each comma-delimited label in a segment names one override file in that
//!   directory (`<label>.toml`)
//! - override files are applied in ascending ordinal order, then
//!   `PREFIX__Section__key` environment variables are applied on top
//!
//! # Layout
//!
//! ```text
//! config/context/
//! ├── 1_environment/
//! │   ├── Development.toml
//! │   └── Production.toml
//! └── 2_server/
//!     ├── Staging.toml
//!     └── debug.toml
//! ```
//!
//! # Example
//!
//! ```no_run
//! use stratum_config::{ApplicationContext, ContextLoader};
//!
//! # fn main() -> Result<(), stratum_config::ConfigError> {
//! let context = ApplicationContext::parse("Production/Staging,debug")?;
//! let config = ContextLoader::new(context)
//!     .with_sandbox_root("config/context")
//!     .with_env_prefix("STRATUM")
//!     .load()?;
//!
//! println!("database: {:?}", config.get_str("DB.Connections.Default.dbname"));
//! # Ok(())
//! # }
//! ```
//!
//! # Security
//!
//! Labels are restricted to `[A-Za-z0-9_-]`, and every override file is
//! canonicalized and required to stay inside the sandbox root. A missing
//! layer directory, a missing file or a file outside the sandbox aborts
//! resolution.

#![warn(missing_docs)]

mod context;
pub mod env;
mod error;
mod layers;
mod loader;
pub mod presets;
mod resolved;
mod resolver;
mod tree;

pub use context::{
    is_label_char, ApplicationContext, ContextKind, ContextPath, SegmentGroup,
    ALTERNATIVE_SEPARATOR, SEGMENT_SEPARATOR,
};
pub use env::{EnvOverlay, DEFAULT_ENV_PREFIX, ENV_DELIMITER};
pub use error::{ConfigError, ConfigResult};
pub use layers::LayerRegistry;
pub use loader::{ContextLoader, EnvSource, DEFAULT_SANDBOX_ROOT};
pub use resolved::{parse_bool, ResolvedConfig};
pub use resolver::{SecureFileResolver, DEFAULT_EXTENSION};
pub use tree::{split_path, ConfigTree, PATH_SEPARATOR};
