//! # Stratum
//!
//! Context-layered configuration bootstrap.
//!
//! A context identifier such as `Development/Local,debug` selects override
//! files from numbered layer folders, environment variables are applied on
//! top, and the result is frozen into a [`ConfigContext`] shared by the
//! application. In development contexts the [`UncacheMiddleware`] stage
//! keeps persistent caches out of the way.
//!
//! ```no_run
//! use stratum::{Bootstrap, LoaderOptions};
//!
//! # fn main() -> Result<(), stratum::StratumError> {
//! let options = LoaderOptions::default().with_sandbox_root("config/context");
//! let context = Bootstrap::with_options("Development/Local", options)?
//!     .use_development_preset()
//!     .include_context_files()?
//!     .load_environment()
//!     .keep_cache("hash")
//!     .finish()?;
//!
//! let uncache = context.uncache_stage();
//! # let _ = uncache;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! | Crate | Purpose |
//! |-------|---------|
//! | [`config`] | Context parsing, layer resolution, overlays |
//! | [`cache`] | Cache registry and development downgrade |
//! | [`middleware`] | The request-time uncache stage |
//! | [`telemetry`] | Logging and metrics setup |

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bootstrap;
mod context;
mod error;
mod options;

pub use stratum_cache as cache;
pub use stratum_config as config;
pub use stratum_middleware as middleware;
pub use stratum_telemetry as telemetry;

pub use bootstrap::Bootstrap;
pub use context::ConfigContext;
pub use error::{StratumError, StratumResult};
pub use options::LoaderOptions;
pub use stratum_middleware::UncacheMiddleware;

/// Environment variable holding the context identifier for the binary.
pub const CONTEXT_ENV: &str = "STRATUM_CONTEXT";

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
