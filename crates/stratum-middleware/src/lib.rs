//! # Stratum Middleware
//!
//! The request-time development cache downgrade.
//!
//! [`UncacheMiddleware`] runs before the handler. While the application
//! runs in a development context it rewrites persistent cache
//! configurations and stores the [`DowngradeReport`](stratum_cache::DowngradeReport)
//! of the pass in the request extensions.
//!
//! ```text
//! Request → Uncache → Handler
//! ```
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use stratum_cache::SharedCacheRegistry;
//! use stratum_middleware::{Middleware, UncacheMiddleware};
//!
//! let registry = Arc::new(SharedCacheRegistry::default());
//! let stage = UncacheMiddleware::new(registry, true);
//! assert_eq!(stage.name(), "uncache");
//! assert!(stage.is_active());
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod middleware;
pub mod types;
pub mod stages;

pub use middleware::{BoxFuture, Middleware, Next};
pub use types::{Request, Response};
pub use stages::UncacheMiddleware;
