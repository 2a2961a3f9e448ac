//! Request stages.
//!
//! - [`uncache`] - downgrade persistent caches while developing

pub mod uncache;

pub use uncache::UncacheMiddleware;
