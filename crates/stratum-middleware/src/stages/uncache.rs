//! Development cache downgrade stage.
//!
//! While the application runs in a development context, every request first
//! rewrites persistent cache configurations to null or per-request memory
//! storage, so edits show up without flushing caches. Outside development
//! the stage only forwards the request.
//!
//! The [`DowngradeReport`] of the pass is stored in the request extensions.

use std::sync::Arc;

use stratum_cache::{DowngradeReport, SharedCacheRegistry};
use tracing::debug;

use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Middleware that downgrades persistent caches in development.
#[derive(Debug, Clone)]
pub struct UncacheMiddleware {
    registry: Arc<SharedCacheRegistry>,
    development: bool,
}

impl UncacheMiddleware {
    /// Creates the stage for a shared registry.
    ///
    /// `development` is the classification of the running context.
    #[must_use]
    pub fn new(registry: Arc<SharedCacheRegistry>, development: bool) -> Self {
        Self {
            registry,
            development,
        }
    }

    /// Whether the stage rewrites caches.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.development
    }

    /// The registry this stage rewrites.
    #[must_use]
    pub fn registry(&self) -> &Arc<SharedCacheRegistry> {
        &self.registry
    }
}

impl Middleware for UncacheMiddleware {
    fn name(&self) -> &'static str {
        "uncache"
    }

    fn process<'a>(&'a self, mut request: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if self.development {
                let report: DowngradeReport = self.registry.downgrade();
                debug!(
                    method = %request.method(),
                    path = %request.uri().path(),
                    changed = report.changed(),
                    unchanged = report.unchanged(),
                    "Cache downgrade pass"
                );
                request.extensions_mut().insert(report);
            }
            next.run(request).await
        })
    }
}
