//! The [`Middleware`] trait and the [`Next`] continuation.

use std::future::Future;
use std::pin::Pin;

use crate::types::{Request, Response};

/// A boxed future that returns a response.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A stage that runs before the handler.
///
/// A stage either calls `next.run` once or answers the request itself.
pub trait Middleware: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Handle the request, usually by delegating to `next`.
    fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Response>;
}

type Handler<'a> = Box<dyn FnOnce(Request) -> BoxFuture<'static, Response> + Send + 'a>;

/// The handler waiting behind a stage.
pub struct Next<'a> {
    handler: Handler<'a>,
}

impl<'a> Next<'a> {
    /// Wrap the handler.
    pub fn new<F>(handler: F) -> Self
    where
        F: FnOnce(Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self {
            handler: Box::new(handler),
        }
    }

    /// Hand the request to the handler.
    pub async fn run(self, request: Request) -> Response {
        (self.handler)(request).await
    }
}
