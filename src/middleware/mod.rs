//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns: access logging, authentication, fault recovery,
//! deadlines and CORS.
//!
//! # Ordering
//!
//! Middleware attached to a route runs in the order it was declared, the
//! first one outermost:
//!
//! ```text
//! Route::to("GET /users", list_users)
//!     .with(Recovery)        ← runs first, sees the final response last
//!     .with(Logger::new())
//!     .with(BearerAuth::new(token))
//!
//! Recovery → Logger → BearerAuth → list_users → BearerAuth → Logger → Recovery
//! ```
//!
//! A middleware that returns without calling [`Next::run`] short-circuits:
//! nothing further inward executes.
//!
//! # Writing one
//!
//! ```rust
//! use apikit::middleware::{Middleware, Next};
//! use apikit::{BoxFuture, Request};
//!
//! struct ServerHeader;
//!
//! impl Middleware for ServerHeader {
//!     fn call<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a> {
//!         Box::pin(async move {
//!             let mut res = next.run(req).await;
//!             res.headers_mut().insert("server", "apikit".parse().unwrap());
//!             res
//!         })
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::Request;

mod auth;
mod cors;
mod logger;
mod recovery;
mod timeout;

pub use auth::{BearerAuth, HeaderAuth};
pub use cors::Cors;
pub use logger::Logger;
pub use recovery::Recovery;
pub use timeout::Timeout;

/// A request interceptor that decides whether, and how, to call the rest of
/// the chain.
pub trait Middleware: Send + Sync + 'static {
    fn call<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a>;
}

/// The remainder of a pipeline: the middleware still to run, then the
/// terminal handler.
pub struct Next<'a> {
    middleware: &'a [Arc<dyn Middleware>],
    endpoint: &'a BoxedHandler,
}

impl<'a> Next<'a> {
    /// Passes the request one layer inward.
    pub fn run(self, req: Request) -> BoxFuture<'a> {
        match self.middleware.split_first() {
            Some((head, rest)) => head.call(req, Next { middleware: rest, endpoint: self.endpoint }),
            None => self.endpoint.call(req),
        }
    }
}

/// A terminal handler wrapped in its ordered middleware.
///
/// Built once per route at startup and shared read-only across requests.
pub(crate) struct Pipeline {
    middleware: Vec<Arc<dyn Middleware>>,
    endpoint: BoxedHandler,
}

impl Pipeline {
    pub(crate) fn new(endpoint: BoxedHandler, middleware: Vec<Arc<dyn Middleware>>) -> Self {
        Self { middleware, endpoint }
    }
}

impl ErasedHandler for Pipeline {
    fn call(&self, req: Request) -> BoxFuture<'_> {
        Next { middleware: &self.middleware, endpoint: &self.endpoint }.run(req)
    }
}
