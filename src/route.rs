//! Route definitions: a `"<METHOD> <path>"` key, a terminal handler, and the
//! middleware wrapped around it.

use std::sync::Arc;

use http::Method;

use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{Middleware, Pipeline};

/// One entry of the route table.
///
/// ```rust
/// use apikit::middleware::{Logger, Recovery};
/// use apikit::{PathBuilder, Request, Response, Route};
///
/// # async fn list_users(_: Request) -> Response { Response::ok(()) }
/// let users = PathBuilder::new("users").methods();
/// let route = Route::to(users.get, list_users)
///     .with(Recovery)
///     .with(Logger::new());
/// ```
pub struct Route {
    key: String,
    handler: Option<BoxedHandler>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl Route {
    /// A route with no handler yet. Registering it as-is is a configuration
    /// error.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), handler: None, middleware: Vec::new() }
    }

    /// Shorthand for `Route::new(key).handler(handler)`.
    pub fn to(key: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(key).handler(handler)
    }

    pub fn handler(mut self, handler: impl Handler) -> Self {
        self.handler = Some(handler.into_boxed_handler());
        self
    }

    /// Appends a middleware. The first one added runs outermost.
    pub fn with(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Validates the route and composes its pipeline.
    pub(crate) fn build(self) -> Result<(Method, String, Pipeline), Error> {
        let (method, path) = parse_key(&self.key)?;
        let handler = self
            .handler
            .ok_or_else(|| Error::MissingHandler { route: self.key.clone() })?;
        Ok((method, path.to_owned(), Pipeline::new(handler, self.middleware)))
    }
}

/// Splits `"GET /users"` into its method and path.
fn parse_key(key: &str) -> Result<(Method, &str), Error> {
    let invalid = |reason: &str| Error::InvalidRoute { route: key.to_owned(), reason: reason.to_owned() };

    let (method, path) = key
        .trim()
        .split_once(' ')
        .ok_or_else(|| invalid("expected `<METHOD> <path>`"))?;
    let path = path.trim();
    if !path.starts_with('/') {
        return Err(invalid("path must start with `/`"));
    }
    let method = Method::from_bytes(method.as_bytes()).map_err(|_| invalid("unknown method"))?;
    Ok((method, path))
}
