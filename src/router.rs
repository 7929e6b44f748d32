//! Route table.
//!
//! One radix tree per HTTP method. Static paths match exactly; `{name}`
//! segments are captured as path parameters. Every entry is a fully composed
//! [`Pipeline`](crate::middleware) built once at startup.

use std::collections::HashMap;
use std::sync::Arc;

use http::header::ALLOW;
use http::{HeaderValue, Method, StatusCode};
use matchit::Router as MatchitRouter;

use crate::error::Error;
use crate::handler::BoxedHandler;
use crate::request::Request;
use crate::response::Response;
use crate::route::Route;

/// The application router.
///
/// Build it once at startup with [`Router::from_routes`]; a route without a
/// handler or with a malformed key fails the whole table.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Builds a router from a route table, stopping at the first bad route.
    pub fn from_routes(routes: impl IntoIterator<Item = Route>) -> Result<Self, Error> {
        let mut router = Self::new();
        for route in routes {
            router.add(route)?;
        }
        Ok(router)
    }

    /// Registers one route.
    pub fn add(&mut self, route: Route) -> Result<(), Error> {
        let key = route.key().to_owned();
        let (method, path, pipeline) = route.build()?;

        self.routes
            .entry(method)
            .or_default()
            .insert(path, Arc::new(pipeline))
            .map_err(|e| Error::InvalidRoute { route: key, reason: e.to_string() })
    }

    /// Dispatches a request through the matching pipeline.
    ///
    /// Unknown paths get `404`; paths registered only under other methods get
    /// `405` with an `Allow` header.
    pub async fn handle(&self, req: Request) -> Response {
        match self.lookup(req.method(), req.path()) {
            Some((handler, params)) => {
                let mut req = req;
                req.params = params;
                handler.call(req).await
            }
            None => self.unmatched(req.path()),
        }
    }

    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }

    fn unmatched(&self, path: &str) -> Response {
        let mut allowed: Vec<&str> = self
            .routes
            .iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(method, _)| method.as_str())
            .collect();

        if allowed.is_empty() {
            return Response::builder()
                .status(StatusCode::NOT_FOUND)
                .text("404 page not found");
        }

        allowed.sort_unstable();
        let allow = HeaderValue::from_str(&allowed.join(", "))
            .unwrap_or_else(|_| HeaderValue::from_static(""));
        Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .header_value(ALLOW, allow)
            .text("Method Not Allowed")
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
