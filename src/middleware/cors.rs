use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use tracing::warn;

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;

const ALLOW_HEADERS: &str = "Content-Type, Authorization";
const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// Cross-origin headers for a single allowed origin.
///
/// Preflight (`OPTIONS`) requests are answered here with `204` and never
/// reach the handler. On other requests, headers the handler set itself are
/// left alone.
#[derive(Clone, Debug)]
pub struct Cors {
    origin: HeaderValue,
}

impl Cors {
    /// An origin that is not a valid header value falls back to `null`.
    pub fn new(origin: &str) -> Self {
        let origin = HeaderValue::from_str(origin).unwrap_or_else(|_| {
            warn!(origin, "invalid CORS origin, using `null`");
            HeaderValue::from_static("null")
        });
        Self { origin }
    }

    fn apply(&self, headers: &mut HeaderMap) {
        headers.entry(ACCESS_CONTROL_ALLOW_ORIGIN).or_insert_with(|| self.origin.clone());
        headers
            .entry(ACCESS_CONTROL_ALLOW_HEADERS)
            .or_insert_with(|| HeaderValue::from_static(ALLOW_HEADERS));
        headers
            .entry(ACCESS_CONTROL_ALLOW_METHODS)
            .or_insert_with(|| HeaderValue::from_static(ALLOW_METHODS));
    }
}

impl Middleware for Cors {
    fn call<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a> {
        Box::pin(async move {
            let mut res = if req.method() == Method::OPTIONS {
                Response::status(StatusCode::NO_CONTENT)
            } else {
                next.run(req).await
            };
            self.apply(res.headers_mut());
            res
        })
    }
}
