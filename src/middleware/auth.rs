//! Header-based authentication.
//!
//! Both middleware answer every failure (missing header, wrong scheme, bad
//! token) with the same `401 "Invalid token"` and never call downstream.

use http::header::AUTHORIZATION;

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;

const INVALID_TOKEN: &str = "Invalid token";

/// Extracts `<token>` from `Bearer <token>`.
///
/// The value must be exactly two whitespace-separated words and the scheme is
/// matched case-insensitively.
fn bearer_token(value: &str) -> Option<&str> {
    let mut fields = value.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Some(token),
        _ => None,
    }
}

/// Requires `Authorization: Bearer <expected>`.
#[derive(Clone, Debug)]
pub struct BearerAuth {
    expected: String,
}

impl BearerAuth {
    pub fn new(expected: impl Into<String>) -> Self {
        Self { expected: expected.into() }
    }

    fn accepts(&self, req: &Request) -> bool {
        req.header(AUTHORIZATION.as_str())
            .and_then(bearer_token)
            .is_some_and(|token| token == self.expected)
    }
}

impl Middleware for BearerAuth {
    fn call<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a> {
        if !self.accepts(&req) {
            return Box::pin(async { Response::unauthorized(INVALID_TOKEN) });
        }
        next.run(req)
    }
}

type Validator = dyn Fn(&str) -> bool + Send + Sync;

/// Validates a token from a configurable header with a caller-supplied
/// predicate.
///
/// Defaults to `Authorization: Bearer <token>`. With
/// [`require_bearer(false)`](Self::require_bearer) the first word of the
/// header is validated as-is:
///
/// ```rust
/// use apikit::middleware::HeaderAuth;
///
/// let keys = ["k-live-1", "k-live-2"];
/// let auth = HeaderAuth::new(move |key| keys.iter().any(|k| *k == key))
///     .header("x-api-key")
///     .require_bearer(false);
/// ```
pub struct HeaderAuth {
    validator: Box<Validator>,
    header: String,
    require_bearer: bool,
}

impl HeaderAuth {
    pub fn new(validator: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            validator: Box::new(validator),
            header: AUTHORIZATION.as_str().to_owned(),
            require_bearer: true,
        }
    }

    /// Header to read the credential from.
    pub fn header(mut self, name: impl Into<String>) -> Self {
        self.header = name.into();
        self
    }

    /// Whether the header must use the `Bearer <token>` form.
    pub fn require_bearer(mut self, required: bool) -> Self {
        self.require_bearer = required;
        self
    }

    fn accepts(&self, req: &Request) -> bool {
        let value = req.header(&self.header).unwrap_or_default();
        let token = if self.require_bearer {
            bearer_token(value)
        } else {
            value.split_whitespace().next()
        };
        token.is_some_and(|t| (self.validator)(t))
    }
}

impl Middleware for HeaderAuth {
    fn call<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a> {
        if !self.accepts(&req) {
            return Box::pin(async { Response::unauthorized(INVALID_TOKEN) });
        }
        next.run(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{ErasedHandler, Handler};
    use crate::middleware::Pipeline;
    use http::{Method, StatusCode};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn guarded(auth: impl Middleware) -> (Pipeline, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let endpoint = (move |_req: Request| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Response::ok("secret") }
        })
        .into_boxed_handler();
        (Pipeline::new(endpoint, vec![Arc::new(auth)]), hits)
    }

    fn with_header(name: &str, value: &str) -> Request {
        Request::builder(Method::GET, "/private").header(name, value).build()
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bEaReR   abc  "), Some("abc"));
        assert_eq!(bearer_token("abc"), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer abc def"), None);
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token(""), None);
    }

    #[tokio::test]
    async fn bearer_auth_accepts_expected_token() {
        let (p, hits) = guarded(BearerAuth::new("abc"));
        let res = p.call(with_header("authorization", "Bearer abc")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bearer_auth_rejects_everything_else() {
        let (p, hits) = guarded(BearerAuth::new("abc"));
        let rejected = [
            with_header("authorization", "Bearer xyz"),
            with_header("authorization", "abc"),
            Request::builder(Method::GET, "/private").build(),
        ];
        for req in rejected {
            let res = p.call(req).await;
            assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
            assert_eq!(&res.into_bytes().await[..], br#""Invalid token""#);
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn header_auth_defaults_to_bearer_authorization() {
        let (p, hits) = guarded(HeaderAuth::new(|t| t == "tok-1"));
        assert_eq!(p.call(with_header("authorization", "Bearer tok-1")).await.status_code(), StatusCode::OK);
        assert_eq!(p.call(with_header("authorization", "tok-1")).await.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn header_auth_custom_header_without_bearer() {
        let auth = HeaderAuth::new(|t| t.starts_with("k-"))
            .header("x-api-key")
            .require_bearer(false);
        let (p, hits) = guarded(auth);

        assert_eq!(p.call(with_header("x-api-key", "k-123")).await.status_code(), StatusCode::OK);
        assert_eq!(p.call(with_header("x-api-key", "  k-9 trailing")).await.status_code(), StatusCode::OK);
        assert_eq!(p.call(with_header("x-api-key", "nope")).await.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(p.call(with_header("x-api-key", "   ")).await.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(p.call(with_header("authorization", "k-123")).await.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
