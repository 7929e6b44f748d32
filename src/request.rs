//! Incoming HTTP request type and the JSON body decoder.

use std::collections::HashMap;
use std::net::SocketAddr;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::de::DeserializeOwned;

use crate::context::Context;
use crate::error::Error;

/// An incoming HTTP request with its body already collected.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
    pub(crate) remote_addr: Option<SocketAddr>,
    pub(crate) context: Context,
}

impl Request {
    /// Starts building a request in-process, e.g. for [`Router::handle`](crate::Router::handle).
    pub fn builder(method: Method, path: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            inner: Request {
                method,
                path: path.into(),
                headers: HeaderMap::new(),
                body: Bytes::new(),
                params: HashMap::new(),
                remote_addr: None,
                context: Context::background(),
            },
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }
    pub fn context(&self) -> Context { self.context }

    /// Case-insensitive header lookup. Values that are not visible ASCII are
    /// treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `GET /users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Replaces the request context, returning the narrowed request.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Decodes the body as JSON into `T`. See [`decode_json`].
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        decode_json(self)
    }
}

/// Decodes a request body as JSON into a typed value.
///
/// Errors are returned as-is. Turning a malformed body into a `400` is the
/// calling handler's decision:
///
/// ```rust
/// use apikit::{decode_json, Request, Response};
/// # #[derive(serde::Deserialize)] struct NewUser { name: String }
///
/// async fn create_user(req: Request) -> Response {
///     let Ok(user) = decode_json::<NewUser>(&req) else {
///         return Response::bad_request("malformed body");
///     };
///     Response::created(user.name)
/// }
/// ```
pub fn decode_json<T: DeserializeOwned>(req: &Request) -> Result<T, Error> {
    Ok(serde_json::from_slice(&req.body)?)
}

/// Fluent builder for [`Request`]. Obtain via [`Request::builder`].
pub struct RequestBuilder {
    inner: Request,
}

impl RequestBuilder {
    /// Appends a header. Invalid names or values are skipped.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.inner.headers.append(name, value);
        }
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.inner.body = body.into();
        self
    }

    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.inner.remote_addr = Some(addr);
        self
    }

    pub fn build(self) -> Request {
        self.inner
    }
}
