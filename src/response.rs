//! Outgoing HTTP response type, the structured-response helpers, and the
//! [`IntoResponse`] conversion trait.
//!
//! Every structured helper funnels into [`Response::send`]:
//!
//! ```rust
//! use apikit::{Json, Response};
//! use http::StatusCode;
//!
//! Response::ok(());                         // 200, empty body
//! Response::ok(Json(42));                   // 200, body `42`
//! Response::ok((1, "two"));                 // 200, body `[1,"two"]`
//! Response::unauthorized("Invalid token");  // 401, body `"Invalid token"`
//! Response::send(StatusCode::ACCEPTED, Json(["queued"]));
//! ```

use std::convert::Infallible;
use std::io::Write;

use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;
use http::header::{CONTENT_ENCODING, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use tracing::{error, warn};

use crate::payload::IntoPayload;

/// The boxed body type handed to hyper.
pub(crate) type ResponseBody = UnsyncBoxBody<Bytes, Infallible>;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Content-type values for use with [`ResponseBuilder::bytes`].
#[derive(Clone, Copy, Debug)]
pub enum ContentType {
    Json,         // application/json
    OctetStream,  // application/octet-stream  (binary / file download)
    Text,         // text/plain; charset=utf-8
}

impl ContentType {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
        }
    }

    fn header_value(&self) -> HeaderValue {
        HeaderValue::from_static(self.as_str())
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// Handlers return exactly one `Response`, so the status line and headers are
/// written once per request by construction.
pub struct Response {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: ResponseBody,
}

impl Response {
    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { status: code, headers: HeaderMap::new(), body: empty_body() }
    }

    /// `200 OK`, `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: HeaderMap::new(), status: StatusCode::OK }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }

    /// Collects the whole body. Streaming bodies are driven to completion.
    pub async fn into_bytes(self) -> Bytes {
        match self.body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        }
    }

    pub(crate) fn into_inner(self) -> http::Response<ResponseBody> {
        let mut res = http::Response::new(self.body);
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }

    // ── Structured JSON responses ─────────────────────────────────────────────

    /// `200 OK`.
    pub fn ok(payload: impl IntoPayload) -> Self {
        Self::send(StatusCode::OK, payload)
    }

    /// `201 Created`.
    pub fn created(payload: impl IntoPayload) -> Self {
        Self::send(StatusCode::CREATED, payload)
    }

    /// `204 No Content`. Never carries a body.
    pub fn no_content() -> Self {
        Self::send(StatusCode::NO_CONTENT, ())
    }

    /// `400 Bad Request`.
    pub fn bad_request(payload: impl IntoPayload) -> Self {
        Self::send(StatusCode::BAD_REQUEST, payload)
    }

    /// `401 Unauthorized`.
    pub fn unauthorized(payload: impl IntoPayload) -> Self {
        Self::send(StatusCode::UNAUTHORIZED, payload)
    }

    /// `403 Forbidden`.
    pub fn forbidden(payload: impl IntoPayload) -> Self {
        Self::send(StatusCode::FORBIDDEN, payload)
    }

    /// `404 Not Found`.
    pub fn not_found(payload: impl IntoPayload) -> Self {
        Self::send(StatusCode::NOT_FOUND, payload)
    }

    /// `429 Too Many Requests`.
    pub fn too_many_requests(payload: impl IntoPayload) -> Self {
        Self::send(StatusCode::TOO_MANY_REQUESTS, payload)
    }

    /// `500 Internal Server Error`.
    pub fn server_error(payload: impl IntoPayload) -> Self {
        Self::send(StatusCode::INTERNAL_SERVER_ERROR, payload)
    }

    /// JSON response with an explicit status.
    ///
    /// - `204` always goes out with an empty body and no content type.
    /// - An empty payload sends the status with `application/json` and no body.
    /// - If the payload cannot be serialized the response becomes a bare `500`.
    pub fn send(status: StatusCode, payload: impl IntoPayload) -> Self {
        if status == StatusCode::NO_CONTENT {
            return Self::status(StatusCode::NO_CONTENT);
        }

        let encoded = match payload.into_payload().and_then(|p| p.encode()) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(status = status.as_u16(), "json encoding failed: {e}");
                return Self::status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        let builder = Self::builder().status(status);
        match encoded {
            Some(body) => builder.bytes(ContentType::Json, body),
            None => builder.header_value(CONTENT_TYPE, ContentType::Json.header_value()).no_body(),
        }
    }

    /// Same payload convention as [`send`](Self::send), compressed with gzip
    /// and tagged `Content-Encoding: gzip`.
    ///
    /// An empty payload is sent uncompressed with no body.
    pub fn gzip(status: StatusCode, payload: impl IntoPayload) -> Self {
        if status == StatusCode::NO_CONTENT {
            return Self::status(StatusCode::NO_CONTENT);
        }

        let encoded = match payload.into_payload().and_then(|p| p.encode()) {
            Ok(Some(encoded)) => encoded,
            Ok(None) => return Self::send(status, ()),
            Err(e) => {
                warn!(status = status.as_u16(), "json encoding failed: {e}");
                return Self::status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        match compress(&encoded) {
            Ok(body) => Self::builder()
                .status(status)
                .header_value(CONTENT_ENCODING, HeaderValue::from_static("gzip"))
                .bytes(ContentType::Json, body),
            Err(e) => {
                error!(status = status.as_u16(), "gzip compression failed: {e}");
                Self::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

fn empty_body() -> ResponseBody {
    Empty::<Bytes>::new().boxed_unsync()
}

fn full_body(bytes: impl Into<Bytes>) -> ResponseBody {
    Full::<Bytes>::new(bytes.into()).boxed_unsync()
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`.
/// Terminated by a typed body method — you always know what you're sending.
pub struct ResponseBuilder {
    headers: HeaderMap,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    /// Sets a header, replacing any previous value. Invalid names or values
    /// are dropped with a warning.
    pub fn header(self, name: &str, value: &str) -> Self {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => self.header_value(name, value),
            _ => {
                warn!(header = name, "dropping invalid response header");
                self
            }
        }
    }

    pub(crate) fn header_value(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        let body: String = body.into();
        self.bytes(ContentType::Text, body)
    }

    /// Terminate with a typed body.
    pub fn bytes(self, content_type: ContentType, body: impl Into<Bytes>) -> Response {
        self.finish(content_type, full_body(body))
    }

    /// Terminate with no body.
    pub fn no_body(self) -> Response {
        Response { status: self.status, headers: self.headers, body: empty_body() }
    }

    pub(crate) fn finish(mut self, content_type: ContentType, body: ResponseBody) -> Response {
        self.headers.insert(CONTENT_TYPE, content_type.header_value());
        Response { status: self.status, headers: self.headers, body }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a [`StatusCode`] directly from a handler: `return StatusCode::NOT_FOUND`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}

/// Lets handlers use `?` with an early-return response.
impl<T: IntoResponse, E: IntoResponse> IntoResponse for Result<T, E> {
    fn into_response(self) -> Response {
        match self {
            Ok(v) => v.into_response(),
            Err(e) => e.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{Json, Payload};
    use flate2::read::GzDecoder;
    use serde_json::json;
    use std::collections::HashMap;
    use std::io::Read;

    fn gunzip(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        GzDecoder::new(data).read_to_end(&mut out).unwrap();
        out
    }

    #[tokio::test]
    async fn send_without_payload_has_empty_body() {
        let res = Response::send(StatusCode::OK, ());
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.headers()[CONTENT_TYPE], "application/json");
        assert!(res.into_bytes().await.is_empty());
    }

    #[tokio::test]
    async fn send_single_value_is_not_wrapped() {
        let res = Response::send(StatusCode::OK, Json(json!({"id": 42})));
        assert_eq!(&res.into_bytes().await[..], br#"{"id":42}"#);
    }

    #[tokio::test]
    async fn send_several_values_is_an_array() {
        let res = Response::send(StatusCode::OK, (json!({"id": 1}), json!({"id": 2})));
        assert_eq!(&res.into_bytes().await[..], br#"[{"id":1},{"id":2}]"#);
    }

    #[tokio::test]
    async fn no_content_ignores_payload() {
        let res = Response::send(StatusCode::NO_CONTENT, "ignored");
        assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
        assert!(res.headers().get(CONTENT_TYPE).is_none());
        assert!(res.into_bytes().await.is_empty());

        assert_eq!(Response::no_content().status_code(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn named_helpers_use_their_status() {
        let cases = [
            (Response::ok(()), StatusCode::OK),
            (Response::created(()), StatusCode::CREATED),
            (Response::bad_request(()), StatusCode::BAD_REQUEST),
            (Response::unauthorized(()), StatusCode::UNAUTHORIZED),
            (Response::forbidden(()), StatusCode::FORBIDDEN),
            (Response::not_found(()), StatusCode::NOT_FOUND),
            (Response::too_many_requests(()), StatusCode::TOO_MANY_REQUESTS),
            (Response::server_error(()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (res, expected) in cases {
            assert_eq!(res.status_code(), expected);
        }

        let res = Response::unauthorized("Invalid token");
        assert_eq!(&res.into_bytes().await[..], br#""Invalid token""#);
    }

    #[tokio::test]
    async fn encoding_failure_downgrades_to_bare_500() {
        let mut bad = HashMap::new();
        bad.insert((1, 2), 3);

        let res = Response::ok(Json(&bad));
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(res.headers().get(CONTENT_TYPE).is_none());
        assert!(res.into_bytes().await.is_empty());

        let res = Response::gzip(StatusCode::OK, Json(&bad));
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(res.headers().get(CONTENT_ENCODING).is_none());
    }

    #[tokio::test]
    async fn gzip_body_decompresses_to_send_body() {
        let obj = json!({"items": [1, 2, 3], "name": "inventory"});

        let zipped = Response::gzip(StatusCode::OK, Json(&obj));
        assert_eq!(zipped.status_code(), StatusCode::OK);
        assert_eq!(zipped.headers()[CONTENT_ENCODING], "gzip");
        assert_eq!(zipped.headers()[CONTENT_TYPE], "application/json");

        let plain = Response::send(StatusCode::OK, Json(&obj)).into_bytes().await;
        assert_eq!(gunzip(&zipped.into_bytes().await), plain.to_vec());
    }

    #[tokio::test]
    async fn gzip_without_payload_is_not_compressed() {
        let res = Response::gzip(StatusCode::OK, Payload::Empty);
        assert!(res.headers().get(CONTENT_ENCODING).is_none());
        assert!(res.into_bytes().await.is_empty());
    }

    #[test]
    fn builder_drops_invalid_headers() {
        let res = Response::builder()
            .header("x-ok", "yes")
            .header("bad header", "value")
            .no_body();
        assert_eq!(res.headers().len(), 1);
        assert_eq!(res.headers()["x-ok"], "yes");
    }

    #[tokio::test]
    async fn result_maps_either_side() {
        let ok: Result<Response, StatusCode> = Ok(Response::text("fine"));
        assert_eq!(ok.into_response().status_code(), StatusCode::OK);

        let err: Result<Response, StatusCode> = Err(StatusCode::CONFLICT);
        assert_eq!(err.into_response().status_code(), StatusCode::CONFLICT);
    }
}
