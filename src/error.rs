//! Unified error type.

/// The error type returned by apikit's fallible operations.
///
/// Application-level failures (401, 404, 500, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// route-table mistakes at startup, listener failures, and body decoding
/// failures handed back to the handler that asked for them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Binding the listener or another transport-level I/O failure.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// A route was registered without a terminal handler.
    #[error("handler is missing for route `{route}`")]
    MissingHandler { route: String },

    /// The route key is malformed or conflicts with an existing route.
    #[error("invalid route `{route}`: {reason}")]
    InvalidRoute { route: String, reason: String },

    /// The request body is not valid JSON for the requested type.
    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),
}
