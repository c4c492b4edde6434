//! Transport error types.

use poststream_protocol::CodecError;
use thiserror::Error;

/// A specialized `Result` type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Errors surfaced by the streamable HTTP transport.
///
/// A server-reported JSON-RPC error is not a `TransportError`: it comes back
/// as a normal response envelope whose `error` field is set, and callers must
/// inspect that field themselves.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The configured base endpoint is not a valid URL.
    #[error("invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be constructed from the configuration.
    #[error("failed to build HTTP client: {0}")]
    Configuration(String),

    /// Envelope encoding or decoding failed; decode variants carry the raw
    /// payload for diagnosis.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The HTTP exchange itself failed (connection refused, DNS, TLS, ...).
    #[error("failed to send request: {0}")]
    Request(String),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// The server answered with a non-success status and a body that is not
    /// an error-carrying response envelope.
    #[error("request failed with status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The server reported the session gone (404). The stale token has been
    /// cleared; the caller must run the initialize exchange again.
    #[error("session terminated by server (404): re-initialize required")]
    SessionExpired,

    /// The exchange was cancelled by the caller's token or by `close()`.
    #[error("request cancelled")]
    Cancelled,

    /// The response declared a content type the transport does not speak.
    #[error("unexpected content type: {0}")]
    UnexpectedContentType(String),

    /// The event stream ended before a terminal response arrived.
    #[error("stream ended before a terminal response arrived")]
    StreamClosed,
}

impl TransportError {
    /// True when the error means the session is gone and the caller should
    /// re-run the initialize exchange.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}
