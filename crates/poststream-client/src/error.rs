//! Client error types.

use poststream_http::TransportError;
use poststream_protocol::JsonRpcError;
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by the high-level client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The underlying exchange failed before a response envelope arrived.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a JSON-RPC error object.
    #[error("server returned error {code}: {message}")]
    Rpc {
        /// Numeric error code
        code: i32,
        /// Human-readable message
        message: String,
        /// Optional structured detail
        data: Option<Value>,
    },

    /// The server's tool catalogue did not have the expected shape.
    #[error("malformed tool catalogue: {0}")]
    ToolCatalogue(String),
}

impl From<JsonRpcError> for ClientError {
    fn from(error: JsonRpcError) -> Self {
        Self::Rpc {
            code: error.code,
            message: error.message,
            data: error.data,
        }
    }
}

impl ClientError {
    /// True when the session is gone and `initialize` must be run again.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::Transport(err) if err.is_session_expired())
    }
}
