//! Wire codec: envelope encoding and decoding at the HTTP boundary.

use serde::Serialize;
use thiserror::Error;

use crate::METHOD_PING;
use crate::jsonrpc::JsonRpcResponse;

/// Errors produced while encoding or decoding envelopes.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The outgoing envelope held parameters that cannot be serialized.
    ///
    /// This is a caller bug, not a recoverable transport condition.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    /// The incoming bytes were not a well-formed response envelope.
    #[error("failed to decode response: {source}; raw payload: {payload}")]
    Decode {
        /// Underlying parse failure
        #[source]
        source: serde_json::Error,
        /// The offending payload, for diagnosis
        payload: String,
    },

    /// The response carried no identifier for a method that requires one.
    ///
    /// Only the liveness probe is permitted a null identifier.
    #[error("response is missing a request id; raw payload: {payload}")]
    MissingId {
        /// The offending payload, for diagnosis
        payload: String,
    },
}

/// Encode an outgoing envelope to its wire bytes.
pub fn encode_message<T: Serialize>(message: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(message).map_err(CodecError::Encode)
}

/// Decode a response envelope from wire bytes.
///
/// No identifier validation is applied here; use
/// [`decode_response_for_method`] when the originating method is known.
pub fn decode_response(bytes: &[u8]) -> Result<JsonRpcResponse, CodecError> {
    serde_json::from_slice(bytes).map_err(|source| CodecError::Decode {
        source,
        payload: String::from_utf8_lossy(bytes).into_owned(),
    })
}

/// Decode a response envelope and enforce the identifier rule for `method`.
///
/// A null identifier is valid only when the originating request was the
/// liveness probe; for every other method it is a protocol violation.
pub fn decode_response_for_method(
    bytes: &[u8],
    method: &str,
) -> Result<JsonRpcResponse, CodecError> {
    let response = decode_response(bytes)?;
    if response.id.is_none() && method != METHOD_PING {
        return Err(CodecError::MissingId {
            payload: String::from_utf8_lossy(bytes).into_owned(),
        });
    }
    Ok(response)
}
