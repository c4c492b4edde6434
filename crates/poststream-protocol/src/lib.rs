//! # poststream-protocol
//!
//! JSON-RPC 2.0 envelope types and the wire codec used by the poststream
//! transport.
//!
//! Outgoing envelopes ([`JsonRpcRequest`], [`JsonRpcNotification`]) are
//! strict: the version marker always serializes as the literal `"2.0"` and
//! `params` is omitted from the wire when absent. Incoming envelopes
//! ([`JsonRpcResponse`]) are deliberately lenient, because they are parsed at
//! an HTTP boundary where the peer may be non-compliant: the identifier,
//! result, and error are all optional and validated after parsing.
//!
//! The [`codec`] module provides the encode/decode entry points. Decode
//! failures carry the raw payload so callers can diagnose malformed traffic.

#![warn(missing_docs, rust_2018_idioms, unreachable_pub, clippy::all)]
#![deny(unsafe_code)]

mod codec;
mod jsonrpc;

pub use codec::{CodecError, decode_response, decode_response_for_method, encode_message};
pub use jsonrpc::{
    JSONRPC_VERSION, JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    JsonRpcVersion, RequestId,
};

/// Method name of the initialize exchange.
///
/// The transport watches for this method so it can capture the session header
/// from the server's reply.
pub const METHOD_INITIALIZE: &str = "initialize";

/// Method name of the liveness probe.
///
/// This is the only method for which a response without an identifier is
/// accepted.
pub const METHOD_PING: &str = "ping";

/// Protocol revision advertised in the initialize parameters by default.
pub const PROTOCOL_VERSION: &str = "2025-03-26";
