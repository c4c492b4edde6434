//! # poststream-http
//!
//! Streamable HTTP client transport for JSON-RPC.
//!
//! The transport transmits one JSON-RPC message per HTTP POST to a single
//! base endpoint. The response body is either a single JSON envelope or an
//! upgraded server-push event stream that concludes with the envelope for the
//! same request; out-of-band notifications arriving mid-stream are routed to
//! a registered handler.
//!
//! ## Features
//!
//! - **Accept negotiation**: every exchange advertises both
//!   `application/json` and `text/event-stream`
//! - **Session management**: the server-issued session token is captured
//!   during the initialize exchange and attached to every subsequent one
//! - **Session-expiry recovery signal**: a 404 clears the stale token and
//!   surfaces a distinguished re-initialize error
//! - **Concurrent exchanges**: calls never serialize behind one another; the
//!   session token is the only shared hot-path state and is lock-free
//! - **Cooperative teardown**: `close()` unblocks every in-flight exchange
//!   and sends a best-effort session termination notice
//!
//! Unsupported by design: message batching, persistent/resumable listening
//! streams, and server-initiated requests to the client.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use poststream_http::{CancellationToken, StreamableHttpConfig, StreamableHttpTransport};
//! use poststream_protocol::JsonRpcRequest;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = StreamableHttpTransport::new(
//!     "http://localhost:62770",
//!     StreamableHttpConfig::default(),
//! )?;
//!
//! let request = JsonRpcRequest::new("1", "initialize", None);
//! let response = transport
//!     .send_request(request, CancellationToken::new())
//!     .await?;
//! println!("session: {}", transport.session_id());
//! # let _ = response;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, rust_2018_idioms, unreachable_pub, clippy::all)]
#![deny(unsafe_code)]

mod error;
mod session;
mod sse;
mod transport;

pub use error::{TransportError, TransportResult};
pub use transport::{
    NotificationHandler, SESSION_HEADER, StreamableHttpConfig, StreamableHttpTransport,
};

// Re-exported so callers do not need a direct tokio-util dependency to cancel
// an exchange.
pub use tokio_util::sync::CancellationToken;
