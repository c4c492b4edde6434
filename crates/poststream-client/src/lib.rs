//! # poststream-client
//!
//! High-level client over the poststream streamable HTTP transport.
//!
//! The client fills in protocol plumbing the transport leaves to its caller:
//! request identifiers, the initialize handshake with default parameters, and
//! conversion of server errors into a typed error. It is a thin layer — all
//! real protocol work happens in `poststream-http`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use poststream_client::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::builder()
//!     .base_url("http://localhost:62770")
//!     .connect()
//!     .await?;
//!
//! client.set_notification_handler(|method, params| {
//!     println!("notified: {method} {params:?}");
//! });
//!
//! let tools = client.request("tools/list", None).await?;
//! println!("{tools}");
//! client.close();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, rust_2018_idioms, unreachable_pub, clippy::all)]
#![deny(unsafe_code)]

mod client;
mod error;
mod options;
mod vendor;

pub use client::Client;
pub use error::ClientError;
pub use options::{ClientBuilder, ClientOptions, DEFAULT_BASE_URL};

// Re-exported for callers that work with raw envelopes or cancellation.
pub use poststream_http::{CancellationToken, StreamableHttpTransport, TransportError};
pub use poststream_protocol::{JsonRpcError, JsonRpcResponse};
