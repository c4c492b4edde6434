//! Client configuration.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::{Value, json};

use crate::client::Client;
use crate::error::ClientError;

/// Base endpoint used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:62770";

/// Client configuration. Every field has a usable default.
#[derive(Clone, Debug)]
pub struct ClientOptions {
    /// Base endpoint URL of the server. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Static headers attached to every exchange; a name colliding with a
    /// transport default (including the session header) wins. Default: none.
    pub headers: HashMap<String, String>,

    /// Per-exchange timeout covering the full HTTP exchange. Default: none.
    pub timeout: Option<Duration>,

    /// Protocol revision advertised during initialize. Default:
    /// [`poststream_protocol::PROTOCOL_VERSION`].
    pub protocol_version: String,

    /// Capabilities advertised during initialize. Default: empty object.
    pub capabilities: Value,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            headers: HashMap::new(),
            timeout: None,
            protocol_version: poststream_protocol::PROTOCOL_VERSION.to_owned(),
            capabilities: json!({}),
        }
    }
}

/// Fluent builder for [`ClientOptions`].
#[derive(Clone, Debug, Default)]
pub struct ClientBuilder {
    options: ClientOptions,
}

impl ClientBuilder {
    /// Create a builder holding the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base endpoint URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.options.base_url = base_url.into();
        self
    }

    /// Add one static header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.headers.insert(name.into(), value.into());
        self
    }

    /// Replace the full static header set.
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.options.headers = headers;
        self
    }

    /// Set the per-exchange timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Set the protocol revision advertised during initialize.
    pub fn protocol_version(mut self, version: impl Into<String>) -> Self {
        self.options.protocol_version = version.into();
        self
    }

    /// Set the capabilities advertised during initialize.
    pub fn capabilities(mut self, capabilities: Value) -> Self {
        self.options.capabilities = capabilities;
        self
    }

    /// Finish the builder without connecting.
    pub fn build(self) -> ClientOptions {
        self.options
    }

    /// Construct the client and run the initialize exchange.
    pub async fn connect(self) -> Result<Client, ClientError> {
        Client::connect(self.options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_documented_values() {
        let options = ClientOptions::default();
        assert_eq!(options.base_url, DEFAULT_BASE_URL);
        assert!(options.headers.is_empty());
        assert!(options.timeout.is_none());
        assert_eq!(
            options.protocol_version,
            poststream_protocol::PROTOCOL_VERSION
        );
        assert_eq!(options.capabilities, json!({}));
    }

    #[test]
    fn builder_overrides_defaults() {
        let options = ClientBuilder::new()
            .base_url("http://example.test/rpc")
            .header("X-Api-Key", "k")
            .timeout(Duration::from_secs(9))
            .protocol_version("2026-01-01")
            .capabilities(json!({"sampling": {}}))
            .build();
        assert_eq!(options.base_url, "http://example.test/rpc");
        assert_eq!(options.headers.get("X-Api-Key").unwrap(), "k");
        assert_eq!(options.timeout, Some(Duration::from_secs(9)));
        assert_eq!(options.protocol_version, "2026-01-01");
        assert_eq!(options.capabilities, json!({"sampling": {}}));
    }
}
