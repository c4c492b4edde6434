//! The high-level client.

use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::debug;
use uuid::Uuid;

use poststream_http::{
    CancellationToken, StreamableHttpConfig, StreamableHttpTransport,
};
use poststream_protocol::{
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, METHOD_INITIALIZE, RequestId,
};

use crate::error::ClientError;
use crate::options::{ClientBuilder, ClientOptions};

/// High-level client over the streamable HTTP transport.
///
/// Cheap to share: clones hand out the same underlying transport and session.
#[derive(Clone, Debug)]
pub struct Client {
    transport: Arc<StreamableHttpTransport>,
    options: ClientOptions,
}

impl Client {
    /// Start building a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Construct the transport and run the initialize exchange.
    ///
    /// Fails if the endpoint is invalid or initialization is rejected; the
    /// session token, when the server issues one, is captured before this
    /// returns.
    pub async fn connect(options: ClientOptions) -> Result<Self, ClientError> {
        let config = StreamableHttpConfig {
            headers: options.headers.clone(),
            timeout: options.timeout,
        };
        let transport = StreamableHttpTransport::new(&options.base_url, config)?;
        let client = Self {
            transport: Arc::new(transport),
            options,
        };
        client.initialize().await?;
        Ok(client)
    }

    /// Run (or re-run, after session expiry) the initialize exchange.
    pub async fn initialize(&self) -> Result<Value, ClientError> {
        let request =
            JsonRpcRequest::new(self.next_id(), METHOD_INITIALIZE, Some(self.initialize_params()));
        let response = self
            .transport
            .send_request(request, CancellationToken::new())
            .await?;
        debug!(session_id = %self.transport.session_id(), "client initialized");
        response.into_result().map_err(ClientError::from)
    }

    /// Send a request and return its result payload.
    ///
    /// The initialize method always carries its required parameters: when the
    /// caller passes none, the configured defaults are filled in. A response
    /// carrying an error object becomes [`ClientError::Rpc`].
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, ClientError> {
        let response = self.raw_request(method, params).await?;
        response.into_result().map_err(ClientError::from)
    }

    /// Send a request and return the full response envelope, error object and
    /// all.
    pub async fn raw_request(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<JsonRpcResponse, ClientError> {
        let params = if method == METHOD_INITIALIZE && params.is_none() {
            Some(self.initialize_params())
        } else {
            params
        };
        let request = JsonRpcRequest::new(self.next_id(), method, params);
        Ok(self
            .transport
            .send_request(request, CancellationToken::new())
            .await?)
    }

    /// Send a fire-and-forget notification.
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), ClientError> {
        let notification = JsonRpcNotification::new(method, params);
        Ok(self
            .transport
            .send_notification(notification, CancellationToken::new())
            .await?)
    }

    /// Probe server reachability.
    pub async fn ping(&self) -> Result<(), ClientError> {
        let response = self.transport.ping(CancellationToken::new()).await?;
        response.into_result().map_err(ClientError::from)?;
        Ok(())
    }

    /// Current session token; empty when the server established no session.
    pub fn session_id(&self) -> String {
        self.transport.session_id()
    }

    /// Register a handler for out-of-band server notifications, replacing any
    /// previous one. The handler receives the method name and the open
    /// parameter bag.
    pub fn set_notification_handler<F>(&self, handler: F)
    where
        F: Fn(String, Map<String, Value>) + Send + Sync + 'static,
    {
        self.transport.set_notification_handler(move |notification| {
            let method = notification.method.clone();
            handler(method, notification.into_params_map());
        });
    }

    /// Shut the client down. Idempotent; ends the session with the server on
    /// a best-effort basis.
    pub fn close(&self) {
        self.transport.close();
    }

    /// The underlying transport, for callers that need raw envelopes or
    /// per-call cancellation.
    pub fn transport(&self) -> &Arc<StreamableHttpTransport> {
        &self.transport
    }

    fn next_id(&self) -> RequestId {
        RequestId::String(Uuid::new_v4().to_string())
    }

    fn initialize_params(&self) -> Value {
        json!({
            "protocolVersion": self.options.protocol_version,
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": self.options.capabilities,
        })
    }
}
