//! Streamable HTTP client transport.
//!
//! One JSON-RPC message per HTTP POST to a single base endpoint. The response
//! body is either a single JSON envelope or an upgraded event stream that
//! concludes with the envelope for the same request; notifications arriving
//! mid-stream are demultiplexed to the registered handler.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::StreamExt;
use parking_lot::RwLock;
use reqwest::{Client as HttpClient, StatusCode, header};
use tokio::sync::oneshot;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use poststream_protocol::{
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, METHOD_INITIALIZE, METHOD_PING,
    decode_response, decode_response_for_method, encode_message,
};

use crate::error::{TransportError, TransportResult};
use crate::session::SessionCell;
use crate::sse::read_event_stream;

/// Session header name, fixed by the wire protocol.
pub const SESSION_HEADER: &str = "Mcp-Session-Id";

const MEDIA_TYPE_JSON: &str = "application/json";
const MEDIA_TYPE_EVENT_STREAM: &str = "text/event-stream";
const ACCEPT_MEDIA_TYPES: &str = "application/json, text/event-stream";

/// Timeout for the best-effort session termination notice issued by `close()`.
const TERMINATION_NOTICE_TIMEOUT: Duration = Duration::from_secs(5);

/// Handler invoked for every out-of-band server notification.
///
/// Invoked from stream-draining tasks; it must not block for long.
pub type NotificationHandler = Arc<dyn Fn(JsonRpcNotification) + Send + Sync>;

/// Streamable HTTP transport configuration.
#[derive(Clone, Debug, Default)]
pub struct StreamableHttpConfig {
    /// Static headers attached to every exchange. A name colliding with a
    /// default header (including the session header) wins.
    pub headers: HashMap<String, String>,

    /// Per-exchange timeout, covering the full HTTP exchange including a
    /// streamed body. `None` (the default) means no timeout.
    pub timeout: Option<Duration>,
}

/// Streamable HTTP client transport.
///
/// `send_request` may be called concurrently from any number of tasks; each
/// call owns its own HTTP exchange and, when the server upgrades the reply to
/// an event stream, its own drain task. The session token is the only shared
/// hot-path state and is managed lock-free.
///
/// Unsupported by design: batching, persistent listening streams, stream
/// resumption, and server-initiated requests to the client.
pub struct StreamableHttpTransport {
    base_url: Url,
    http_client: HttpClient,
    headers: HashMap<String, String>,
    session: SessionCell,
    notification_handler: Arc<RwLock<Option<NotificationHandler>>>,
    closed: CancellationToken,
}

impl std::fmt::Debug for StreamableHttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamableHttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("closed", &self.closed.is_cancelled())
            .finish()
    }
}

impl StreamableHttpTransport {
    /// Create a new transport for the given base endpoint.
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be
    /// built.
    pub fn new(base_url: &str, config: StreamableHttpConfig) -> TransportResult<Self> {
        let base_url = Url::parse(base_url)?;

        let mut builder = HttpClient::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|err| TransportError::Configuration(err.to_string()))?;

        Ok(Self {
            base_url,
            http_client,
            headers: config.headers,
            session: SessionCell::new(),
            notification_handler: Arc::new(RwLock::new(None)),
            closed: CancellationToken::new(),
        })
    }

    /// Send a request and wait for its terminal response.
    ///
    /// The exchange observes both `cancel` and the transport's closed-signal;
    /// whichever fires first unblocks the call with
    /// [`TransportError::Cancelled`]. A response carrying a JSON-RPC error
    /// object is returned as `Ok` — inspect the envelope's `error` field.
    pub async fn send_request(
        &self,
        request: JsonRpcRequest,
        cancel: CancellationToken,
    ) -> TransportResult<JsonRpcResponse> {
        if cancel.is_cancelled() || self.closed.is_cancelled() {
            return Err(TransportError::Cancelled);
        }

        // Child of the closed-signal, so in-flight exchanges unblock on
        // shutdown even if the caller's token never fires. The guard cancels
        // it on every return path, which is what stops the drain task.
        let exchange = self.closed.child_token();
        let _guard = exchange.clone().drop_guard();

        let body = encode_message(&request)?;
        let session = self.session.load();

        let sent = with_cancel(
            &cancel,
            &exchange,
            self.http_client
                .post(self.base_url.clone())
                .headers(self.build_headers(&session))
                .body(body)
                .send(),
        )
        .await?;
        let response = sent.map_err(|err| TransportError::Request(err.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::ACCEPTED {
            if status == StatusCode::NOT_FOUND {
                // Compare-and-swap against the token observed at the start of
                // this exchange; a token refreshed concurrently stays put.
                self.session.clear_if(&session);
                return Err(TransportError::SessionExpired);
            }

            let body = self.read_body(response, &cancel, &exchange).await?;
            if let Ok(error_response) = decode_response(&body)
                && error_response.is_error()
            {
                return Ok(error_response);
            }
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        if request.method == METHOD_INITIALIZE {
            // An absent or empty header is stored too: "no session" is a
            // valid server choice and must overwrite any stale token.
            let session_id = response
                .headers()
                .get(SESSION_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default();
            self.session.store(session_id.to_owned());
            debug!(session_id, "initialize exchange completed");
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();

        if is_json_media_type(&content_type) {
            let body = self.read_body(response, &cancel, &exchange).await?;
            Ok(decode_response_for_method(&body, &request.method)?)
        } else if is_event_stream_media_type(&content_type) {
            self.wait_for_stream_response(response, request.method == METHOD_PING, &cancel, &exchange)
                .await
        } else {
            Err(TransportError::UnexpectedContentType(content_type))
        }
    }

    /// Send a notification: fire-and-forget, success status required, body
    /// discarded.
    pub async fn send_notification(
        &self,
        notification: JsonRpcNotification,
        cancel: CancellationToken,
    ) -> TransportResult<()> {
        if cancel.is_cancelled() || self.closed.is_cancelled() {
            return Err(TransportError::Cancelled);
        }

        let exchange = self.closed.child_token();
        let _guard = exchange.clone().drop_guard();

        let body = encode_message(&notification)?;
        let session = self.session.load();

        let sent = with_cancel(
            &cancel,
            &exchange,
            self.http_client
                .post(self.base_url.clone())
                .headers(self.build_headers(&session))
                .body(body)
                .send(),
        )
        .await?;
        let response = sent.map_err(|err| TransportError::Request(err.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::ACCEPTED {
            let body = self.read_body(response, &cancel, &exchange).await?;
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(())
    }

    /// Liveness probe: a `ping` request with a generated identifier.
    ///
    /// This is the only method for which the server may reply without an
    /// identifier.
    pub async fn ping(&self, cancel: CancellationToken) -> TransportResult<JsonRpcResponse> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or_default();
        let request = JsonRpcRequest::new(
            format!("ping-{}", Uuid::new_v4()),
            METHOD_PING,
            Some(serde_json::json!({ "timestamp": timestamp })),
        );
        self.send_request(request, cancel).await
    }

    /// Current session token; empty when the server established no session.
    pub fn session_id(&self) -> String {
        self.session.load().as_ref().clone()
    }

    /// Register the notification handler, replacing any previous one.
    ///
    /// Notifications arriving while no handler is registered are dropped.
    pub fn set_notification_handler<F>(&self, handler: F)
    where
        F: Fn(JsonRpcNotification) + Send + Sync + 'static,
    {
        *self.notification_handler.write() = Some(Arc::new(handler));
    }

    /// Remove the notification handler; subsequent notifications are dropped.
    pub fn clear_notification_handler(&self) {
        *self.notification_handler.write() = None;
    }

    /// True once `close()` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Shut the transport down.
    ///
    /// Idempotent: the second call is a no-op. The closed-signal fires
    /// immediately, unblocking every in-flight exchange; if a session was
    /// established, a termination notice is sent to the server on a separate
    /// task with its own short timeout. Failures of that notice are only
    /// logged.
    pub fn close(&self) {
        if self.closed.is_cancelled() {
            return;
        }
        self.closed.cancel();

        let session = self.session.load();
        if session.is_empty() {
            return;
        }
        self.session.store(String::new());

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime available; skipping session termination notice");
            return;
        };
        let http_client = self.http_client.clone();
        let base_url = self.base_url.clone();
        runtime.spawn(async move {
            let result = http_client
                .delete(base_url)
                .header(SESSION_HEADER, session.as_str())
                .timeout(TERMINATION_NOTICE_TIMEOUT)
                .send()
                .await;
            match result {
                Ok(response) => {
                    debug!(status = %response.status(), "session termination notice sent");
                }
                Err(err) => warn!(error = %err, "failed to send session termination notice"),
            }
        });
    }

    /// Default headers, the session header when a session exists, then the
    /// configured static headers. Insertion order means a caller-supplied
    /// name wins on collision.
    fn build_headers(&self, session: &str) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static(MEDIA_TYPE_JSON),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static(ACCEPT_MEDIA_TYPES),
        );

        if !session.is_empty()
            && let Ok(value) = header::HeaderValue::from_str(session)
        {
            headers.insert(SESSION_HEADER, value);
        }

        for (name, value) in &self.headers {
            match (
                header::HeaderName::from_bytes(name.as_bytes()),
                header::HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => warn!(%name, "skipping invalid static header"),
            }
        }

        headers
    }

    async fn read_body(
        &self,
        response: reqwest::Response,
        cancel: &CancellationToken,
        exchange: &CancellationToken,
    ) -> TransportResult<bytes::Bytes> {
        let read = with_cancel(cancel, exchange, response.bytes()).await?;
        read.map_err(|err| TransportError::Body(err.to_string()))
    }

    /// Wait for the terminal response of an exchange the server upgraded to
    /// an event stream.
    ///
    /// A drain task feeds the stream through the decoder and routes each
    /// event; the caller blocks on the single-slot completion channel or
    /// cancellation, whichever fires first. The drain task keeps running
    /// after the caller returns, until the exchange token cancels it, and
    /// releases the stream on its way out.
    async fn wait_for_stream_response(
        &self,
        response: reqwest::Response,
        probe: bool,
        cancel: &CancellationToken,
        exchange: &CancellationToken,
    ) -> TransportResult<JsonRpcResponse> {
        let (terminal_tx, terminal_rx) = oneshot::channel();

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other));
        let reader = tokio::io::BufReader::new(StreamReader::new(stream));

        let handler = Arc::clone(&self.notification_handler);
        let drain_cancel = exchange.clone();
        tokio::spawn(async move {
            let mut terminal = Some(terminal_tx);
            read_event_stream(reader, drain_cancel, |_event, data| {
                dispatch_stream_event(data, probe, &handler, &mut terminal);
            })
            .await;
        });

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
            _ = exchange.cancelled() => Err(TransportError::Cancelled),
            received = terminal_rx => received.map_err(|_| TransportError::StreamClosed),
        }
    }
}

/// Route one decoded stream event.
///
/// An envelope with an identifier is the terminal response (delivered at most
/// once); an envelope with a method name is a notification; an envelope with
/// neither is accepted as the terminal response only for the liveness probe.
fn dispatch_stream_event(
    data: &str,
    probe: bool,
    handler: &RwLock<Option<NotificationHandler>>,
    terminal: &mut Option<oneshot::Sender<JsonRpcResponse>>,
) {
    let message = match decode_response(data.as_bytes()) {
        Ok(message) => message,
        Err(err) => {
            // A later event may still carry the real terminal response.
            warn!(error = %err, "skipping undecodable stream event");
            return;
        }
    };

    if message.id.is_none() {
        if let Ok(notification) = serde_json::from_str::<JsonRpcNotification>(data) {
            // Clone out of the slot so the lock is not held across the call.
            let callback = handler.read().clone();
            match callback {
                Some(callback) => callback(notification),
                None => debug!("dropping notification: no handler registered"),
            }
            return;
        }
        if !probe {
            warn!(payload = data, "skipping streamed envelope with neither id nor method");
            return;
        }
    }

    match terminal.take() {
        // The receiver may have given up already (cancellation); either way
        // no further identifier matching happens on this stream.
        Some(sender) => {
            let _ = sender.send(message);
        }
        None => debug!("ignoring extra identifier-bearing stream event"),
    }
}

async fn with_cancel<T>(
    cancel: &CancellationToken,
    exchange: &CancellationToken,
    operation: impl Future<Output = T>,
) -> TransportResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TransportError::Cancelled),
        _ = exchange.cancelled() => Err(TransportError::Cancelled),
        value = operation => Ok(value),
    }
}

fn media_type(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or("").trim()
}

fn is_json_media_type(content_type: &str) -> bool {
    media_type(content_type).eq_ignore_ascii_case(MEDIA_TYPE_JSON)
}

fn is_event_stream_media_type(content_type: &str) -> bool {
    media_type(content_type).eq_ignore_ascii_case(MEDIA_TYPE_EVENT_STREAM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_helpers_handle_parameters_and_case() {
        assert!(is_json_media_type("application/json"));
        assert!(is_json_media_type("Application/JSON; charset=utf-8"));
        assert!(!is_json_media_type("text/plain"));

        assert!(is_event_stream_media_type("text/event-stream"));
        assert!(is_event_stream_media_type("text/event-stream; charset=utf-8"));
        assert!(!is_event_stream_media_type("application/json"));
    }

    #[test]
    fn static_headers_override_session_header() {
        let mut headers = HashMap::new();
        headers.insert(SESSION_HEADER.to_owned(), "caller-wins".to_owned());
        let transport = StreamableHttpTransport::new(
            "http://localhost:62770",
            StreamableHttpConfig {
                headers,
                ..Default::default()
            },
        )
        .unwrap();

        let built = transport.build_headers("server-session");
        assert_eq!(built.get(SESSION_HEADER).unwrap(), "caller-wins");
        assert_eq!(built.get(header::ACCEPT).unwrap(), ACCEPT_MEDIA_TYPES);
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = StreamableHttpTransport::new("://nope", StreamableHttpConfig::default());
        assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn close_twice_is_a_no_op() {
        let transport = StreamableHttpTransport::new(
            "http://localhost:62770",
            StreamableHttpConfig::default(),
        )
        .unwrap();
        assert!(!transport.is_closed());
        transport.close();
        transport.close();
        assert!(transport.is_closed());
    }
}
