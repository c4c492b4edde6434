//! Integration tests for the high-level client against a mock server.

use std::sync::{Arc, Mutex};

use serde_json::{Map, Value, json};
use wiremock::matchers::{body_partial_json, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use poststream_client::{Client, ClientError};

fn json_response(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(serde_json::to_vec(&body).unwrap(), "application/json")
}

async fn mount_initialize(server: &MockServer, session: Option<&str>) {
    let mut template = json_response(json!({
        "jsonrpc": "2.0",
        "id": "init",
        "result": {"serverInfo": {"name": "mock", "version": "0.0.0"}},
    }));
    if let Some(session) = session {
        template = template.insert_header("Mcp-Session-Id", session);
    }
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "initialize"})))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn connect_initializes_and_captures_session() {
    let server = MockServer::start().await;
    mount_initialize(&server, Some("sess-client")).await;

    let client = Client::builder().base_url(server.uri()).connect().await.unwrap();
    assert_eq!(client.session_id(), "sess-client");
}

#[tokio::test]
async fn connect_sends_default_initialize_params() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-03-26",
                "clientInfo": {"name": "poststream-client"},
                "capabilities": {},
            },
        })))
        .respond_with(json_response(
            json!({"jsonrpc": "2.0", "id": "init", "result": {}}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    Client::builder().base_url(server.uri()).connect().await.unwrap();
}

#[tokio::test]
async fn request_returns_result_payload() {
    let server = MockServer::start().await;
    mount_initialize(&server, None).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "resources/list"})))
        .respond_with(json_response(json!({
            "jsonrpc": "2.0",
            "id": "r",
            "result": {"resources": []},
        })))
        .mount(&server)
        .await;

    let client = Client::builder().base_url(server.uri()).connect().await.unwrap();
    let result = client.request("resources/list", None).await.unwrap();
    assert_eq!(result, json!({"resources": []}));
}

#[tokio::test]
async fn server_error_object_becomes_typed_error() {
    let server = MockServer::start().await;
    mount_initialize(&server, None).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "tools/call"})))
        .respond_with(json_response(json!({
            "jsonrpc": "2.0",
            "id": "r",
            "error": {"code": -32601, "message": "no such method"},
        })))
        .mount(&server)
        .await;

    let client = Client::builder().base_url(server.uri()).connect().await.unwrap();
    let error = client.request("tools/call", None).await.unwrap_err();
    match error {
        ClientError::Rpc { code, message, .. } => {
            assert_eq!(code, -32601);
            assert_eq!(message, "no such method");
        }
        other => panic!("expected rpc error, got {other:?}"),
    }
}

#[tokio::test]
async fn static_headers_reach_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("Authorization", "Bearer token-1"))
        .respond_with(json_response(
            json!({"jsonrpc": "2.0", "id": "init", "result": {}}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    Client::builder()
        .base_url(server.uri())
        .header("Authorization", "Bearer token-1")
        .connect()
        .await
        .unwrap();
}

#[tokio::test]
async fn ping_round_trip() {
    let server = MockServer::start().await;
    mount_initialize(&server, None).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "ping"})))
        .respond_with(json_response(json!({"jsonrpc": "2.0", "id": null, "result": {}})))
        .mount(&server)
        .await;

    let client = Client::builder().base_url(server.uri()).connect().await.unwrap();
    client.ping().await.unwrap();
}

#[tokio::test]
async fn notification_handler_receives_method_and_params() {
    let server = MockServer::start().await;
    mount_initialize(&server, None).await;
    let stream_body = concat!(
        "event: message\n",
        "data: {\"jsonrpc\":\"2.0\",\"method\":\"notifications/message\",\"params\":{\"level\":\"info\"}}\n",
        "\n",
        "event: message\n",
        "data: {\"jsonrpc\":\"2.0\",\"id\":\"t\",\"result\":{}}\n",
        "\n",
    );
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "tools/call"})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(stream_body, "text/event-stream"))
        .mount(&server)
        .await;

    let client = Client::builder().base_url(server.uri()).connect().await.unwrap();
    let seen: Arc<Mutex<Vec<(String, Map<String, Value>)>>> = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&seen);
    client.set_notification_handler(move |method, params| {
        record.lock().unwrap().push((method, params));
    });

    client.request("tools/call", None).await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "notifications/message");
    assert_eq!(seen[0].1.get("level"), Some(&json!("info")));
}

#[tokio::test]
async fn chat_completion_tools_reshapes_the_catalogue() {
    let server = MockServer::start().await;
    mount_initialize(&server, None).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "tools/list"})))
        .respond_with(json_response(json!({
            "jsonrpc": "2.0",
            "id": "t",
            "result": {
                "tools": [{
                    "name": "lookup",
                    "description": "Look a thing up",
                    "inputSchema": {
                        "type": "object",
                        "annotations": {"audience": []},
                        "properties": {"ids": {"type": "array"}},
                    },
                }],
            },
        })))
        .mount(&server)
        .await;

    let client = Client::builder().base_url(server.uri()).connect().await.unwrap();
    let tools = client.chat_completion_tools().await.unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["type"], "function");
    assert_eq!(tools[0]["function"]["name"], "lookup");
    let parameters = &tools[0]["function"]["parameters"];
    assert!(parameters.get("annotations").is_none());
    assert_eq!(
        parameters["properties"]["ids"],
        json!({"type": "array", "items": {"type": "string"}})
    );
}
