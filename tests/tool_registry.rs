mod common;

use chatterbox::client::FailoverClient;
use chatterbox::mcp::ChatterboxMcp;
use chatterbox::tools::build_registry;
use common::{Backend, MemorySession, SECRET};
use rmcp::model::{CallToolResult, JsonObject};
use serde_json::{Value, json};
use std::sync::Arc;

fn args(value: Value) -> Option<JsonObject> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn text_of(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|c| c.as_text().map(|t| t.text.clone()))
        .collect()
}

#[tokio::test]
async fn test_reader_tool_against_live_backend() {
    let backend = Backend::start(MemorySession::with_incoming("555@c.us", "are you there?")).await;
    let client = Arc::new(FailoverClient::new(&backend.url(), SECRET));
    let registry = build_registry(client);

    let result = registry
        .execute(
            "WhatsappReader",
            json!({"phoneNumber": "555", "numberOfRecords": 5}),
        )
        .await
        .unwrap();
    assert!(!result.is_error, "{}", result.content);
    assert!(
        result
            .content
            .starts_with("Last 1 WhatsApp messages for 555 were:")
    );
    assert!(result.content.contains("555@c.us : are you there?"));
    assert!(
        result
            .content
            .ends_with("You need to respond to the last message from 555@c.us")
    );
}

#[tokio::test]
async fn test_sender_tool_through_mcp() {
    let backend = Backend::start(MemorySession::default()).await;
    let client = Arc::new(FailoverClient::new(&backend.url(), SECRET));
    let mcp = ChatterboxMcp::new(Arc::new(build_registry(client)));

    let result = mcp
        .dispatch(
            "WhatsappSender",
            args(json!({"phoneNumber": "555", "message": "on my way"})),
        )
        .await
        .unwrap();
    assert_ne!(result.is_error, Some(true));
    assert_eq!(text_of(&result), "Message sent successfully to 555");
    assert_eq!(backend.session.sent_to("555@c.us"), vec!["on my way"]);
}

#[tokio::test]
async fn test_missing_parameter_is_tool_error() {
    let backend = Backend::start(MemorySession::default()).await;
    let client = Arc::new(FailoverClient::new(&backend.url(), SECRET));
    let mcp = ChatterboxMcp::new(Arc::new(build_registry(client)));

    let result = mcp
        .dispatch("WhatsappSender", args(json!({"phoneNumber": "555"})))
        .await
        .unwrap();
    assert_eq!(result.is_error, Some(true));
    assert_eq!(
        text_of(&result),
        "Error sending WhatsApp message: missing 'message' parameter"
    );
    assert!(backend.session.sent_to("555@c.us").is_empty());
}

#[tokio::test]
async fn test_unknown_tool_is_protocol_error() {
    let client = Arc::new(FailoverClient::new("http://127.0.0.1:9", SECRET));
    let mcp = ChatterboxMcp::new(Arc::new(build_registry(client)));
    assert!(mcp.dispatch("NoSuchTool", None).await.is_err());
}

#[tokio::test]
async fn test_no_servers_is_reported_as_text() {
    let client = Arc::new(FailoverClient::new("http://127.0.0.1:9", SECRET));
    let registry = build_registry(client);

    let result = registry
        .execute("WhatsappGetAllChats", json!({}))
        .await
        .unwrap();
    assert!(result.is_error);
    assert!(
        result
            .content
            .contains("No available servers found. All servers are unreachable.")
    );
}

#[tokio::test]
async fn test_server_status_tool() {
    let backend = Backend::start(MemorySession::default()).await;
    let client = Arc::new(FailoverClient::new(&backend.url(), SECRET));
    let registry = build_registry(client);

    let result = registry
        .execute("WhatsappServerStatus", json!({}))
        .await
        .unwrap();
    assert!(!result.is_error);
    assert!(
        result
            .content
            .contains(&format!("Current Active Server: {}", backend.url()))
    );
    assert!(
        result
            .content
            .contains(&format!("- {}: ✅ HEALTHY (ACTIVE)", backend.url()))
    );
}
