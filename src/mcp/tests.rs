use super::*;
use crate::tools::{Tool as BridgeTool, ToolResult};
use async_trait::async_trait;
use serde_json::json;

struct ShoutTool;

#[async_trait]
impl BridgeTool for ShoutTool {
    fn name(&self) -> &'static str {
        "shout"
    }
    fn description(&self) -> &'static str {
        "Upper-case the text"
    }
    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {"text": {"type": "string"}}, "required": ["text"]})
    }
    async fn execute(&self, params: Value) -> anyhow::Result<ToolResult> {
        match params.get("text").and_then(Value::as_str) {
            Some(text) => Ok(ToolResult::new(text.to_uppercase())),
            None => Ok(ToolResult::error("Error shouting: missing 'text' parameter")),
        }
    }
}

fn server() -> ChatterboxMcp {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(ShoutTool));
    ChatterboxMcp::new(Arc::new(registry))
}

fn text_of(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|c| c.as_text().map(|t| t.text.clone()))
        .collect()
}

#[test]
fn test_info_advertises_tools() {
    let info = server().get_info();
    assert!(info.capabilities.tools.is_some());
    assert_eq!(info.server_info.name, "chatterbox");
    assert!(info.instructions.is_some());
}

#[test]
fn test_tools_carry_schema() {
    let tools = server().tools();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "shout");
    assert_eq!(tools[0].input_schema.get("type"), Some(&json!("object")));
}

#[tokio::test]
async fn test_dispatch_success() {
    let mut args = JsonObject::new();
    args.insert("text".into(), json!("hey"));
    let result = server().dispatch("shout", Some(args)).await.unwrap();
    assert_ne!(result.is_error, Some(true));
    assert_eq!(text_of(&result), "HEY");
}

#[tokio::test]
async fn test_dispatch_tool_error_is_result() {
    let result = server().dispatch("shout", None).await.unwrap();
    assert_eq!(result.is_error, Some(true));
    assert_eq!(text_of(&result), "Error shouting: missing 'text' parameter");
}

#[tokio::test]
async fn test_dispatch_unknown_tool_is_invalid_params() {
    let err = server().dispatch("whisper", None).await.unwrap_err();
    assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
    assert!(err.message.contains("whisper"));
}
