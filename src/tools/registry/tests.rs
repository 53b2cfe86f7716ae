use super::*;
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &'static str {
        "echo"
    }
    fn description(&self) -> &'static str {
        "Echo the text argument"
    }
    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {"text": {"type": "string"}}})
    }
    async fn execute(&self, params: Value) -> anyhow::Result<ToolResult> {
        let text = params["text"].as_str().unwrap_or_default();
        Ok(ToolResult::new(text))
    }
}

struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &'static str {
        "failing"
    }
    fn description(&self) -> &'static str {
        "Always fails"
    }
    fn parameters(&self) -> Value {
        json!({"type": "object"})
    }
    async fn execute(&self, _params: Value) -> anyhow::Result<ToolResult> {
        anyhow::bail!("backend exploded")
    }
}

struct PanickingTool;

#[async_trait]
impl Tool for PanickingTool {
    fn name(&self) -> &'static str {
        "panicking"
    }
    fn description(&self) -> &'static str {
        "Panics"
    }
    fn parameters(&self) -> Value {
        json!({"type": "object"})
    }
    async fn execute(&self, _params: Value) -> anyhow::Result<ToolResult> {
        panic!("tool bug");
    }
}

struct SlowTool;

#[async_trait]
impl Tool for SlowTool {
    fn name(&self) -> &'static str {
        "slow"
    }
    fn description(&self) -> &'static str {
        "Sleeps past its timeout"
    }
    fn parameters(&self) -> Value {
        json!({"type": "object"})
    }
    fn execution_timeout(&self) -> Duration {
        Duration::from_millis(50)
    }
    async fn execute(&self, _params: Value) -> anyhow::Result<ToolResult> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(ToolResult::new("late"))
    }
}

struct NamedTool(&'static str);

#[async_trait]
impl Tool for NamedTool {
    fn name(&self) -> &str {
        self.0
    }
    fn description(&self) -> &'static str {
        "named"
    }
    fn parameters(&self) -> Value {
        json!({"type": "object"})
    }
    async fn execute(&self, _params: Value) -> anyhow::Result<ToolResult> {
        Ok(ToolResult::new(self.0))
    }
}

#[tokio::test]
async fn test_execute_registered_tool() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(EchoTool));
    let result = registry.execute("echo", json!({"text": "hi"})).await.unwrap();
    assert_eq!(result, ToolResult::new("hi"));
}

#[tokio::test]
async fn test_execute_unknown_tool_is_err() {
    let registry = ToolRegistry::new();
    let err = registry.execute("missing", json!({})).await.unwrap_err();
    assert!(err.to_string().contains("Tool 'missing' not found"));
}

#[tokio::test]
async fn test_tool_failure_becomes_error_result() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(FailingTool));
    let result = registry.execute("failing", json!({})).await.unwrap();
    assert!(result.is_error);
    assert!(result.content.contains("backend exploded"));
}

#[tokio::test]
async fn test_panic_is_captured() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(PanickingTool));
    let result = registry.execute("panicking", json!({})).await.unwrap();
    assert!(result.is_error);
    assert!(result.content.contains("crashed"));
    assert!(result.content.contains("tool bug"));
}

#[tokio::test]
async fn test_timeout_is_reported() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(SlowTool));
    let result = registry.execute("slow", json!({})).await.unwrap();
    assert!(result.is_error);
    assert!(result.content.contains("timed out"));
}

#[test]
fn test_invalid_names_rejected() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(NamedTool("")));
    registry.register(Arc::new(NamedTool("bad\nname")));
    assert!(registry.is_empty());
}

#[test]
fn test_names_and_definitions_sorted() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(NamedTool("zeta")));
    registry.register(Arc::new(NamedTool("alpha")));
    registry.register(Arc::new(EchoTool));
    assert_eq!(registry.tool_names(), vec!["alpha", "echo", "zeta"]);
    let defs = registry.definitions();
    assert_eq!(defs.len(), 3);
    assert_eq!(defs[1].name, "echo");
    assert_eq!(defs[1].description, "Echo the text argument");
}

#[test]
fn test_duplicate_overwrites() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(NamedTool("dup")));
    registry.register(Arc::new(NamedTool("dup")));
    assert_eq!(registry.len(), 1);
    assert!(registry.get("dup").is_some());
}

struct BlockingMiddleware;

#[async_trait]
impl ToolMiddleware for BlockingMiddleware {
    async fn before_execute(&self, name: &str, _params: &Value) -> Option<ToolResult> {
        (name == "echo").then(|| ToolResult::error("blocked"))
    }
}

struct CountingMiddleware(Arc<AtomicUsize>);

#[async_trait]
impl ToolMiddleware for CountingMiddleware {
    async fn after_execute(&self, _name: &str, _params: &Value, result: &mut ToolResult) {
        self.0.fetch_add(1, Ordering::SeqCst);
        result.content.push_str(" [seen]");
    }
}

#[tokio::test]
async fn test_middleware_short_circuit_and_after() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(EchoTool));
    registry.register(Arc::new(NamedTool("other")));
    registry.add_middleware(Arc::new(BlockingMiddleware));
    registry.add_middleware(Arc::new(CountingMiddleware(counter.clone())));

    let blocked = registry.execute("echo", json!({"text": "x"})).await.unwrap();
    assert_eq!(blocked, ToolResult::error("blocked"));
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    let passed = registry.execute("other", json!({})).await.unwrap();
    assert_eq!(passed.content, "other [seen]");
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}
