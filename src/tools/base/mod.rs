use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }

    /// Convert a fallible result into a `ToolResult`, rendering failures as
    /// `Error <action>: <message>` (e.g. action `"looking up contact"`).
    pub fn from_result<E: std::fmt::Display>(result: Result<String, E>, action: &str) -> Self {
        match result {
            Ok(content) => Self::new(content),
            Err(e) => Self::error(format!("Error {}: {}", action, e)),
        }
    }
}

impl std::fmt::Display for ToolResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

/// Name, description and JSON Schema of a tool as advertised to clients.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> Value; // JSON Schema

    async fn execute(&self, params: Value) -> anyhow::Result<ToolResult>;

    /// Per-tool execution timeout. Overrides the registry-level default.
    fn execution_timeout(&self) -> Duration {
        Duration::from_mins(1)
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Middleware that can intercept tool execution for cross-cutting concerns.
#[async_trait]
pub trait ToolMiddleware: Send + Sync {
    /// Called before tool execution. Return `Some` to short-circuit.
    async fn before_execute(&self, _name: &str, _params: &Value) -> Option<ToolResult> {
        None
    }

    /// Called after tool execution. Can modify the result.
    async fn after_execute(&self, _name: &str, _params: &Value, _result: &mut ToolResult) {}
}

/// Read a string argument. Numbers are accepted and rendered as text,
/// since agents often send phone numbers and counts unquoted.
pub fn string_param(params: &Value, key: &str) -> Result<String, String> {
    match params.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::String(_)) | None | Some(Value::Null) => {
            Err(format!("missing '{}' parameter", key))
        }
        Some(_) => Err(format!("'{}' must be a string", key)),
    }
}

/// Build an object schema with the given required string properties.
pub fn string_schema(props: &[(&str, &str)]) -> Value {
    let mut properties = serde_json::Map::new();
    for (name, description) in props {
        properties.insert(
            (*name).to_string(),
            serde_json::json!({ "type": "string", "description": description }),
        );
    }
    let required: Vec<&str> = props.iter().map(|(name, _)| *name).collect();
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}
