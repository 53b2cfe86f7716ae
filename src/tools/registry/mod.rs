use crate::tools::base::{Tool, ToolDefinition, ToolMiddleware, ToolResult};
use anyhow::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    middleware: Vec<Arc<dyn ToolMiddleware>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            middleware: vec![Arc::new(LoggingMiddleware)],
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if name.is_empty() || name.len() > 128 || name.chars().any(char::is_control) {
            warn!(
                "tool registry: rejecting tool with invalid name (len={}, has_control_chars={})",
                name.len(),
                name.chars().any(char::is_control)
            );
            return;
        }
        if self.tools.contains_key(&name) {
            warn!("tool registry: overwriting duplicate tool '{}'", name);
        }
        self.tools.insert(name, tool);
    }

    pub fn add_middleware(&mut self, middleware: Arc<dyn ToolMiddleware>) {
        self.middleware.push(middleware);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Returns a sorted list of all registered tool names.
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool definitions sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<_> = self.tools.values().map(|t| t.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Execute a tool through the middleware pipeline:
    /// 1. `before_execute` middleware (any can short-circuit)
    /// 2. the tool itself in a spawned task with a timeout (panic guard)
    /// 3. `after_execute` middleware
    ///
    /// Only an unknown tool name is an `Err`; every tool failure comes back
    /// as an error `ToolResult`.
    pub async fn execute(&self, name: &str, params: Value) -> Result<ToolResult> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Tool '{}' not found", name))?
            .clone();

        for mw in &self.middleware {
            if let Some(result) = mw.before_execute(name, &params).await {
                return Ok(result);
            }
        }

        let mut result = self.execute_with_guards(name, tool, params.clone()).await;

        for mw in &self.middleware {
            mw.after_execute(name, &params, &mut result).await;
        }

        Ok(result)
    }

    /// Run the tool in its own task so panics and timeouts turn into
    /// error results instead of tearing down the caller.
    async fn execute_with_guards(
        &self,
        name: &str,
        tool: Arc<dyn Tool>,
        params: Value,
    ) -> ToolResult {
        let tool_name = name.to_string();
        let timeout = tool.execution_timeout();
        let timeout_secs = timeout.as_secs();

        let handle = tokio::task::spawn(async move {
            tokio::time::timeout(timeout, tool.execute(params)).await
        });

        match handle.await {
            Ok(Ok(Ok(result))) => result,
            Ok(Ok(Err(e))) => {
                warn!("Tool '{}' failed: {}", tool_name, e);
                ToolResult::error(format!("Error running {}: {}", tool_name, e))
            }
            Ok(Err(_)) => {
                warn!("Tool '{}' timed out after {}s", tool_name, timeout_secs);
                ToolResult::error(format!(
                    "Tool '{}' timed out after {}s",
                    tool_name, timeout_secs
                ))
            }
            Err(join_err) => {
                let msg = if join_err.is_panic() {
                    let payload = join_err.into_panic();
                    payload
                        .downcast_ref::<String>()
                        .map(String::as_str)
                        .or_else(|| payload.downcast_ref::<&str>().copied())
                        .unwrap_or("unknown cause")
                        .to_string()
                } else {
                    "cancelled".to_string()
                };
                error!("Tool '{}' crashed: {}", tool_name, msg);
                ToolResult::error(format!("Tool '{}' crashed: {}", tool_name, msg))
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Logs arguments at debug level and the outcome at info/warn.
pub struct LoggingMiddleware;

#[async_trait::async_trait]
impl ToolMiddleware for LoggingMiddleware {
    async fn before_execute(&self, name: &str, params: &Value) -> Option<ToolResult> {
        debug!("Executing tool: {} with arguments: {}", name, params);
        None
    }

    async fn after_execute(&self, name: &str, _params: &Value, result: &mut ToolResult) {
        if result.is_error {
            warn!("Tool '{}' returned error: {}", name, result.content);
        } else {
            info!("Tool '{}' completed ({} chars)", name, result.content.len());
        }
    }
}

#[cfg(test)]
mod tests;
