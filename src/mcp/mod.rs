//! MCP server exposing the tool registry over stdio.

use crate::tools::ToolRegistry;
use anyhow::{Context, Result};
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, ErrorData, JsonObject, ListToolsResult,
    PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler, ServiceExt};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::info;

const INSTRUCTIONS: &str = "Tools for reading and sending WhatsApp messages, looking up \
    contacts and chats, checking the backing servers, and managing YouTube playlists. \
    Use WhatsappRetrieveUser to turn a contact name into an id usable as phoneNumber.";

#[derive(Clone)]
pub struct ChatterboxMcp {
    registry: Arc<ToolRegistry>,
}

impl ChatterboxMcp {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Registry definitions as MCP tool descriptors, sorted by name.
    pub fn tools(&self) -> Vec<Tool> {
        self.registry
            .definitions()
            .into_iter()
            .map(|def| {
                let schema = match def.parameters {
                    Value::Object(map) => map,
                    _ => JsonObject::new(),
                };
                Tool::new(def.name, def.description, Arc::new(schema))
            })
            .collect()
    }

    /// Run a tool by name. Unknown names are a protocol error; tool
    /// failures are returned as error results.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, ErrorData> {
        if self.registry.get(name).is_none() {
            return Err(ErrorData::invalid_params(
                format!("Unknown tool: {name}"),
                None,
            ));
        }
        let params = Value::Object(arguments.unwrap_or_default());
        let result = self
            .registry
            .execute(name, params)
            .await
            .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;

        let content = vec![Content::text(result.content)];
        if result.is_error {
            Ok(CallToolResult::error(content))
        } else {
            Ok(CallToolResult::success(content))
        }
    }
}

impl ServerHandler for ChatterboxMcp {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info.name = "chatterbox".to_string();
        info.server_info.version = crate::VERSION.to_string();
        info.instructions = Some(INSTRUCTIONS.to_string());
        info
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult::with_all_items(self.tools())))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        _: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        async move { self.dispatch(&request.name, request.arguments).await }
    }
}

/// Serve the registry on stdin/stdout until the client disconnects.
pub async fn serve_stdio(registry: Arc<ToolRegistry>) -> Result<()> {
    info!("MCP server listening on stdio ({} tools)", registry.len());
    let running = ChatterboxMcp::new(registry)
        .serve(rmcp::transport::stdio())
        .await
        .context("failed to start MCP stdio server")?;
    let reason = running
        .waiting()
        .await
        .context("MCP server task failed")?;
    info!("MCP server stopped: {:?}", reason);
    Ok(())
}

#[cfg(test)]
mod tests;
