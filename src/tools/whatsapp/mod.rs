use crate::client::{FailoverClient, WhatsAppApi};
use crate::errors::BridgeError;
use crate::format;
use crate::tools::base::{Tool, ToolResult, string_param, string_schema};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub struct WhatsappReaderTool {
    api: WhatsAppApi,
}

impl WhatsappReaderTool {
    pub fn new(api: WhatsAppApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Tool for WhatsappReaderTool {
    fn name(&self) -> &'static str {
        "WhatsappReader"
    }

    fn description(&self) -> &'static str {
        "A tool to retrieve WhatsApp messages"
    }

    fn parameters(&self) -> Value {
        string_schema(&[
            (
                "phoneNumber",
                "The phone number or WhatsApp id to read messages from",
            ),
            ("numberOfRecords", "How many recent messages to fetch"),
        ])
    }

    async fn execute(&self, params: Value) -> anyhow::Result<ToolResult> {
        const ACTION: &str = "fetching WhatsApp messages";
        let args = string_param(&params, "phoneNumber").and_then(|phone| {
            let raw = string_param(&params, "numberOfRecords")?;
            let count = raw.trim().parse::<u32>().map_err(|_| {
                format!("'numberOfRecords' must be a positive integer, got '{}'", raw)
            })?;
            Ok((phone, count))
        });
        let (phone, count) = match args {
            Ok(args) => args,
            Err(msg) => return Ok(ToolResult::error(format!("Error {}: {}", ACTION, msg))),
        };

        let result = self
            .api
            .get_messages(&phone, count)
            .await
            .map(|missed| format::format_messages(&phone, &missed));
        Ok(ToolResult::from_result(result, ACTION))
    }
}

pub struct WhatsappRetrieveUserTool {
    api: WhatsAppApi,
}

impl WhatsappRetrieveUserTool {
    pub fn new(api: WhatsAppApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Tool for WhatsappRetrieveUserTool {
    fn name(&self) -> &'static str {
        "WhatsappRetrieveUser"
    }

    fn description(&self) -> &'static str {
        "Look for a whatsapp user by name and get back a WhatsApp ID that can be used as the phone number"
    }

    fn parameters(&self) -> Value {
        string_schema(&[("contactName", "Name of the contact to look up")])
    }

    async fn execute(&self, params: Value) -> anyhow::Result<ToolResult> {
        const ACTION: &str = "looking up contact";
        let name = match string_param(&params, "contactName") {
            Ok(name) => name,
            Err(msg) => return Ok(ToolResult::error(format!("Error {}: {}", ACTION, msg))),
        };
        Ok(ToolResult::from_result(
            self.api.lookup_contact(&name).await,
            ACTION,
        ))
    }
}

pub struct WhatsappSenderTool {
    api: WhatsAppApi,
}

impl WhatsappSenderTool {
    pub fn new(api: WhatsAppApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Tool for WhatsappSenderTool {
    fn name(&self) -> &'static str {
        "WhatsappSender"
    }

    fn description(&self) -> &'static str {
        "A tool to send WhatsApp messages"
    }

    fn parameters(&self) -> Value {
        string_schema(&[
            ("phoneNumber", "The phone number or WhatsApp id to send to"),
            ("message", "The message text"),
        ])
    }

    async fn execute(&self, params: Value) -> anyhow::Result<ToolResult> {
        const ACTION: &str = "sending WhatsApp message";
        let args = string_param(&params, "phoneNumber")
            .and_then(|phone| Ok((phone, string_param(&params, "message")?)));
        let (phone, message) = match args {
            Ok(args) => args,
            Err(msg) => return Ok(ToolResult::error(format!("Error {}: {}", ACTION, msg))),
        };
        Ok(ToolResult::from_result(
            self.api.send_message(&phone, &message).await,
            ACTION,
        ))
    }
}

pub struct WhatsappHealthCheckTool {
    client: Arc<FailoverClient>,
}

impl WhatsappHealthCheckTool {
    pub fn new(client: Arc<FailoverClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WhatsappHealthCheckTool {
    fn name(&self) -> &'static str {
        "WhatsappHealthCheck"
    }

    fn description(&self) -> &'static str {
        "Check if the WhatsApp server is running and accessible"
    }

    fn parameters(&self) -> Value {
        string_schema(&[])
    }

    async fn execute(&self, _params: Value) -> anyhow::Result<ToolResult> {
        let result = self
            .client
            .check_current_health()
            .await
            .map(|(url, healthy)| format::format_health(&url, healthy));
        Ok(ToolResult::from_result(
            result,
            "checking WhatsApp server health",
        ))
    }
}

pub struct WhatsappServerStatusTool {
    client: Arc<FailoverClient>,
}

impl WhatsappServerStatusTool {
    pub fn new(client: Arc<FailoverClient>) -> Self {
        Self { client }
    }

    async fn status(&self) -> Result<String, BridgeError> {
        let current = self.client.active_server().await?;
        let servers = self.client.all_servers_health().await;
        Ok(format::format_server_status(&current, &servers))
    }
}

#[async_trait]
impl Tool for WhatsappServerStatusTool {
    fn name(&self) -> &'static str {
        "WhatsappServerStatus"
    }

    fn description(&self) -> &'static str {
        "Get detailed status of all configured WhatsApp servers"
    }

    fn parameters(&self) -> Value {
        string_schema(&[])
    }

    async fn execute(&self, _params: Value) -> anyhow::Result<ToolResult> {
        Ok(ToolResult::from_result(
            self.status().await,
            "checking server status",
        ))
    }
}

pub struct WhatsappGetAllContactsTool {
    api: WhatsAppApi,
}

impl WhatsappGetAllContactsTool {
    pub fn new(api: WhatsAppApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Tool for WhatsappGetAllContactsTool {
    fn name(&self) -> &'static str {
        "WhatsappGetAllContacts"
    }

    fn description(&self) -> &'static str {
        "Get all WhatsApp contacts"
    }

    fn parameters(&self) -> Value {
        string_schema(&[])
    }

    async fn execute(&self, _params: Value) -> anyhow::Result<ToolResult> {
        let result = self
            .api
            .get_all_contacts()
            .await
            .map(|contacts| format::format_contacts(&contacts));
        Ok(ToolResult::from_result(result, "getting all contacts"))
    }
}

pub struct WhatsappGetAllChatsTool {
    api: WhatsAppApi,
}

impl WhatsappGetAllChatsTool {
    pub fn new(api: WhatsAppApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Tool for WhatsappGetAllChatsTool {
    fn name(&self) -> &'static str {
        "WhatsappGetAllChats"
    }

    fn description(&self) -> &'static str {
        "Get all WhatsApp chats with unread count"
    }

    fn parameters(&self) -> Value {
        string_schema(&[])
    }

    async fn execute(&self, _params: Value) -> anyhow::Result<ToolResult> {
        let result = self
            .api
            .get_all_chats()
            .await
            .map(|chats| format::format_chats(&chats));
        Ok(ToolResult::from_result(result, "getting all chats"))
    }
}
