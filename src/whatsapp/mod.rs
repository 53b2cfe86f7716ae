//! WhatsApp service behind the backing API.
//!
//! The device link itself is a [`WhatsAppSession`]; this module only turns
//! session data into the API's wire shapes.

use crate::errors::ServiceError;
use crate::models::{
    ChatList, ChatSummary, Contact, ContactList, ContactLookup, MessageData, MissedMessages,
    SessionStatus,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

const MEDIA_PLACEHOLDER: &str = "Some media attachment (ignore this message)";
const NOT_READY_NOTICE: &str =
    "WhatsApp client is not ready and no QR code available. Please restart the server.";

/// A message exactly as the session reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionMessage {
    pub from: String,
    pub to: String,
    pub body: String,
    pub timestamp: i64,
    pub has_media: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContact {
    pub id: String,
    pub name: Option<String>,
    pub pushname: Option<String>,
    pub number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionChat {
    pub id: String,
    pub name: Option<String>,
    pub unread_count: u32,
}

/// A linked WhatsApp device.
#[async_trait]
pub trait WhatsAppSession: Send + Sync {
    fn is_ready(&self) -> bool;

    /// Prompt text for a pending QR link, if any.
    fn qr_prompt(&self) -> Option<String>;

    /// Most recent `limit` messages of a chat, oldest first.
    async fn fetch_messages(&self, chat_id: &str, limit: u32)
    -> anyhow::Result<Vec<SessionMessage>>;
    async fn contacts(&self) -> anyhow::Result<Vec<SessionContact>>;
    async fn chats(&self) -> anyhow::Result<Vec<SessionChat>>;
    async fn send(&self, chat_id: &str, text: &str) -> anyhow::Result<()>;

    async fn shutdown(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Session used when no device is linked. Never becomes ready.
#[derive(Debug, Default)]
pub struct UnlinkedSession;

#[async_trait]
impl WhatsAppSession for UnlinkedSession {
    fn is_ready(&self) -> bool {
        false
    }

    fn qr_prompt(&self) -> Option<String> {
        None
    }

    async fn fetch_messages(
        &self,
        _chat_id: &str,
        _limit: u32,
    ) -> anyhow::Result<Vec<SessionMessage>> {
        anyhow::bail!("no WhatsApp device linked")
    }

    async fn contacts(&self) -> anyhow::Result<Vec<SessionContact>> {
        anyhow::bail!("no WhatsApp device linked")
    }

    async fn chats(&self) -> anyhow::Result<Vec<SessionChat>> {
        anyhow::bail!("no WhatsApp device linked")
    }

    async fn send(&self, _chat_id: &str, _text: &str) -> anyhow::Result<()> {
        anyhow::bail!("no WhatsApp device linked")
    }
}

/// Append `@c.us` to bare phone numbers.
pub fn chat_id_for(phone_number: &str) -> String {
    if phone_number.contains('@') {
        phone_number.to_string()
    } else {
        format!("{}@c.us", phone_number)
    }
}

fn to_message_data(msg: SessionMessage) -> MessageData {
    let from = if msg.from == msg.to {
        "You".to_string()
    } else {
        msg.from
    };
    let body = if msg.has_media {
        MEDIA_PLACEHOLDER.to_string()
    } else {
        msg.body
    };
    MessageData {
        from,
        body,
        timestamp: msg.timestamp,
    }
}

#[derive(Clone)]
pub struct WhatsAppService {
    session: Arc<dyn WhatsAppSession>,
}

impl WhatsAppService {
    pub fn new(session: Arc<dyn WhatsAppSession>) -> Self {
        Self { session }
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            is_ready: self.session.is_ready(),
            has_qr: self.session.qr_prompt().is_some(),
        }
    }

    pub fn qr_code(&self) -> Option<String> {
        self.session.qr_prompt()
    }

    fn ensure_ready(&self) -> Result<(), ServiceError> {
        if self.session.is_ready() {
            Ok(())
        } else {
            Err(ServiceError::NotReady)
        }
    }

    /// Last `count` messages with `phone_number`. `hasNewMessages` is set
    /// when the newest one was sent by that number.
    pub async fn get_messages(
        &self,
        phone_number: &str,
        count: u32,
    ) -> Result<MissedMessages, ServiceError> {
        self.ensure_ready()?;
        let messages = self
            .session
            .fetch_messages(&chat_id_for(phone_number), count)
            .await
            .map_err(|e| ServiceError::Upstream(format!("Failed to fetch messages: {}", e)))?;

        let has_new_messages = messages
            .last()
            .map(|last| last.from.starts_with(phone_number));
        Ok(MissedMessages {
            messages: messages.into_iter().map(to_message_data).collect(),
            has_new_messages,
        })
    }

    /// First contact whose name or push name contains `contact_name`,
    /// ignoring case.
    pub async fn lookup_contact(&self, contact_name: &str) -> Result<ContactLookup, ServiceError> {
        self.ensure_ready()?;
        let contacts = self
            .session
            .contacts()
            .await
            .map_err(|e| ServiceError::Upstream(format!("Failed to lookup contact: {}", e)))?;

        let needle = contact_name.to_lowercase();
        let matches = |field: &Option<String>| {
            field
                .as_deref()
                .is_some_and(|v| v.to_lowercase().contains(&needle))
        };
        contacts
            .into_iter()
            .find(|c| matches(&c.name) || matches(&c.pushname))
            .map(|c| ContactLookup { whats_app_id: c.id })
            .ok_or_else(|| ServiceError::NotFound(format!("Contact '{}' not found", contact_name)))
    }

    pub async fn get_all_contacts(&self) -> Result<ContactList, ServiceError> {
        self.ensure_ready()?;
        let contacts = self
            .session
            .contacts()
            .await
            .map_err(|e| ServiceError::Upstream(format!("Failed to get all contacts: {}", e)))?;

        let contacts = contacts
            .into_iter()
            .filter_map(|c| {
                let phone = c.number.filter(|n| !n.is_empty())?;
                Some(Contact {
                    name: c.name.unwrap_or_default(),
                    pushname: c.pushname.unwrap_or_default(),
                    id: c.id,
                    phone,
                })
            })
            .collect();
        Ok(ContactList { contacts })
    }

    pub async fn get_all_chats(&self) -> Result<ChatList, ServiceError> {
        self.ensure_ready()?;
        let chats = self
            .session
            .chats()
            .await
            .map_err(|e| ServiceError::Upstream(format!("Failed to get all chats: {}", e)))?;

        let mut summaries = Vec::with_capacity(chats.len());
        for chat in chats {
            let last_message = match self.session.fetch_messages(&chat.id, 1).await {
                Ok(messages) => messages.into_iter().next().map(|m| m.body).unwrap_or_default(),
                Err(e) => {
                    warn!("Could not fetch last message for chat {}: {}", chat.id, e);
                    String::new()
                }
            };
            summaries.push(ChatSummary {
                name: chat
                    .name
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| chat.id.clone()),
                id: chat.id,
                unread_count: chat.unread_count,
                last_message: Some(last_message),
            });
        }
        Ok(ChatList { chats: summaries })
    }

    /// Send `message`. While the session is not linked this returns the QR
    /// prompt (or a restart notice) instead of failing.
    pub async fn send_message(
        &self,
        phone_number: &str,
        message: &str,
    ) -> Result<String, ServiceError> {
        if !self.session.is_ready() {
            return Ok(self
                .session
                .qr_prompt()
                .unwrap_or_else(|| NOT_READY_NOTICE.to_string()));
        }
        self.session
            .send(&chat_id_for(phone_number), message)
            .await
            .map_err(|e| ServiceError::Upstream(format!("Failed to send message: {}", e)))?;
        info!("Message sent to {}", phone_number);
        Ok(format!("Message sent successfully to {}", phone_number))
    }

    pub async fn shutdown(&self) {
        match self.session.shutdown().await {
            Ok(()) => info!("WhatsApp session shut down"),
            Err(e) => warn!("Error shutting down WhatsApp session: {}", e),
        }
    }
}

#[cfg(feature = "whatsapp-web")]
pub mod linked;
pub mod store;

#[cfg(feature = "whatsapp-web")]
pub use linked::LinkedSession;
pub use store::SessionStore;

#[cfg(test)]
pub(crate) mod testing;
