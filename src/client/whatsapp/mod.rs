use super::failover::{ApiRequest, FailoverClient, WHATSAPP_PREFIX};
use crate::errors::BridgeError;
use crate::models::{ChatList, ChatSummary, Contact, ContactList, ContactLookup, MissedMessages};
use serde_json::json;
use std::sync::Arc;
use urlencoding::encode;

/// Typed calls to the `/api/whatsapp` routes.
#[derive(Clone)]
pub struct WhatsAppApi {
    client: Arc<FailoverClient>,
}

impl WhatsAppApi {
    pub fn new(client: Arc<FailoverClient>) -> Self {
        Self { client }
    }

    pub async fn get_messages(
        &self,
        phone_number: &str,
        count: u32,
    ) -> Result<MissedMessages, BridgeError> {
        let endpoint = format!("/missedMessages/{}/{}", encode(phone_number), count);
        self.client
            .call(&ApiRequest::get(WHATSAPP_PREFIX, endpoint))
            .await?
            .json()
    }

    pub async fn lookup_contact(&self, contact_name: &str) -> Result<String, BridgeError> {
        let endpoint = format!("/lookupContact/{}", encode(contact_name));
        let lookup: ContactLookup = self
            .client
            .call(&ApiRequest::get(WHATSAPP_PREFIX, endpoint))
            .await?
            .json()?;
        Ok(lookup.whats_app_id)
    }

    /// Returns the server's plain-text confirmation (or its QR prompt when
    /// the session still needs linking).
    pub async fn send_message(
        &self,
        phone_number: &str,
        message: &str,
    ) -> Result<String, BridgeError> {
        let endpoint = format!("/sendMessage/{}", encode(phone_number));
        let resp = self
            .client
            .call(&ApiRequest::post(
                WHATSAPP_PREFIX,
                endpoint,
                json!({ "message": message }),
            ))
            .await?;
        Ok(resp.body)
    }

    pub async fn get_all_contacts(&self) -> Result<Vec<Contact>, BridgeError> {
        let list: ContactList = self
            .client
            .call(&ApiRequest::get(WHATSAPP_PREFIX, "/getAllContacts"))
            .await?
            .json()?;
        Ok(list.contacts)
    }

    pub async fn get_all_chats(&self) -> Result<Vec<ChatSummary>, BridgeError> {
        let list: ChatList = self
            .client
            .call(&ApiRequest::get(WHATSAPP_PREFIX, "/getAllChats"))
            .await?
            .json()?;
        Ok(list.chats)
    }
}
