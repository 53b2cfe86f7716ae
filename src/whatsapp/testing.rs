use super::{SessionChat, SessionContact, SessionMessage, WhatsAppSession};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory session with scripted chats. Sends are recorded and appended
/// to the chat as outgoing messages.
#[derive(Default)]
pub struct FakeSession {
    ready: AtomicBool,
    qr: Mutex<Option<String>>,
    messages: Mutex<HashMap<String, Vec<SessionMessage>>>,
    contacts: Vec<SessionContact>,
    chats: Vec<SessionChat>,
    broken_chats: HashSet<String>,
    reject_sends: bool,
    sent: Mutex<Vec<(String, String)>>,
    pub shut_down: AtomicBool,
}

impl FakeSession {
    pub fn ready() -> Self {
        let session = Self::default();
        session.ready.store(true, Ordering::SeqCst);
        session
    }

    pub fn with_qr(prompt: &str) -> Self {
        let session = Self::default();
        *session.qr.lock().unwrap() = Some(prompt.to_string());
        session
    }

    pub fn message(mut self, chat_id: &str, from: &str, to: &str, body: &str, ts: i64) -> Self {
        self.messages
            .get_mut()
            .unwrap()
            .entry(chat_id.to_string())
            .or_default()
            .push(SessionMessage {
                from: from.to_string(),
                to: to.to_string(),
                body: body.to_string(),
                timestamp: ts,
                has_media: false,
            });
        self
    }

    pub fn media(mut self, chat_id: &str, from: &str, ts: i64) -> Self {
        self.messages
            .get_mut()
            .unwrap()
            .entry(chat_id.to_string())
            .or_default()
            .push(SessionMessage {
                from: from.to_string(),
                to: "me@c.us".to_string(),
                body: "<binary>".to_string(),
                timestamp: ts,
                has_media: true,
            });
        self
    }

    pub fn contact(
        mut self,
        id: &str,
        name: Option<&str>,
        pushname: Option<&str>,
        number: Option<&str>,
    ) -> Self {
        self.contacts.push(SessionContact {
            id: id.to_string(),
            name: name.map(str::to_string),
            pushname: pushname.map(str::to_string),
            number: number.map(str::to_string),
        });
        self
    }

    pub fn chat(mut self, id: &str, name: Option<&str>, unread: u32) -> Self {
        self.chats.push(SessionChat {
            id: id.to_string(),
            name: name.map(str::to_string),
            unread_count: unread,
        });
        self
    }

    pub fn broken_chat(mut self, id: &str) -> Self {
        self.broken_chats.insert(id.to_string());
        self
    }

    pub fn rejecting_sends(mut self) -> Self {
        self.reject_sends = true;
        self
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl WhatsAppSession for FakeSession {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn qr_prompt(&self) -> Option<String> {
        self.qr.lock().unwrap().clone()
    }

    async fn fetch_messages(
        &self,
        chat_id: &str,
        limit: u32,
    ) -> anyhow::Result<Vec<SessionMessage>> {
        if self.broken_chats.contains(chat_id) {
            anyhow::bail!("chat {} unavailable", chat_id);
        }
        let all = self
            .messages
            .lock()
            .unwrap()
            .get(chat_id)
            .cloned()
            .unwrap_or_default();
        let skip = all.len().saturating_sub(limit as usize);
        Ok(all.into_iter().skip(skip).collect())
    }

    async fn contacts(&self) -> anyhow::Result<Vec<SessionContact>> {
        Ok(self.contacts.clone())
    }

    async fn chats(&self) -> anyhow::Result<Vec<SessionChat>> {
        Ok(self.chats.clone())
    }

    async fn send(&self, chat_id: &str, text: &str) -> anyhow::Result<()> {
        if self.reject_sends {
            anyhow::bail!("send to {} rejected", chat_id);
        }
        self.sent
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        let mut messages = self.messages.lock().unwrap();
        let chat = messages.entry(chat_id.to_string()).or_default();
        let timestamp = chat.last().map_or(1, |m| m.timestamp + 1);
        chat.push(SessionMessage {
            from: "me@c.us".to_string(),
            to: chat_id.to_string(),
            body: text.to_string(),
            timestamp,
            has_media: false,
        });
        Ok(())
    }

    async fn shutdown(&self) -> anyhow::Result<()> {
        self.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}
