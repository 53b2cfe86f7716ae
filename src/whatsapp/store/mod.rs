//! In-memory view of a linked device.
//!
//! Multi-device WhatsApp pushes messages as they arrive instead of serving
//! history on demand, so a live session records everything it sees here
//! and answers the backing API from it.

use super::{SessionChat, SessionContact, SessionMessage};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Messages kept per chat.
pub const MAX_MESSAGES_PER_CHAT: usize = 200;

const USER_SERVER: &str = "s.whatsapp.net";
const API_USER_SERVER: &str = "c.us";

/// `15551234567:3@s.whatsapp.net` -> `15551234567@c.us`. Group and other
/// ids only lose the device suffix.
pub fn api_id(jid: &str) -> String {
    let Some((user, server)) = jid.split_once('@') else {
        return format!("{}@{}", jid, API_USER_SERVER);
    };
    let user = user.split(':').next().unwrap_or(user);
    let server = if server == USER_SERVER {
        API_USER_SERVER
    } else {
        server
    };
    format!("{}@{}", user, server)
}

/// Inverse of [`api_id`]: the JID string the protocol expects.
pub fn protocol_jid(chat_id: &str) -> String {
    match chat_id.split_once('@') {
        Some((user, API_USER_SERVER)) => format!("{}@{}", user, USER_SERVER),
        Some(_) => chat_id.to_string(),
        None => format!("{}@{}", chat_id, USER_SERVER),
    }
}

fn number_of(id: &str) -> &str {
    id.split('@').next().unwrap_or(id)
}

#[derive(Debug, Default)]
struct ChatLog {
    name: Option<String>,
    unread: u32,
    messages: VecDeque<SessionMessage>,
}

impl ChatLog {
    fn push(&mut self, msg: SessionMessage) {
        if self.messages.len() == MAX_MESSAGES_PER_CHAT {
            self.messages.pop_front();
        }
        self.messages.push_back(msg);
    }

    fn last_timestamp(&self) -> i64 {
        self.messages.back().map_or(0, |m| m.timestamp)
    }
}

/// Link state, chats and contacts of one device. All ids are in the API
/// form (`@c.us`).
#[derive(Debug, Default)]
pub struct SessionStore {
    ready: AtomicBool,
    qr: Mutex<Option<String>>,
    own_id: Mutex<Option<String>>,
    chats: Mutex<HashMap<String, ChatLog>>,
    contacts: Mutex<HashMap<String, SessionContact>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Becoming ready clears any pending QR prompt.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
        if ready {
            *self.qr.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        }
    }

    pub fn qr_prompt(&self) -> Option<String> {
        self.qr
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn set_qr_prompt(&self, prompt: String) {
        *self.qr.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(prompt);
    }

    pub fn own_id(&self) -> Option<String> {
        self.own_id
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Record a message from someone else in `chat_id`. A non-empty
    /// `push_name` also updates the sender's contact entry.
    pub fn record_incoming(
        &self,
        chat_id: &str,
        sender: &str,
        push_name: &str,
        body: &str,
        timestamp: i64,
        has_media: bool,
    ) {
        let to = self.own_id().unwrap_or_default();
        {
            let mut chats = self
                .chats
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let chat = chats.entry(chat_id.to_string()).or_default();
            chat.unread += 1;
            if chat_id == sender && !push_name.is_empty() {
                chat.name = Some(push_name.to_string());
            }
            chat.push(SessionMessage {
                from: sender.to_string(),
                to,
                body: body.to_string(),
                timestamp,
                has_media,
            });
        }
        self.remember_contact(sender, push_name);
    }

    /// Record a message this device sent, either through the API or from
    /// the phone. Clears the chat's unread count.
    pub fn record_outgoing(&self, chat_id: &str, from: Option<&str>, body: &str, timestamp: i64) {
        if let Some(own) = from {
            *self
                .own_id
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(own.to_string());
        }
        let from = from.map(str::to_string).or_else(|| self.own_id()).unwrap_or_default();

        let mut chats = self
            .chats
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let chat = chats.entry(chat_id.to_string()).or_default();
        chat.unread = 0;
        chat.push(SessionMessage {
            from,
            to: chat_id.to_string(),
            body: body.to_string(),
            timestamp,
            has_media: false,
        });
    }

    fn remember_contact(&self, id: &str, push_name: &str) {
        if id.ends_with("@g.us") {
            return;
        }
        let mut contacts = self
            .contacts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let contact = contacts
            .entry(id.to_string())
            .or_insert_with(|| SessionContact {
                id: id.to_string(),
                name: None,
                pushname: None,
                number: Some(number_of(id).to_string()),
            });
        if !push_name.is_empty() {
            contact.pushname = Some(push_name.to_string());
        }
    }

    /// Most recent `limit` messages of a chat, oldest first. Unknown chats
    /// are an error.
    pub fn messages(&self, chat_id: &str, limit: u32) -> anyhow::Result<Vec<SessionMessage>> {
        let chats = self
            .chats
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(chat) = chats.get(chat_id) else {
            anyhow::bail!("no chat with {}", chat_id);
        };
        let skip = chat.messages.len().saturating_sub(limit as usize);
        Ok(chat.messages.iter().skip(skip).cloned().collect())
    }

    /// Chats with the most recently active first.
    pub fn chats(&self) -> Vec<SessionChat> {
        let chats = self
            .chats
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut ordered: Vec<(&String, &ChatLog)> = chats.iter().collect();
        ordered.sort_by(|a, b| {
            b.1.last_timestamp()
                .cmp(&a.1.last_timestamp())
                .then_with(|| a.0.cmp(b.0))
        });
        ordered
            .into_iter()
            .map(|(id, log)| SessionChat {
                id: id.clone(),
                name: log.name.clone(),
                unread_count: log.unread,
            })
            .collect()
    }

    /// Contacts ordered by id.
    pub fn contacts(&self) -> Vec<SessionContact> {
        let contacts = self
            .contacts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut all: Vec<SessionContact> = contacts.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }
}
