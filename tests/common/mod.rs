// Shared test helpers; not every test binary uses all of them.
#![allow(unused)]

use async_trait::async_trait;
use chatterbox::gateway::{self, AppState};
use chatterbox::health::HealthService;
use chatterbox::whatsapp::{
    SessionChat, SessionContact, SessionMessage, WhatsAppService, WhatsAppSession,
};
use chatterbox::youtube::{StaticToken, YouTubeService};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const SECRET: &str = "integration-secret";

/// Linked session backed by in-memory chats. Sends are appended to the
/// chat as outgoing messages.
#[derive(Default)]
pub struct MemorySession {
    pub chats: Mutex<HashMap<String, Vec<SessionMessage>>>,
    pub contacts: Vec<SessionContact>,
}

impl MemorySession {
    pub fn with_incoming(chat_id: &str, body: &str) -> Self {
        let session = Self::default();
        session.chats.lock().unwrap().insert(
            chat_id.to_string(),
            vec![SessionMessage {
                from: chat_id.to_string(),
                to: "me@c.us".to_string(),
                body: body.to_string(),
                timestamp: 1_700_000_000,
                has_media: false,
            }],
        );
        session
    }

    pub fn sent_to(&self, chat_id: &str) -> Vec<String> {
        self.chats
            .lock()
            .unwrap()
            .get(chat_id)
            .map(|msgs| {
                msgs.iter()
                    .filter(|m| m.from == "me@c.us")
                    .map(|m| m.body.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl WhatsAppSession for MemorySession {
    fn is_ready(&self) -> bool {
        true
    }

    fn qr_prompt(&self) -> Option<String> {
        None
    }

    async fn fetch_messages(
        &self,
        chat_id: &str,
        limit: u32,
    ) -> anyhow::Result<Vec<SessionMessage>> {
        let all = self
            .chats
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
        Ok(self
            .chats
            .lock()
            .unwrap()
            .keys()
            .map(|id| SessionChat {
                id: id.clone(),
                name: None,
                unread_count: 0,
            })
            .collect())
    }

    async fn send(&self, chat_id: &str, text: &str) -> anyhow::Result<()> {
        self.chats
            .lock()
            .unwrap()
            .entry(chat_id.to_string())
            .or_default()
            .push(SessionMessage {
                from: "me@c.us".to_string(),
                to: chat_id.to_string(),
                body: text.to_string(),
                timestamp: 1_700_000_001,
                has_media: false,
            });
        Ok(())
    }
}

/// A backing API running on an ephemeral port.
pub struct Backend {
    pub addr: SocketAddr,
    pub session: Arc<MemorySession>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Backend {
    pub async fn start(session: MemorySession) -> Self {
        let session = Arc::new(session);
        let state = AppState {
            whatsapp: WhatsAppService::new(session.clone()),
            youtube: Arc::new(YouTubeService::with_base_url(
                Arc::new(StaticToken::new("unused")),
                "http://127.0.0.1:9",
            )),
            health: Arc::new(HealthService::new()),
            secret: Some(Arc::from(SECRET)),
        };
        let (tx, rx) = oneshot::channel::<()>();
        let (handle, addr) = gateway::start("127.0.0.1", 0, state, async move {
            let _ = rx.await;
        })
        .await
        .unwrap();
        Self {
            addr,
            session,
            shutdown: Some(tx),
            handle: Some(handle),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}
