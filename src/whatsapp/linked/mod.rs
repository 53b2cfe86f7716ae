//! Live WhatsApp link over `wa-rs`, stored in a local SQLite session.

use super::store::{SessionStore, api_id, protocol_jid};
use super::{SessionChat, SessionContact, SessionMessage, WhatsAppSession};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use wa_rs::Client;
use wa_rs::bot::Bot;
use wa_rs_binary::jid::Jid;
use wa_rs_core::proto_helpers::MessageExt;
use wa_rs_core::types::events::Event;
use wa_rs_tokio_transport::TokioWebSocketTransportFactory;
use wa_rs_ureq_http::UreqHttpClient;

const LINK_HINT: &str =
    "Scan this with your WhatsApp mobile app by going to Settings > Linked Devices > Link a Device.";

/// Reconnect delay: 5s doubling up to 60s.
fn reconnect_delay(attempt: u32) -> Duration {
    Duration::from_secs((5u64 << attempt.min(4)).min(60))
}

/// Text returned in place of a send confirmation while the device waits
/// for a QR scan.
fn qr_prompt_text(code: &str) -> String {
    match qrcode::QrCode::new(code.trim().as_bytes()) {
        Ok(qr) => {
            let rendered = qr
                .render::<qrcode::render::unicode::Dense1x2>()
                .quiet_zone(true)
                .build();
            format!("Please scan this QR Code:\n\n```\n{}\n```\n\n{}", rendered, LINK_HINT)
        }
        Err(e) => {
            warn!("Failed to render WhatsApp QR code: {}", e);
            format!("Please scan this QR Code. Raw code: {}\n\n{}", code, LINK_HINT)
        }
    }
}

fn handle_event(store: &SessionStore, event: &Event) {
    match event {
        Event::Message(msg, info) => {
            let chat = api_id(&info.source.chat.to_string());
            let sender = api_id(&info.source.sender.to_string());
            let base = msg.get_base_message();
            let has_media = base.image_message.is_some()
                || base.audio_message.is_some()
                || base.video_message.is_some()
                || base.document_message.is_some();
            let body = msg
                .text_content()
                .or_else(|| msg.get_caption())
                .unwrap_or_default();
            let timestamp = info.timestamp.timestamp();

            if info.source.is_from_me {
                store.record_outgoing(&chat, Some(&sender), body, timestamp);
            } else {
                store.record_incoming(
                    &chat,
                    &sender,
                    &info.push_name,
                    body,
                    timestamp,
                    has_media,
                );
            }
            debug!("WhatsApp message recorded in {}", chat);
        }
        Event::PairingQrCode { code, .. } => {
            match qr2term::print_qr(code) {
                Ok(()) => println!("\n{}", LINK_HINT),
                Err(e) => debug!("qr2term failed: {}", e),
            }
            store.set_qr_prompt(qr_prompt_text(code));
            info!("WhatsApp QR code received, waiting for scan");
        }
        Event::PairSuccess(_) => info!("WhatsApp pairing successful"),
        Event::PairError(e) => error!("WhatsApp pairing failed: {:?}", e),
        Event::Connected(_) => {
            store.set_ready(true);
            info!("WhatsApp connected");
        }
        Event::Disconnected(_) => {
            store.set_ready(false);
            warn!("WhatsApp disconnected");
        }
        Event::LoggedOut(_) => {
            store.set_ready(false);
            warn!("WhatsApp device was logged out; a new QR scan is required");
        }
        _ => {}
    }
}

/// A device linked through `wa-rs`. Connects in the background and
/// reconnects with backoff until shut down.
pub struct LinkedSession {
    store: Arc<SessionStore>,
    client: Arc<tokio::sync::Mutex<Option<Arc<Client>>>>,
    running: Arc<AtomicBool>,
    task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl LinkedSession {
    /// Start the link using the session database at `db_path`.
    pub fn start(db_path: PathBuf) -> Result<Arc<Self>> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let session = Arc::new(Self {
            store: Arc::new(SessionStore::new()),
            client: Arc::new(tokio::sync::Mutex::new(None)),
            running: Arc::new(AtomicBool::new(true)),
            task: std::sync::Mutex::new(None),
        });

        let store = session.store.clone();
        let client_slot = session.client.clone();
        let running = session.running.clone();
        let db = db_path.to_string_lossy().into_owned();
        let task = tokio::spawn(async move {
            let mut attempt = 0u32;
            while running.load(Ordering::SeqCst) {
                match run_bot(&db, store.clone(), client_slot.clone()).await {
                    Ok(()) => attempt = 0,
                    Err(e) => error!("WhatsApp link failed: {:#}", e),
                }
                *client_slot.lock().await = None;
                store.set_ready(false);
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let delay = reconnect_delay(attempt);
                attempt += 1;
                warn!("WhatsApp link stopped, reconnecting in {}s", delay.as_secs());
                tokio::time::sleep(delay).await;
            }
        });
        *session
            .task
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(task);
        info!("WhatsApp link started (session: {})", db_path.display());
        Ok(session)
    }
}

async fn run_bot(
    db: &str,
    store: Arc<SessionStore>,
    client_slot: Arc<tokio::sync::Mutex<Option<Arc<Client>>>>,
) -> Result<()> {
    let backend = Arc::new(
        wa_rs::store::SqliteStore::new(db)
            .await
            .map_err(|e| anyhow!("failed to open WhatsApp session store: {}", e))?,
    );
    let mut bot = Bot::builder()
        .with_backend(backend)
        .with_transport_factory(TokioWebSocketTransportFactory::new())
        .with_http_client(UreqHttpClient::new())
        .on_event(move |event, _client| {
            let store = store.clone();
            async move { handle_event(&store, &event) }
        })
        .build()
        .await
        .map_err(|e| anyhow!("failed to build WhatsApp bot: {}", e))?;

    *client_slot.lock().await = Some(bot.client());
    let handle = bot.run().await.map_err(|e| anyhow!("WhatsApp bot run error: {}", e))?;
    handle.await.map_err(|e| anyhow!("WhatsApp bot task ended: {}", e))
}

#[async_trait]
impl WhatsAppSession for LinkedSession {
    fn is_ready(&self) -> bool {
        self.store.is_ready()
    }

    fn qr_prompt(&self) -> Option<String> {
        self.store.qr_prompt()
    }

    async fn fetch_messages(&self, chat_id: &str, limit: u32) -> Result<Vec<SessionMessage>> {
        self.store.messages(chat_id, limit)
    }

    async fn contacts(&self) -> Result<Vec<SessionContact>> {
        Ok(self.store.contacts())
    }

    async fn chats(&self) -> Result<Vec<SessionChat>> {
        Ok(self.store.chats())
    }

    async fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        let client = self
            .client
            .lock()
            .await
            .clone()
            .ok_or_else(|| anyhow!("WhatsApp client not connected"))?;
        let target = protocol_jid(chat_id);
        let jid = target
            .parse::<Jid>()
            .map_err(|e| anyhow!("Invalid WhatsApp chat id '{}': {}", chat_id, e))?;
        let message = wa_rs_proto::whatsapp::Message {
            conversation: Some(text.to_string()),
            ..Default::default()
        };
        let id = client
            .send_message(jid, message)
            .await
            .map_err(|e| anyhow!("WhatsApp send error: {}", e))?;
        debug!("WhatsApp message {} sent to {}", id, target);
        self.store.record_outgoing(chat_id, None, text, Utc::now().timestamp());
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(task) = self
            .task
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
        *self.client.lock().await = None;
        self.store.set_ready(false);
        Ok(())
    }
}
