//! Auto-responder for configured WhatsApp numbers.
//!
//! Each check fetches the latest messages of a number and, when the newest
//! one came from that number, asks a [`ReplyGenerator`] for an answer and
//! sends it back.

use crate::models::MessageData;
use crate::scheduler::{Job, PeriodicTask};
use crate::whatsapp::WhatsAppService;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Messages fetched per number on every check.
pub const FETCH_LIMIT: u32 = 10;
/// Turns of history kept per number.
pub const HISTORY_LIMIT: usize = 20;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
const REPLY_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Produces the answer to an incoming question.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn reply(&self, history: &[ChatTurn], question: &str) -> Result<String>;
}

/// OpenAI-compatible `/chat/completions` client.
pub struct ChatCompletionsReplier {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    system_prompt: Option<String>,
}

impl ChatCompletionsReplier {
    pub fn new(base_url: &str, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(REPLY_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: None,
        }
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt.filter(|p| !p.trim().is_empty());
        self
    }

    fn payload(&self, history: &[ChatTurn], question: &str) -> Value {
        let mut messages = Vec::with_capacity(history.len() + 2);
        if let Some(prompt) = &self.system_prompt {
            messages.push(json!({"role": "system", "content": prompt}));
        }
        messages.extend(history.iter().map(|t| json!(t)));
        messages.push(json!(ChatTurn::user(question)));
        json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": self.max_tokens,
        })
    }
}

#[async_trait]
impl ReplyGenerator for ChatCompletionsReplier {
    async fn reply(&self, history: &[ChatTurn], question: &str) -> Result<String> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.payload(history, question))
            .send()
            .await
            .context("Failed to generate response from GPT service.")?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .context("Failed to generate response from GPT service.")?;
        if !status.is_success() {
            let detail = body["error"]["message"].as_str().unwrap_or("unknown error");
            anyhow::bail!(
                "Failed to generate response from GPT service. ({}: {})",
                status.as_u16(),
                detail
            );
        }
        body["choices"]
            .as_array()
            .and_then(|choices| choices.first())
            .and_then(|choice| choice["message"]["content"].as_str())
            .map(str::to_string)
            .context("No choices in chat completion response")
    }
}

/// Answers new messages from a fixed set of numbers.
pub struct AutoResponder {
    whatsapp: WhatsAppService,
    generator: Arc<dyn ReplyGenerator>,
    numbers: Vec<String>,
    history: Mutex<HashMap<String, Vec<ChatTurn>>>,
}

impl AutoResponder {
    pub fn new(
        whatsapp: WhatsAppService,
        generator: Arc<dyn ReplyGenerator>,
        numbers: Vec<String>,
    ) -> Self {
        let numbers = numbers
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        Self {
            whatsapp,
            generator,
            numbers,
            history: Mutex::new(HashMap::new()),
        }
    }

    pub fn numbers(&self) -> &[String] {
        &self.numbers
    }

    /// Stored history for a number, oldest first.
    pub fn history(&self, number: &str) -> Vec<ChatTurn> {
        self.history
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(number)
            .cloned()
            .unwrap_or_default()
    }

    /// Check every number once. A failure on one number is logged and the
    /// rest are still checked. Returns how many replies were sent.
    pub async fn check_all(&self) -> usize {
        let mut replied = 0;
        for number in &self.numbers {
            match self.check_number(number).await {
                Ok(true) => replied += 1,
                Ok(false) => {}
                Err(e) => warn!("auto-response for {} failed: {:#}", number, e),
            }
        }
        replied
    }

    /// Reply to `number` if its newest message is unanswered.
    pub async fn check_number(&self, number: &str) -> Result<bool> {
        let missed = self.whatsapp.get_messages(number, FETCH_LIMIT).await?;
        if missed.has_new_messages != Some(true) {
            debug!("no new messages from {}", number);
            return Ok(false);
        }
        let mut messages = missed.messages;
        let Some(question) = messages.pop().filter(|m| m.from.starts_with(number)) else {
            return Ok(false);
        };

        let history = {
            let mut all = self
                .history
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let turns = all.entry(number.to_string()).or_default();
            if turns.is_empty() {
                *turns = seed_history(number, &messages);
            }
            turns.clone()
        };

        let reply = self.generator.reply(&history, &question.body).await?;
        self.whatsapp.send_message(number, &reply).await?;
        self.record(number, &question.body, &reply);
        info!("auto-replied to {} ({} chars)", number, reply.len());
        Ok(true)
    }

    fn record(&self, number: &str, question: &str, reply: &str) {
        let mut all = self
            .history
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let turns = all.entry(number.to_string()).or_default();
        turns.push(ChatTurn::user(question));
        turns.push(ChatTurn::assistant(reply));
        cap(turns);
    }

    /// Wrap this responder in a [`PeriodicTask`]. Returns `None` when no
    /// numbers are configured.
    pub fn into_task(self: Arc<Self>, interval: Duration) -> Option<PeriodicTask> {
        if self.numbers.is_empty() {
            info!("auto-responder disabled: no numbers configured");
            return None;
        }
        let job: Job = Arc::new(move || {
            let responder = self.clone();
            Box::pin(async move {
                responder.check_all().await;
                Ok(())
            })
        });
        Some(PeriodicTask::new("auto-responder", interval, job))
    }
}

/// Earlier messages become turns: those from `number` are the user's, the
/// rest are ours.
fn seed_history(number: &str, messages: &[MessageData]) -> Vec<ChatTurn> {
    let mut turns: Vec<ChatTurn> = messages
        .iter()
        .map(|m| {
            if m.from.starts_with(number) {
                ChatTurn::user(&m.body)
            } else {
                ChatTurn::assistant(&m.body)
            }
        })
        .collect();
    cap(&mut turns);
    turns
}

fn cap(turns: &mut Vec<ChatTurn>) {
    if turns.len() > HISTORY_LIMIT {
        turns.drain(..turns.len() - HISTORY_LIMIT);
    }
}
