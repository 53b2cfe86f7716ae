//! Wire types shared by the backing API and the failover client.
//!
//! Field names follow the JSON the API has always spoken (camelCase), so
//! both sides deserialize the same shapes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageData {
    pub from: String,
    pub body: String,
    /// Unix seconds as reported by the session.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissedMessages {
    #[serde(default)]
    pub messages: Vec<MessageData>,
    #[serde(
        default,
        rename = "hasNewMessages",
        skip_serializing_if = "Option::is_none"
    )]
    pub has_new_messages: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactLookup {
    #[serde(rename = "whatsAppId")]
    pub whats_app_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pushname: String,
    pub id: String,
    #[serde(default)]
    pub phone: String,
}

impl Contact {
    /// Name shown to the agent: saved name, then push name, then the number.
    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if !self.pushname.is_empty() {
            &self.pushname
        } else {
            &self.phone
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactList {
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub name: String,
    pub id: String,
    #[serde(default, rename = "unreadCount")]
    pub unread_count: u32,
    #[serde(
        default,
        rename = "lastMessage",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatList {
    #[serde(default)]
    pub chats: Vec<ChatSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    #[serde(rename = "isReady")]
    pub is_ready: bool,
    #[serde(rename = "hasQR")]
    pub has_qr: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrCode {
    #[serde(rename = "qrCode")]
    pub qr_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    #[serde(default)]
    pub title: String,
}

/// A playlist as returned by the YouTube Data API (`id` + `snippet.title`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    #[serde(default)]
    pub snippet: Snippet,
}

/// One entry of a playlist. `id` is the playlist item id, not the video id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistItem {
    pub id: String,
    #[serde(default)]
    pub snippet: Snippet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    #[serde(default, rename = "playlistName")]
    pub playlist_name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRequest {
    #[serde(default, rename = "songName")]
    pub song_name: String,
}

/// `{ "message": ... }` reply used by the mutating YouTube routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub message: String,
}

/// `{ "error": ... }` body returned by every failing route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}
