//! Text layouts handed back to the agent. The exact wording is part of the
//! tool contract that existing prompts rely on.

use crate::client::ServerHealth;
use crate::models::{ChatSummary, Contact, MissedMessages, Playlist, PlaylistItem};
use std::fmt::Write;

const PREVIEW_CHARS: usize = 50;

pub fn format_messages(target: &str, data: &MissedMessages) -> String {
    let lines: Vec<String> = data
        .messages
        .iter()
        .map(|m| format!("[{}] {} : {}", m.timestamp, m.from, m.body))
        .collect();
    let mut text = format!(
        "Last {} WhatsApp messages for {} were:\r\n {}",
        data.messages.len(),
        target,
        lines.join("\r\n")
    );
    if data.has_new_messages == Some(true)
        && let Some(last) = data.messages.last()
    {
        let _ = write!(
            text,
            "\n\nYou need to respond to the last message from {}",
            last.from
        );
    }
    text
}

pub fn format_contacts(contacts: &[Contact]) -> String {
    let mut text = String::from("All WhatsApp Contacts:\n\n");
    for contact in contacts {
        let _ = writeln!(
            text,
            "• {} ({}) - ID: {}",
            contact.display_name(),
            contact.phone,
            contact.id
        );
    }
    text
}

/// Preview capped at 50 characters, with `...` when cut.
fn preview(message: &str) -> String {
    let mut chars = message.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

pub fn format_chats(chats: &[ChatSummary]) -> String {
    let mut text = String::from("All WhatsApp Chats:\n\n");

    let unread: Vec<&ChatSummary> = chats.iter().filter(|c| c.unread_count > 0).collect();
    if !unread.is_empty() {
        text.push_str("📱 CHATS WITH UNREAD MESSAGES:\n");
        for chat in unread {
            let _ = writeln!(text, "• {} - {} unread messages", chat.name, chat.unread_count);
            if let Some(last) = chat.last_message.as_deref().filter(|m| !m.is_empty()) {
                let _ = writeln!(text, "  Last: \"{}\"", preview(last));
            }
        }
        text.push('\n');
    }

    text.push_str("📂 ALL CHATS:\n");
    for chat in chats {
        if chat.unread_count > 0 {
            let _ = writeln!(text, "• {} ({} unread)", chat.name, chat.unread_count);
        } else {
            let _ = writeln!(text, "• {}", chat.name);
        }
    }
    text
}

pub fn format_playlists(playlists: &[Playlist]) -> String {
    if playlists.is_empty() {
        return "No playlists found.".to_string();
    }
    let mut text = String::from("YouTube Playlists:\n\n");
    for playlist in playlists {
        let _ = writeln!(text, "• {} (ID: {})", playlist.snippet.title, playlist.id);
    }
    text
}

pub fn format_playlist_songs(playlist_id: &str, songs: &[PlaylistItem]) -> String {
    if songs.is_empty() {
        return "No songs found in this playlist.".to_string();
    }
    let mut text = format!("Songs in Playlist ({}):\n\n", playlist_id);
    for (idx, song) in songs.iter().enumerate() {
        let _ = writeln!(text, "{}. {} (ID: {})", idx + 1, song.snippet.title, song.id);
    }
    text
}

pub fn format_server_status(current: &str, servers: &[ServerHealth]) -> String {
    let mut text = String::from("WhatsApp Server Status:\n\n");
    let _ = write!(text, "Current Active Server: {}\n\n", current);
    text.push_str("All Configured Servers:\n");
    for server in servers {
        let status = if server.healthy {
            "✅ HEALTHY"
        } else {
            "❌ UNHEALTHY"
        };
        let active = if server.active { " (ACTIVE)" } else { "" };
        let _ = writeln!(text, "- {}: {}{}", server.url, status, active);
    }
    text
}

pub fn format_health(url: &str, healthy: bool) -> String {
    if healthy {
        format!("WhatsApp server is healthy and accessible at: {}", url)
    } else {
        format!("WhatsApp server is not accessible at: {}", url)
    }
}
