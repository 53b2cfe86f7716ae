pub mod base;
pub mod registry;
pub mod whatsapp;
pub mod youtube;

pub use base::{Tool, ToolDefinition, ToolMiddleware, ToolResult};
pub use registry::ToolRegistry;

use crate::client::{FailoverClient, WhatsAppApi, YouTubeApi};
use std::sync::Arc;

/// Registry with every WhatsApp and YouTube tool wired to `client`.
pub fn build_registry(client: Arc<FailoverClient>) -> ToolRegistry {
    let whatsapp = WhatsAppApi::new(client.clone());
    let youtube = YouTubeApi::new(client.clone());

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(whatsapp::WhatsappReaderTool::new(whatsapp.clone())));
    registry.register(Arc::new(whatsapp::WhatsappRetrieveUserTool::new(
        whatsapp.clone(),
    )));
    registry.register(Arc::new(whatsapp::WhatsappSenderTool::new(whatsapp.clone())));
    registry.register(Arc::new(whatsapp::WhatsappHealthCheckTool::new(
        client.clone(),
    )));
    registry.register(Arc::new(whatsapp::WhatsappServerStatusTool::new(client)));
    registry.register(Arc::new(whatsapp::WhatsappGetAllContactsTool::new(
        whatsapp.clone(),
    )));
    registry.register(Arc::new(whatsapp::WhatsappGetAllChatsTool::new(whatsapp)));

    registry.register(Arc::new(youtube::YoutubeCreatePlaylistTool::new(
        youtube.clone(),
    )));
    registry.register(Arc::new(youtube::YoutubeGetPlaylistsTool::new(
        youtube.clone(),
    )));
    registry.register(Arc::new(youtube::YoutubeGetPlaylistSongsTool::new(
        youtube.clone(),
    )));
    registry.register(Arc::new(youtube::YoutubeAddSongTool::new(youtube.clone())));
    registry.register(Arc::new(youtube::YoutubeDeleteSongTool::new(youtube)));
    registry
}
