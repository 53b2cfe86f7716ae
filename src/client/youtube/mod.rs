use super::failover::{ApiRequest, FailoverClient, YOUTUBE_PREFIX};
use crate::errors::BridgeError;
use crate::models::{MessageEnvelope, Playlist, PlaylistItem};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use urlencoding::encode;

const DEFAULT_PLAYLIST_DESCRIPTION: &str = "A new playlist";

/// Typed calls to the `/api/youtube` routes. Goes through the same
/// failover client as the WhatsApp calls.
#[derive(Clone)]
pub struct YouTubeApi {
    client: Arc<FailoverClient>,
}

impl YouTubeApi {
    pub fn new(client: Arc<FailoverClient>) -> Self {
        Self { client }
    }

    pub async fn create_playlist(&self, name: &str) -> Result<String, BridgeError> {
        let body = json!({
            "playlistName": name,
            "description": DEFAULT_PLAYLIST_DESCRIPTION,
        });
        self.post_for_message("/playlist".to_string(), body).await
    }

    pub async fn get_playlists(&self) -> Result<Vec<Playlist>, BridgeError> {
        let value: Value = self
            .client
            .call(&ApiRequest::get(YOUTUBE_PREFIX, "/playlist"))
            .await?
            .json()?;
        unwrap_list(value, "playlist")
    }

    pub async fn get_playlist_songs(
        &self,
        playlist_id: &str,
    ) -> Result<Vec<PlaylistItem>, BridgeError> {
        let endpoint = format!("/playlist/{}/songs", encode(playlist_id));
        let value: Value = self
            .client
            .call(&ApiRequest::get(YOUTUBE_PREFIX, endpoint))
            .await?
            .json()?;
        unwrap_list(value, "songs")
    }

    pub async fn add_song(
        &self,
        playlist_id: &str,
        song_name: &str,
    ) -> Result<String, BridgeError> {
        let endpoint = format!("/playlist/{}/add-song", encode(playlist_id));
        self.post_for_message(endpoint, json!({ "songName": song_name })).await
    }

    pub async fn delete_song(
        &self,
        playlist_id: &str,
        song_name: &str,
    ) -> Result<String, BridgeError> {
        let endpoint = format!("/playlist/{}/delete-song", encode(playlist_id));
        self.post_for_message(endpoint, json!({ "songName": song_name })).await
    }

    async fn post_for_message(&self, endpoint: String, body: Value) -> Result<String, BridgeError> {
        let envelope: MessageEnvelope = self
            .client
            .call(&ApiRequest::post(YOUTUBE_PREFIX, endpoint, body))
            .await?
            .json()?;
        Ok(envelope.message)
    }
}

/// Lists come back either bare or wrapped as `{ "<key>": [...] }`.
fn unwrap_list<T: DeserializeOwned>(value: Value, key: &str) -> Result<Vec<T>, BridgeError> {
    let list = match value {
        Value::Object(mut map) if map.contains_key(key) => map.remove(key).unwrap_or_default(),
        other => other,
    };
    serde_json::from_value(list).map_err(|e| BridgeError::Decode(e.to_string()))
}
