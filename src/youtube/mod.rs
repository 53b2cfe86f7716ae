//! YouTube Data API v3 service behind the backing API.

pub mod credentials;

pub use credentials::{CredentialSource, GOOGLE_TOKEN_URI, OAuthClient, StaticToken, TokenFile};

use crate::errors::ServiceError;
use crate::models::{Playlist, PlaylistItem};
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info};

pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const PAGE_SIZE: &str = "50";

#[derive(Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

#[derive(Deserialize)]
struct SearchResult {
    id: SearchId,
}

#[derive(Deserialize)]
struct SearchId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Deserialize)]
struct GoogleError {
    message: String,
}

/// Playlist management for the authenticated account. Reuses a single
/// `reqwest::Client` for connection pooling.
pub struct YouTubeService {
    http: Client,
    base_url: String,
    credentials: Arc<dyn CredentialSource>,
}

impl YouTubeService {
    pub fn new(credentials: Arc<dyn CredentialSource>) -> Self {
        Self::with_base_url(credentials, YOUTUBE_API_BASE)
    }

    pub fn with_base_url(credentials: Arc<dyn CredentialSource>, base_url: &str) -> Self {
        Self {
            http: crate::utils::http::default_http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    /// Every playlist of the account, following `nextPageToken`.
    pub async fn get_playlists(&self) -> Result<Vec<Playlist>, ServiceError> {
        let mut playlists = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query = vec![
                ("part", "snippet".to_string()),
                ("mine", "true".to_string()),
                ("maxResults", PAGE_SIZE.to_string()),
            ];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }
            let page: Page<Playlist> = self.call(Method::GET, "playlists", &query, None).await?;
            playlists.extend(page.items);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(playlists)
    }

    /// Every item of a playlist. Any empty page is treated as an unknown
    /// playlist.
    pub async fn get_playlist_songs(
        &self,
        playlist_id: &str,
    ) -> Result<Vec<PlaylistItem>, ServiceError> {
        let mut songs = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query = vec![
                ("part", "snippet".to_string()),
                ("playlistId", playlist_id.to_string()),
                ("maxResults", PAGE_SIZE.to_string()),
            ];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }
            let page: Page<PlaylistItem> =
                self.call(Method::GET, "playlistItems", &query, None).await?;
            if page.items.is_empty() {
                return Err(ServiceError::NotFound("Playlist not found".to_string()));
            }
            songs.extend(page.items);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(songs)
    }

    pub async fn create_playlist(
        &self,
        name: &str,
        description: &str,
    ) -> Result<String, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "Playlist name is required".to_string(),
            ));
        }
        let body = json!({
            "snippet": { "title": name, "description": description }
        });
        let created: Created = self
            .call(
                Method::POST,
                "playlists",
                &[("part", "snippet".to_string())],
                Some(&body),
            )
            .await?;
        info!("Created playlist '{}' ({})", name, created.id);
        Ok(format!("Playlist created. PlaylistId is : {}", created.id))
    }

    /// Add the top search hit for `song_name` to the playlist.
    pub async fn add_song(
        &self,
        playlist_id: &str,
        song_name: &str,
    ) -> Result<String, ServiceError> {
        if song_name.trim().is_empty() {
            return Err(ServiceError::InvalidInput("Song name is required".to_string()));
        }
        let query = [
            ("part", "snippet".to_string()),
            ("q", song_name.to_string()),
            ("type", "video".to_string()),
            ("maxResults", "1".to_string()),
        ];
        let results: Page<SearchResult> = self.call(Method::GET, "search", &query, None).await?;
        let video_id = results
            .items
            .into_iter()
            .next()
            .and_then(|r| r.id.video_id)
            .ok_or_else(|| ServiceError::NotFound("Song not found".to_string()))?;

        let body = json!({
            "snippet": {
                "playlistId": playlist_id,
                "resourceId": { "kind": "youtube#video", "videoId": video_id }
            }
        });
        let created: Created = self
            .call(
                Method::POST,
                "playlistItems",
                &[("part", "snippet".to_string())],
                Some(&body),
            )
            .await?;
        Ok(format!(
            "Song added to playlist. PlaylistItemId is : {}",
            created.id
        ))
    }

    /// Remove the first item whose title equals `song_name` exactly.
    pub async fn delete_song(
        &self,
        playlist_id: &str,
        song_name: &str,
    ) -> Result<String, ServiceError> {
        let songs = self.get_playlist_songs(playlist_id).await?;
        let song = songs
            .into_iter()
            .find(|s| s.snippet.title == song_name)
            .ok_or_else(|| ServiceError::NotFound("Song not found in playlist".to_string()))?;

        self.send(
            Method::DELETE,
            "playlistItems",
            &[("id", song.id.clone())],
            None,
        )
        .await?;
        Ok(format!(
            "Song deleted from playlist. PlaylistItemId was : {}",
            song.id
        ))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T, ServiceError> {
        let response = self.send(method, endpoint, query, body).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ServiceError::Upstream(format!("Invalid YouTube response: {}", e)))
    }

    /// Send an authorised request. On 401 the token is fetched again and the
    /// request retried once if it changed.
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ServiceError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let token = self.token().await?;
        debug!("YouTube {} {}", method, url);

        let mut response = self
            .send_request(method.clone(), &url, &token, query, body)
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            let fresh = self.token().await?;
            if fresh != token {
                info!("YouTube API returned 401, retrying with refreshed token");
                response = self
                    .send_request(method, &url, &fresh, query, body)
                    .await?;
            }
        }

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GoogleErrorBody>(&text)
            .map(|b| b.error.message)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or_default().to_string());
        Err(ServiceError::Upstream(format!(
            "YouTube API error: {} {}",
            status.as_u16(),
            message
        )))
    }

    async fn send_request(
        &self,
        method: Method,
        url: &str,
        token: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ServiceError> {
        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(token)
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }
        request
            .send()
            .await
            .map_err(|e| ServiceError::Upstream(format!("YouTube request failed: {}", e)))
    }

    async fn token(&self) -> Result<String, ServiceError> {
        self.credentials
            .access_token()
            .await
            .map_err(|e| ServiceError::Config(format!("YouTube credentials unavailable: {}", e)))
    }
}
