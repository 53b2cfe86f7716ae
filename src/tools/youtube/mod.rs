use crate::client::YouTubeApi;
use crate::format;
use crate::tools::base::{Tool, ToolResult, string_param, string_schema};
use async_trait::async_trait;
use serde_json::Value;

fn missing(action: &str, msg: &str) -> ToolResult {
    ToolResult::error(format!("Error {}: {}", action, msg))
}

pub struct YoutubeCreatePlaylistTool {
    api: YouTubeApi,
}

impl YoutubeCreatePlaylistTool {
    pub fn new(api: YouTubeApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Tool for YoutubeCreatePlaylistTool {
    fn name(&self) -> &'static str {
        "youtubeCreatePlaylist"
    }

    fn description(&self) -> &'static str {
        "Create a youtube playlist."
    }

    fn parameters(&self) -> Value {
        string_schema(&[("playlistName", "Name of the new playlist")])
    }

    async fn execute(&self, params: Value) -> anyhow::Result<ToolResult> {
        const ACTION: &str = "creating playlist";
        let name = match string_param(&params, "playlistName") {
            Ok(name) => name,
            Err(msg) => return Ok(missing(ACTION, &msg)),
        };
        Ok(ToolResult::from_result(
            self.api.create_playlist(&name).await,
            ACTION,
        ))
    }
}

pub struct YoutubeGetPlaylistsTool {
    api: YouTubeApi,
}

impl YoutubeGetPlaylistsTool {
    pub fn new(api: YouTubeApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Tool for YoutubeGetPlaylistsTool {
    fn name(&self) -> &'static str {
        "youtubeGetPlaylists"
    }

    fn description(&self) -> &'static str {
        "Retrieve a list of all user YouTube playlists."
    }

    fn parameters(&self) -> Value {
        string_schema(&[])
    }

    async fn execute(&self, _params: Value) -> anyhow::Result<ToolResult> {
        let result = self
            .api
            .get_playlists()
            .await
            .map(|playlists| format::format_playlists(&playlists));
        Ok(ToolResult::from_result(result, "retrieving playlists"))
    }
}

pub struct YoutubeGetPlaylistSongsTool {
    api: YouTubeApi,
}

impl YoutubeGetPlaylistSongsTool {
    pub fn new(api: YouTubeApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Tool for YoutubeGetPlaylistSongsTool {
    fn name(&self) -> &'static str {
        "youtubeGetPlaylistSongs"
    }

    fn description(&self) -> &'static str {
        "Retrieve the songs of a specific YouTube playlist."
    }

    fn parameters(&self) -> Value {
        string_schema(&[("playlistId", "Id of the playlist")])
    }

    async fn execute(&self, params: Value) -> anyhow::Result<ToolResult> {
        const ACTION: &str = "retrieving playlist songs";
        let playlist_id = match string_param(&params, "playlistId") {
            Ok(id) => id,
            Err(msg) => return Ok(missing(ACTION, &msg)),
        };
        let result = self
            .api
            .get_playlist_songs(&playlist_id)
            .await
            .map(|songs| format::format_playlist_songs(&playlist_id, &songs));
        Ok(ToolResult::from_result(result, ACTION))
    }
}

pub struct YoutubeAddSongTool {
    api: YouTubeApi,
}

impl YoutubeAddSongTool {
    pub fn new(api: YouTubeApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Tool for YoutubeAddSongTool {
    fn name(&self) -> &'static str {
        "youtubeAddSong"
    }

    fn description(&self) -> &'static str {
        "Add a song to a specific playlistId"
    }

    fn parameters(&self) -> Value {
        string_schema(&[
            ("playlistId", "Id of the playlist"),
            ("songName", "Song to search for and add"),
        ])
    }

    async fn execute(&self, params: Value) -> anyhow::Result<ToolResult> {
        const ACTION: &str = "adding song";
        let args = string_param(&params, "playlistId")
            .and_then(|id| Ok((id, string_param(&params, "songName")?)));
        let (playlist_id, song) = match args {
            Ok(args) => args,
            Err(msg) => return Ok(missing(ACTION, &msg)),
        };
        Ok(ToolResult::from_result(
            self.api.add_song(&playlist_id, &song).await,
            ACTION,
        ))
    }
}

pub struct YoutubeDeleteSongTool {
    api: YouTubeApi,
}

impl YoutubeDeleteSongTool {
    pub fn new(api: YouTubeApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Tool for YoutubeDeleteSongTool {
    fn name(&self) -> &'static str {
        "youtubeDeleteSong"
    }

    fn description(&self) -> &'static str {
        "Delete a song from a specific playlistId"
    }

    fn parameters(&self) -> Value {
        string_schema(&[
            ("playlistId", "Id of the playlist"),
            ("songName", "Exact title of the song to remove"),
        ])
    }

    async fn execute(&self, params: Value) -> anyhow::Result<ToolResult> {
        const ACTION: &str = "deleting song";
        let args = string_param(&params, "playlistId")
            .and_then(|id| Ok((id, string_param(&params, "songName")?)));
        let (playlist_id, song) = match args {
            Ok(args) => args,
            Err(msg) => return Ok(missing(ACTION, &msg)),
        };
        Ok(ToolResult::from_result(
            self.api.delete_song(&playlist_id, &song).await,
            ACTION,
        ))
    }
}
