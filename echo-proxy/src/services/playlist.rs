//! Featured playlist lookup
//!
//! Fetches one fixed chart playlist and simplifies its tracks for the
//! `/api/get-playlist` route.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const API_BASE_URL: &str = "https://api.spotify.com";

/// Pop Hits (Top 50) playlist
pub const FEATURED_PLAYLIST_ID: &str = "34NbomaTu7YuOYnky8nLXL";

const USER_AGENT: &str = "echo-proxy/0.1.0";

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Simplified playlist track, as served to the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistTrack {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub popularity: u8,
    pub preview_url: Option<String>,
    pub album_art_url: Option<String>,
}

#[async_trait]
pub trait PlaylistSource: Send + Sync {
    async fn featured_tracks(&self, token: &str) -> Result<Vec<PlaylistTrack>, PlaylistError>;
}

#[derive(Debug, Deserialize)]
struct PlaylistResponse {
    tracks: PlaylistTracks,
}

#[derive(Debug, Deserialize)]
struct PlaylistTracks {
    #[serde(default)]
    items: Vec<PlaylistItem>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    track: Option<RawTrack>,
}

#[derive(Debug, Deserialize)]
struct RawTrack {
    id: Option<String>,
    name: String,
    #[serde(default)]
    artists: Vec<RawArtist>,
    #[serde(default)]
    popularity: u8,
    preview_url: Option<String>,
    album: Option<RawAlbum>,
}

#[derive(Debug, Deserialize)]
struct RawArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawAlbum {
    #[serde(default)]
    images: Vec<RawImage>,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    url: String,
}

/// Keep items that carry a track; first artist and first image only
fn simplify(items: Vec<PlaylistItem>) -> Vec<PlaylistTrack> {
    items
        .into_iter()
        .filter_map(|item| item.track)
        .map(|track| PlaylistTrack {
            id: track.id.unwrap_or_default(),
            name: track.name,
            artist: track
                .artists
                .into_iter()
                .next()
                .map(|a| a.name)
                .unwrap_or_else(|| "Unknown Artist".to_string()),
            popularity: track.popularity,
            preview_url: track.preview_url,
            album_art_url: track
                .album
                .and_then(|a| a.images.into_iter().next())
                .map(|i| i.url),
        })
        .collect()
}

pub struct SpotifyPlaylistClient {
    http_client: reqwest::Client,
    base_url: String,
    playlist_id: String,
}

impl SpotifyPlaylistClient {
    pub fn new() -> Result<Self, PlaylistError> {
        Self::with_base_url(API_BASE_URL, FEATURED_PLAYLIST_ID)
    }

    pub fn with_base_url(base_url: &str, playlist_id: &str) -> Result<Self, PlaylistError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| PlaylistError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            playlist_id: playlist_id.to_string(),
        })
    }
}

#[async_trait]
impl PlaylistSource for SpotifyPlaylistClient {
    async fn featured_tracks(&self, token: &str) -> Result<Vec<PlaylistTrack>, PlaylistError> {
        let url = format!("{}/v1/playlists/{}", self.base_url, self.playlist_id);
        tracing::debug!(%url, "Requesting featured playlist");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| PlaylistError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PlaylistError::ApiError(status.as_u16(), error_text));
        }

        let body: PlaylistResponse = response
            .json()
            .await
            .map_err(|e| PlaylistError::ParseError(e.to_string()))?;

        Ok(simplify(body.tracks.items))
    }
}
