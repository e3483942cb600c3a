//! Catalog track search

use async_trait::async_trait;
use echo_common::models::Song;
use serde::Deserialize;

use super::{check_status, http_client, ClientError};
use crate::song_list::CatalogSearch;

pub const API_BASE_URL: &str = "https://api.spotify.com";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<TrackPage>,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<TrackItem>,
}

#[derive(Debug, Deserialize)]
struct TrackItem {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    artists: Vec<ArtistItem>,
    album: Option<AlbumItem>,
    preview_url: Option<String>,
    #[serde(default)]
    popularity: u8,
}

#[derive(Debug, Deserialize)]
struct ArtistItem {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AlbumItem {
    #[serde(default)]
    images: Vec<ImageItem>,
}

#[derive(Debug, Deserialize)]
struct ImageItem {
    url: String,
}

impl From<TrackItem> for Song {
    fn from(item: TrackItem) -> Self {
        Song {
            id: item.id.unwrap_or_default(),
            title: item.name,
            artist: item
                .artists
                .into_iter()
                .map(|a| a.name)
                .collect::<Vec<_>>()
                .join(", "),
            cover_url: item
                .album
                .and_then(|a| a.images.into_iter().next())
                .map(|i| i.url),
            preview_url: item.preview_url,
            popularity: item.popularity.min(100),
        }
    }
}

pub struct SpotifyCatalogClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl SpotifyCatalogClient {
    pub fn new() -> Result<Self, ClientError> {
        Self::with_base_url(API_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http_client: http_client(15)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CatalogSearch for SpotifyCatalogClient {
    async fn search_tracks(
        &self,
        token: &str,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Song>, ClientError> {
        let url = format!("{}/v1/search", self.base_url);
        tracing::debug!(%query, limit, "Searching catalog");
        let limit = limit.to_string();

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token)
            .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())])
            .send()
            .await?;

        let body: SearchResponse = check_status(response).await?.json().await?;

        Ok(body
            .tracks
            .map(|page| page.items.into_iter().map(Song::from).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_mapping_joins_artists() {
        let json = r#"{
            "tracks": { "items": [
                {
                    "id": "abc",
                    "name": "Duet",
                    "artists": [ { "name": "One" }, { "name": "Two" } ],
                    "album": { "images": [ { "url": "https://img/640" }, { "url": "https://img/64" } ] },
                    "preview_url": null,
                    "popularity": 83
                },
                { "name": "Bare", "artists": [] }
            ] }
        }"#;
        let body: SearchResponse = serde_json::from_str(json).unwrap();
        let songs: Vec<Song> = body.tracks.unwrap().items.into_iter().map(Song::from).collect();

        assert_eq!(songs[0].artist, "One, Two");
        assert_eq!(songs[0].cover_url.as_deref(), Some("https://img/640"));
        assert_eq!(songs[0].popularity, 83);
        assert_eq!(songs[1].id, "");
        assert_eq!(songs[1].artist, "");
        assert_eq!(songs[1].cover_url, None);
    }
}
