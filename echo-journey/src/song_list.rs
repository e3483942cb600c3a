//! Song list loading
//!
//! Searches the catalog for a query, dedupes the result and resolves
//! missing previews through a fallback lookup. Failures never propagate:
//! the list comes back empty and the problem is logged.

use async_trait::async_trait;
use echo_common::models::Song;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clients::ClientError;

/// Tracks requested per search
pub const SEARCH_LIMIT: u32 = 50;

#[async_trait]
pub trait CatalogSearch: Send + Sync {
    async fn search_tracks(
        &self,
        token: &str,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Song>, ClientError>;
}

#[async_trait]
pub trait PreviewLookup: Send + Sync {
    async fn find_preview(&self, title: &str, artist: &str) -> Result<Option<String>, ClientError>;
}

/// Notice shown when no preview can be found for a song
pub fn preview_unavailable_notice(title: &str) -> String {
    format!("Unable to get a preview for {}.", title)
}

/// Drop repeated (title, artist) pairs, keeping the first in input order
pub fn dedup_songs(songs: Vec<Song>) -> Vec<Song> {
    let mut seen = HashSet::new();
    songs
        .into_iter()
        .filter(|song| seen.insert((song.title.clone(), song.artist.clone())))
        .collect()
}

#[derive(Clone)]
pub struct SongListLoader {
    catalog: Arc<dyn CatalogSearch>,
    previews: Arc<dyn PreviewLookup>,
}

impl SongListLoader {
    pub fn new(catalog: Arc<dyn CatalogSearch>, previews: Arc<dyn PreviewLookup>) -> Self {
        Self { catalog, previews }
    }

    /// Search and dedupe; no token means no request
    pub async fn load(&self, token: Option<&str>, query: &str) -> Vec<Song> {
        let Some(token) = token else {
            debug!(%query, "No catalog token; skipping search");
            return Vec::new();
        };

        match self.catalog.search_tracks(token, query, SEARCH_LIMIT).await {
            Ok(songs) => {
                let fetched = songs.len();
                let songs = dedup_songs(songs);
                info!(%query, fetched, unique = songs.len(), "Catalog search finished");
                songs
            }
            Err(e) => {
                warn!(%query, "Catalog search failed: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn resolve_preview(&self, title: &str, artist: &str) -> Option<String> {
        match self.previews.find_preview(title, artist).await {
            Ok(url) => url,
            Err(e) => {
                warn!(%title, "Preview lookup failed: {}", e);
                None
            }
        }
    }
}
