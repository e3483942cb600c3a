//! Preview fallback lookup
//!
//! Many catalog tracks carry no preview. The public iTunes search often
//! has a 30 second clip for the same song.

use async_trait::async_trait;
use serde::Deserialize;

use super::{check_status, http_client, ClientError};
use crate::song_list::PreviewLookup;

pub const ITUNES_SEARCH_URL: &str = "https://itunes.apple.com/search";

#[derive(Debug, Deserialize)]
struct ItunesResponse {
    #[serde(default)]
    results: Vec<ItunesResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItunesResult {
    preview_url: Option<String>,
}

pub struct ItunesPreviewClient {
    http_client: reqwest::Client,
    search_url: String,
}

impl ItunesPreviewClient {
    pub fn new() -> Result<Self, ClientError> {
        Self::with_search_url(ITUNES_SEARCH_URL)
    }

    pub fn with_search_url(search_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http_client: http_client(10)?,
            search_url: search_url.to_string(),
        })
    }
}

#[async_trait]
impl PreviewLookup for ItunesPreviewClient {
    async fn find_preview(&self, title: &str, artist: &str) -> Result<Option<String>, ClientError> {
        let term = format!("{} {}", title, artist);

        let response = self
            .http_client
            .get(&self.search_url)
            .query(&[("term", term.as_str()), ("media", "music"), ("limit", "1")])
            .send()
            .await?;

        let body: ItunesResponse = check_status(response).await?.json().await?;
        Ok(body.results.into_iter().next().and_then(|r| r.preview_url))
    }
}
