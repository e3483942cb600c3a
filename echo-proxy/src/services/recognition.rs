//! Song recognition client
//!
//! Forwards an uploaded clip to the AudD recognition API and reduces the
//! answer to the flat metadata the journey shows on its result screen.

use async_trait::async_trait;
use echo_common::models::RecognizedSong;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const AUDD_BASE_URL: &str = "https://api.audd.io/";
const USER_AGENT: &str = "echo-proxy/0.1.0";

/// Recognition client errors
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("Recognition API token not configured")]
    MissingCredential,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// An uploaded audio clip
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: Option<String>,
}

/// Outcome of a recognition attempt that reached the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recognition {
    Matched(RecognizedSong),
    /// Provider answered but found nothing; carries the reason shown to the user
    NoMatch(String),
}

/// Anything that can identify a clip
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn identify(&self, clip: AudioClip) -> Result<Recognition, RecognitionError>;

    fn is_configured(&self) -> bool {
        true
    }
}

/// AudD response envelope
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuddResponse {
    pub status: String,
    pub result: Option<AuddResult>,
    pub error: Option<AuddErrorBody>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuddErrorBody {
    pub error_code: Option<i64>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuddResult {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub album: Option<String>,
    pub song_link: Option<String>,
    pub lyrics: Option<AuddLyrics>,
    pub spotify: Option<AuddSpotify>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuddLyrics {
    pub lyrics: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuddSpotify {
    pub album: Option<AuddAlbum>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuddAlbum {
    #[serde(default)]
    pub images: Vec<AuddImage>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuddImage {
    pub url: String,
}

impl AuddResponse {
    /// Reduce the provider envelope to a recognition outcome
    pub fn into_recognition(self) -> Recognition {
        if self.status != "success" {
            let reason = self
                .error
                .and_then(|e| e.error_message)
                .unwrap_or_else(|| "Recognition service returned an error".to_string());
            return Recognition::NoMatch(reason);
        }

        match self.result {
            Some(result) => Recognition::Matched(RecognizedSong {
                title: result.title,
                artist: result.artist,
                album: result.album,
                lyrics: result.lyrics.and_then(|l| l.lyrics),
                cover: result
                    .spotify
                    .and_then(|s| s.album)
                    .and_then(|a| a.images.into_iter().next())
                    .map(|i| i.url),
                song_link: result.song_link,
            }),
            None => Recognition::NoMatch("No match found for this clip".to_string()),
        }
    }
}

/// AudD API client
pub struct AuddClient {
    http_client: reqwest::Client,
    api_token: Option<String>,
    base_url: String,
}

impl AuddClient {
    pub fn new(api_token: Option<String>) -> Result<Self, RecognitionError> {
        Self::with_base_url(api_token, AUDD_BASE_URL)
    }

    pub fn with_base_url(
        api_token: Option<String>,
        base_url: &str,
    ) -> Result<Self, RecognitionError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RecognitionError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            api_token,
            base_url: base_url.to_string(),
        })
    }
}

#[async_trait]
impl Recognizer for AuddClient {
    async fn identify(&self, clip: AudioClip) -> Result<Recognition, RecognitionError> {
        let api_token = self
            .api_token
            .as_ref()
            .ok_or(RecognitionError::MissingCredential)?;

        tracing::debug!(
            file_name = %clip.file_name,
            bytes = clip.bytes.len(),
            "Submitting clip for recognition"
        );

        let mut part = reqwest::multipart::Part::bytes(clip.bytes).file_name(clip.file_name);
        if let Some(content_type) = clip.content_type.as_deref() {
            part = part
                .mime_str(content_type)
                .map_err(|e| RecognitionError::ParseError(e.to_string()))?;
        }

        let form = reqwest::multipart::Form::new()
            .text("api_token", api_token.clone())
            .text("return", "lyrics,spotify")
            .part("file", part);

        let response = self
            .http_client
            .post(&self.base_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RecognitionError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RecognitionError::ApiError(status.as_u16(), error_text));
        }

        let body: AuddResponse = response
            .json()
            .await
            .map_err(|e| RecognitionError::ParseError(e.to_string()))?;

        let recognition = body.into_recognition();
        match &recognition {
            Recognition::Matched(song) => tracing::info!(
                title = song.display_title(),
                artist = song.display_artist(),
                "Clip recognized"
            ),
            Recognition::NoMatch(reason) => tracing::info!(%reason, "Clip not recognized"),
        }

        Ok(recognition)
    }

    fn is_configured(&self) -> bool {
        self.api_token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_match_is_flattened() {
        let json = r#"{
            "status": "success",
            "result": {
                "artist": "Imagine Dragons",
                "title": "Warriors",
                "album": "Warriors",
                "release_date": "2014-09-18",
                "song_link": "https://lis.tn/Warriors",
                "lyrics": { "lyrics": "As a child you would wait" },
                "spotify": { "album": { "images": [ { "url": "https://i.scdn.co/640" }, { "url": "https://i.scdn.co/300" } ] } }
            }
        }"#;
        let response: AuddResponse = serde_json::from_str(json).unwrap();

        let Recognition::Matched(song) = response.into_recognition() else {
            panic!("expected a match");
        };
        assert_eq!(song.title.as_deref(), Some("Warriors"));
        assert_eq!(song.artist.as_deref(), Some("Imagine Dragons"));
        assert_eq!(song.lyrics.as_deref(), Some("As a child you would wait"));
        assert_eq!(song.cover.as_deref(), Some("https://i.scdn.co/640"));
        assert_eq!(song.song_link.as_deref(), Some("https://lis.tn/Warriors"));
    }

    #[test]
    fn test_null_result_is_no_match() {
        let response: AuddResponse =
            serde_json::from_str(r#"{"status":"success","result":null}"#).unwrap();
        assert!(matches!(response.into_recognition(), Recognition::NoMatch(_)));
    }

    #[test]
    fn test_provider_error_message_is_kept() {
        let json = r#"{"status":"error","error":{"error_code":901,"error_message":"Recognition failed: too short"}}"#;
        let response: AuddResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.into_recognition(),
            Recognition::NoMatch("Recognition failed: too short".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_token_short_circuits() {
        let client = AuddClient::new(None).unwrap();
        assert!(!client.is_configured());

        let result = client
            .identify(AudioClip {
                bytes: vec![0u8; 16],
                file_name: "clip.webm".to_string(),
                content_type: None,
            })
            .await;
        assert!(matches!(result, Err(RecognitionError::MissingCredential)));
    }
}
