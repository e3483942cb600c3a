//! Song recognition endpoint
//!
//! Accepts a multipart upload with an `audio` field and relays it to the
//! recognizer. A clip the provider cannot match is still a 200; only a
//! missing file (400) or a server-side problem (500) is an HTTP error.

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use echo_common::models::RecognizedSong;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::services::{AudioClip, Recognition};
use crate::{ApiError, ApiResult, AppState};

/// Multipart field carrying the clip
pub const AUDIO_FIELD: &str = "audio";

/// Largest accepted upload (10 MiB)
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<RecognizedSong>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Pull the `audio` field out of the form; other fields are skipped
async fn read_audio_field(multipart: &mut Multipart) -> ApiResult<Option<AudioClip>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed upload: {}", e)))?
    {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| "recording.webm".to_string());
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Malformed upload: {}", e)))?;

        if bytes.is_empty() {
            return Ok(None);
        }

        return Ok(Some(AudioClip {
            bytes: bytes.to_vec(),
            file_name,
            content_type,
        }));
    }

    Ok(None)
}

/// POST /api/identify-music
pub async fn identify_music(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<IdentifyResponse>> {
    let mut multipart = multipart.map_err(|e| {
        warn!("Rejected non-multipart recognition request: {}", e);
        ApiError::BadRequest("No audio file uploaded".to_string())
    })?;

    let clip = read_audio_field(&mut multipart)
        .await?
        .ok_or_else(|| ApiError::BadRequest("No audio file uploaded".to_string()))?;

    info!(
        file_name = %clip.file_name,
        bytes = clip.bytes.len(),
        "Recognition requested"
    );

    match state.recognizer.identify(clip).await {
        Ok(Recognition::Matched(song)) => Ok(Json(IdentifyResponse {
            success: true,
            data: Some(song),
            error: None,
        })),
        Ok(Recognition::NoMatch(reason)) => Ok(Json(IdentifyResponse {
            success: false,
            data: None,
            error: Some(reason),
        })),
        Err(e) => {
            error!("Recognition failed: {}", e);
            state.record_error(format!("recognition: {}", e)).await;
            Err(e.into())
        }
    }
}

pub fn identify_routes() -> Router<AppState> {
    Router::new().route(
        "/api/identify-music",
        post(identify_music).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
    )
}
