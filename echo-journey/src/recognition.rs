//! Recognition submission
//!
//! Sends a recorded or uploaded clip to the proxy and turns the reply into
//! either a `Recognized` payload or a reason to show on the capture screen.

use async_trait::async_trait;
use echo_common::models::{Payload, RecognizedSong};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clients::ClientError;

/// Multipart field the proxy reads the clip from
pub const AUDIO_FIELD: &str = "audio";

/// A clip to identify
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: Option<String>,
}

/// Proxy reply for `/api/identify-music`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyReply {
    pub success: bool,
    #[serde(default)]
    pub data: Option<RecognizedSong>,
    #[serde(default)]
    pub error: Option<String>,
}

#[async_trait]
pub trait RecognitionBackend: Send + Sync {
    async fn identify(&self, upload: AudioUpload) -> Result<IdentifyReply, ClientError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionOutcome {
    /// Ready to submit to the controller
    Recognized(Payload),
    /// Shown to the user; the capture screen stays open
    Failed(String),
}

/// Submit one clip. Single request, no retry.
pub async fn submit_recording(
    backend: &dyn RecognitionBackend,
    upload: AudioUpload,
) -> RecognitionOutcome {
    if upload.bytes.is_empty() {
        return RecognitionOutcome::Failed("No audio recorded".to_string());
    }

    let file_name = upload.file_name.clone();
    info!(%file_name, bytes = upload.bytes.len(), "Submitting clip for recognition");

    match backend.identify(upload).await {
        Ok(IdentifyReply {
            success: true,
            data: Some(song),
            ..
        }) => {
            info!(
                title = song.display_title(),
                artist = song.display_artist(),
                "Song recognized"
            );
            RecognitionOutcome::Recognized(Payload::Recognized {
                song,
                file_name: Some(file_name),
            })
        }
        Ok(reply) => RecognitionOutcome::Failed(
            reply
                .error
                .unwrap_or_else(|| "No match found for this clip".to_string()),
        ),
        Err(e) => {
            warn!("Recognition request failed: {}", e);
            RecognitionOutcome::Failed(e.to_string())
        }
    }
}
