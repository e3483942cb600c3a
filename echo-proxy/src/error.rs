//! Error types for echo-proxy
//!
//! Every failure becomes a JSON body of the form `{"error": "..."}` so the
//! browser side can show the reason without parsing status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::recognition::RecognitionError;
use crate::services::spotify_auth::AuthError;
use crate::services::playlist::PlaylistError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Server credential missing (500)
    #[error("{0}")]
    MissingCredential(String),

    /// Third-party API failed (500)
    #[error("{0}")]
    Upstream(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingCredential(_) | ApiError::Upstream(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => {
                ApiError::MissingCredential("Catalog credentials are not configured".to_string())
            }
            other => ApiError::Upstream(format!("Unable to obtain catalog token: {}", other)),
        }
    }
}

impl From<RecognitionError> for ApiError {
    fn from(err: RecognitionError) -> Self {
        match err {
            RecognitionError::MissingCredential => ApiError::MissingCredential(
                "Recognition API token is not configured".to_string(),
            ),
            other => ApiError::Upstream(format!("Recognition failed: {}", other)),
        }
    }
}

impl From<PlaylistError> for ApiError {
    fn from(err: PlaylistError) -> Self {
        ApiError::Upstream(format!("Unable to fetch playlist: {}", err))
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
