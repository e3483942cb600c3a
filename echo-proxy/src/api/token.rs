//! Catalog token endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{ApiResult, AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// GET /api/get-token
///
/// Returns the cached token, refreshing it first when expired.
pub async fn get_token(State(state): State<AppState>) -> ApiResult<Json<TokenResponse>> {
    info!("Token requested");

    match state.token_cache.get_token().await {
        Ok(access_token) => Ok(Json(TokenResponse { access_token })),
        Err(e) => {
            state.record_error(format!("token: {}", e)).await;
            Err(e.into())
        }
    }
}

pub fn token_routes() -> Router<AppState> {
    Router::new().route("/api/get-token", get(get_token))
}
