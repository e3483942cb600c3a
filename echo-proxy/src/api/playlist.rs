//! Featured playlist endpoint

use axum::{extract::State, routing::get, Json, Router};
use tracing::{error, info};

use crate::services::PlaylistTrack;
use crate::{ApiResult, AppState};

/// GET /api/get-playlist
pub async fn get_playlist(State(state): State<AppState>) -> ApiResult<Json<Vec<PlaylistTrack>>> {
    info!("Featured playlist requested");

    let token = match state.token_cache.get_token().await {
        Ok(token) => token,
        Err(e) => {
            state.record_error(format!("playlist token: {}", e)).await;
            return Err(e.into());
        }
    };

    match state.playlists.featured_tracks(&token).await {
        Ok(tracks) => {
            info!(count = tracks.len(), "Featured playlist fetched");
            Ok(Json(tracks))
        }
        Err(e) => {
            error!("Featured playlist fetch failed: {}", e);
            state.record_error(format!("playlist: {}", e)).await;
            Err(e.into())
        }
    }
}

pub fn playlist_routes() -> Router<AppState> {
    Router::new().route("/api/get-playlist", get(get_playlist))
}
