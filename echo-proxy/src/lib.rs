//! echo-proxy library
//!
//! Minimal backend for the journey: hands out a cached catalog token and
//! forwards audio clips to the recognition API.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod token_cache;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::{PlaylistSource, Recognizer};
use crate::token_cache::TokenCache;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub token_cache: Arc<TokenCache>,
    pub recognizer: Arc<dyn Recognizer>,
    pub playlists: Arc<dyn PlaylistSource>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        token_cache: Arc<TokenCache>,
        recognizer: Arc<dyn Recognizer>,
        playlists: Arc<dyn PlaylistSource>,
    ) -> Self {
        Self {
            token_cache,
            recognizer,
            playlists,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Remember the most recent failure for `/health`
    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::root_routes())
        .merge(api::health_routes())
        .merge(api::token_routes())
        .merge(api::identify_routes())
        .merge(api::playlist_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
