//! Root banner

use axum::{routing::get, Router};

use crate::AppState;

pub const BANNER: &str = "ECHO backend proxy is running.";

/// GET /
pub async fn banner() -> &'static str {
    BANNER
}

pub fn root_routes() -> Router<AppState> {
    Router::new().route("/", get(banner))
}
