//! echo-proxy - backend for the ECHO journey
//!
//! - `GET  /api/get-token`      cached catalog client-credentials token
//! - `POST /api/identify-music` recognition relay (multipart `audio`)
//! - `GET  /api/get-playlist`   featured chart playlist
//! - `GET  /health`

use anyhow::Result;
use clap::Parser;
use echo_common::config::load_config_or_default;
use echo_common::time::SystemClock;
use std::sync::Arc;
use tracing::info;

use echo_proxy::config::{ProxyArgs, ProxyConfig};
use echo_proxy::services::{AuddClient, SpotifyAuthClient, SpotifyPlaylistClient};
use echo_proxy::token_cache::TokenCache;
use echo_proxy::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials may live in a local .env next to the binary
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting ECHO proxy (echo-proxy) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = ProxyArgs::parse();
    let toml_config = load_config_or_default(args.config.as_deref());
    let config = ProxyConfig::resolve(&args, &toml_config);
    config.report_credentials();

    let auth_client = SpotifyAuthClient::new(config.spotify.clone())?;
    let token_cache = Arc::new(TokenCache::new(Arc::new(auth_client), Arc::new(SystemClock)));
    let recognizer = Arc::new(AuddClient::new(config.audd_api_token.clone())?);
    let playlists = Arc::new(SpotifyPlaylistClient::new()?);

    let state = AppState::new(token_cache, recognizer, playlists);
    let app = build_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("echo-proxy listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app).await?;

    Ok(())
}
