//! Integration tests for echo-proxy API endpoints
//!
//! Upstream APIs are replaced by in-process fakes so every route can be
//! driven through the real router with `oneshot`.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use echo_common::models::RecognizedSong;
use echo_common::time::ManualClock;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use echo_proxy::services::playlist::PlaylistError;
use echo_proxy::services::recognition::RecognitionError;
use echo_proxy::services::spotify_auth::AuthError;
use echo_proxy::services::{
    AudioClip, IssuedToken, PlaylistSource, PlaylistTrack, Recognition, Recognizer, TokenSource,
};
use echo_proxy::token_cache::TokenCache;
use echo_proxy::{build_router, AppState};

// =============================================================================
// Fakes
// =============================================================================

struct FakeTokens {
    calls: AtomicUsize,
    outcome: Result<u64, ()>,
}

#[async_trait]
impl TokenSource for FakeTokens {
    async fn fetch_token(&self) -> Result<IssuedToken, AuthError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.outcome {
            Ok(expires_in) => Ok(IssuedToken {
                access_token: format!("tok-{}", n),
                expires_in,
            }),
            Err(()) => Err(AuthError::MissingCredentials),
        }
    }
}

enum RecognizerMode {
    Match,
    NoMatch,
    Unconfigured,
    Broken,
}

struct FakeRecognizer {
    mode: RecognizerMode,
    seen: Mutex<Vec<AudioClip>>,
}

#[async_trait]
impl Recognizer for FakeRecognizer {
    async fn identify(&self, clip: AudioClip) -> Result<Recognition, RecognitionError> {
        self.seen.lock().unwrap().push(clip);
        match self.mode {
            RecognizerMode::Match => Ok(Recognition::Matched(RecognizedSong {
                title: Some("Warriors".to_string()),
                artist: Some("Imagine Dragons".to_string()),
                album: Some("Warriors".to_string()),
                lyrics: None,
                cover: Some("https://img/cover".to_string()),
                song_link: Some("https://lis.tn/x".to_string()),
            })),
            RecognizerMode::NoMatch => Ok(Recognition::NoMatch("No match found".to_string())),
            RecognizerMode::Unconfigured => Err(RecognitionError::MissingCredential),
            RecognizerMode::Broken => Err(RecognitionError::NetworkError("reset".to_string())),
        }
    }

    fn is_configured(&self) -> bool {
        !matches!(self.mode, RecognizerMode::Unconfigured)
    }
}

struct FakePlaylists {
    tokens_seen: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait]
impl PlaylistSource for FakePlaylists {
    async fn featured_tracks(&self, token: &str) -> Result<Vec<PlaylistTrack>, PlaylistError> {
        self.tokens_seen.lock().unwrap().push(token.to_string());
        if self.fail {
            return Err(PlaylistError::ApiError(404, "gone".to_string()));
        }
        Ok(vec![PlaylistTrack {
            id: "t1".to_string(),
            name: "Song".to_string(),
            artist: "Artist".to_string(),
            popularity: 90,
            preview_url: None,
            album_art_url: Some("https://img/1".to_string()),
        }])
    }
}

struct Harness {
    app: axum::Router,
    clock: ManualClock,
    tokens: Arc<FakeTokens>,
    recognizer: Arc<FakeRecognizer>,
    playlists: Arc<FakePlaylists>,
}

fn harness(token_outcome: Result<u64, ()>, mode: RecognizerMode, playlist_fail: bool) -> Harness {
    let clock = ManualClock::at_epoch();
    let tokens = Arc::new(FakeTokens {
        calls: AtomicUsize::new(0),
        outcome: token_outcome,
    });
    let recognizer = Arc::new(FakeRecognizer {
        mode,
        seen: Mutex::new(Vec::new()),
    });
    let playlists = Arc::new(FakePlaylists {
        tokens_seen: Mutex::new(Vec::new()),
        fail: playlist_fail,
    });

    let cache = Arc::new(TokenCache::new(tokens.clone(), Arc::new(clock.clone())));
    let state = AppState::new(cache, recognizer.clone(), playlists.clone());

    Harness {
        app: build_router(state),
        clock,
        tokens,
        recognizer,
        playlists,
    }
}

fn default_harness() -> Harness {
    harness(Ok(3600), RecognizerMode::Match, false)
}

// =============================================================================
// Helpers
// =============================================================================

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

const BOUNDARY: &str = "echo-test-boundary";

fn multipart_request(field: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: audio/webm\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/identify-music")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// Root and health
// =============================================================================

#[tokio::test]
async fn test_root_banner() {
    let h = default_harness();

    let response = h.app.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], echo_proxy::api::root::BANNER.as_bytes());
}

#[tokio::test]
async fn test_health_endpoint() {
    let h = default_harness();

    let response = h.app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "echo-proxy");
    assert_eq!(body["recognition_configured"], true);
    assert!(body["version"].is_string());
    assert!(body.get("last_error").is_none());
}

// =============================================================================
// /api/get-token
// =============================================================================

#[tokio::test]
async fn test_get_token_returns_access_token() {
    let h = default_harness();

    let response = h.app.oneshot(get("/api/get-token")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["access_token"], "tok-1");
}

#[tokio::test]
async fn test_get_token_is_cached_until_expiry() {
    let h = default_harness();

    let first = json_body(h.app.clone().oneshot(get("/api/get-token")).await.unwrap()).await;
    h.clock.advance(Duration::from_secs(3000));
    let second = json_body(h.app.clone().oneshot(get("/api/get-token")).await.unwrap()).await;
    h.clock.advance(Duration::from_secs(600));
    let third = json_body(h.app.clone().oneshot(get("/api/get-token")).await.unwrap()).await;

    assert_eq!(first["access_token"], "tok-1");
    assert_eq!(second["access_token"], "tok-1");
    assert_eq!(third["access_token"], "tok-2");
    assert_eq!(h.tokens.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_get_token_failure_is_500_with_error_body() {
    let h = harness(Err(()), RecognizerMode::Match, false);

    let response = h.app.clone().oneshot(get("/api/get-token")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(body["error"].is_string());

    // Failure is visible on /health
    let health = json_body(h.app.oneshot(get("/health")).await.unwrap()).await;
    assert!(health["last_error"].as_str().unwrap().starts_with("token:"));
}

// =============================================================================
// /api/identify-music
// =============================================================================

#[tokio::test]
async fn test_identify_success() {
    let h = default_harness();

    let response = h
        .app
        .oneshot(multipart_request("audio", "hum.webm", b"RIFFdata"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["title"], "Warriors");
    assert_eq!(body["data"]["artist"], "Imagine Dragons");
    assert_eq!(body["data"]["song_link"], "https://lis.tn/x");

    let seen = h.recognizer.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].file_name, "hum.webm");
    assert_eq!(seen[0].bytes, b"RIFFdata");
}

#[tokio::test]
async fn test_identify_no_match_is_200_with_error() {
    let h = harness(Ok(3600), RecognizerMode::NoMatch, false);

    let response = h
        .app
        .oneshot(multipart_request("audio", "hum.webm", b"abc"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "No match found");
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_identify_without_audio_field_is_400() {
    let h = default_harness();

    let response = h
        .app
        .oneshot(multipart_request("something_else", "x.webm", b"abc"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "No audio file uploaded");
    assert!(h.recognizer.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_identify_non_multipart_is_400() {
    let h = default_harness();

    let request = Request::builder()
        .method("POST")
        .uri("/api/identify-music")
        .body(Body::empty())
        .unwrap();
    let response = h.app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_identify_missing_credential_is_500() {
    let h = harness(Ok(3600), RecognizerMode::Unconfigured, false);

    let response = h
        .app
        .oneshot(multipart_request("audio", "hum.webm", b"abc"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Recognition API token is not configured");
}

#[tokio::test]
async fn test_identify_upstream_failure_is_500() {
    let h = harness(Ok(3600), RecognizerMode::Broken, false);

    let response = h
        .app
        .oneshot(multipart_request("audio", "hum.webm", b"abc"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// =============================================================================
// /api/get-playlist
// =============================================================================

#[tokio::test]
async fn test_get_playlist_uses_cached_token() {
    let h = default_harness();

    let response = h.app.oneshot(get("/api/get-playlist")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body[0]["name"], "Song");
    assert_eq!(body[0]["album_art_url"], "https://img/1");
    assert_eq!(h.playlists.tokens_seen.lock().unwrap().as_slice(), ["tok-1"]);
}

#[tokio::test]
async fn test_get_playlist_upstream_failure_is_500() {
    let h = harness(Ok(3600), RecognizerMode::Match, true);

    let response = h.app.oneshot(get("/api/get-playlist")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("playlist"));
}

#[tokio::test]
async fn test_cors_headers_present() {
    let h = default_harness();

    let request = Request::builder()
        .uri("/api/get-token")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = h.app.oneshot(request).await.unwrap();

    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
