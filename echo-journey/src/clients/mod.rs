//! HTTP clients for the services the journey talks to
//!
//! Every client keeps its base URL injectable so tests can point it at a
//! local server.

pub mod itunes_preview;
pub mod proxy_client;
pub mod spotify_catalog;
pub mod weather;

pub use itunes_preview::ItunesPreviewClient;
pub use proxy_client::ProxyClient;
pub use spotify_catalog::SpotifyCatalogClient;
pub use weather::{WeatherClient, WeatherReport};

use thiserror::Error;

/// Errors shared by the journey's HTTP clients
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0} is not configured")]
    MissingCredential(&'static str),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::ParseError(err.to_string())
        } else {
            ClientError::NetworkError(err.to_string())
        }
    }
}

pub(crate) const USER_AGENT: &str = concat!("echo-journey/", env!("CARGO_PKG_VERSION"));

pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ClientError::NetworkError(e.to_string()))
}

/// Turn a non-2xx response into `ApiError`
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::ApiError(status.as_u16(), body))
}
