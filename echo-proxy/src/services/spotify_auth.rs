//! Catalog client-credentials exchange
//!
//! Trades the server's client id and secret for a short-lived access token
//! at the accounts endpoint.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const USER_AGENT: &str = "echo-proxy/0.1.0";

/// Token exchange errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Client id or secret not configured")]
    MissingCredentials,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Token as issued by the provider
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssuedToken {
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: u64,
}

/// Anything that can issue a fresh catalog token
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self) -> Result<IssuedToken, AuthError>;
}

/// Client id / secret pair
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Client-credentials flow against the accounts service
pub struct SpotifyAuthClient {
    http_client: reqwest::Client,
    credentials: Option<ClientCredentials>,
    token_url: String,
}

impl SpotifyAuthClient {
    pub fn new(credentials: Option<ClientCredentials>) -> Result<Self, AuthError> {
        Self::with_token_url(credentials, TOKEN_URL)
    }

    /// Point the client at a different accounts endpoint
    pub fn with_token_url(
        credentials: Option<ClientCredentials>,
        token_url: &str,
    ) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            credentials,
            token_url: token_url.to_string(),
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }
}

#[async_trait]
impl TokenSource for SpotifyAuthClient {
    async fn fetch_token(&self) -> Result<IssuedToken, AuthError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(AuthError::MissingCredentials)?;

        tracing::debug!(url = %self.token_url, "Requesting client-credentials token");

        let response = self
            .http_client
            .post(&self.token_url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AuthError::ApiError(status.as_u16(), error_text));
        }

        response
            .json::<IssuedToken>()
            .await
            .map_err(|e| AuthError::ParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_credentials_short_circuits() {
        let client = SpotifyAuthClient::new(None).unwrap();
        assert!(!client.has_credentials());

        let result = client.fetch_token().await;
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }

    #[test]
    fn test_issued_token_parses_provider_shape() {
        let json = r#"{"access_token":"abc","token_type":"Bearer","expires_in":3600}"#;
        let token: IssuedToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.expires_in, 3600);
    }
}
