//! Client for the echo-proxy backend

use async_trait::async_trait;

use super::{check_status, http_client, ClientError};
use crate::journey::TokenProvider;
use crate::recognition::{AudioUpload, IdentifyReply, RecognitionBackend, AUDIO_FIELD};

pub const DEFAULT_PROXY_URL: &str = "http://localhost:3001";

#[derive(Debug, serde::Deserialize)]
struct TokenReply {
    access_token: Option<String>,
}

pub struct ProxyClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http_client: http_client(30)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TokenProvider for ProxyClient {
    async fn access_token(&self) -> Result<String, ClientError> {
        let url = format!("{}/api/get-token", self.base_url);
        let response = self.http_client.get(&url).send().await?;
        let reply: TokenReply = check_status(response).await?.json().await?;

        reply
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::ParseError("reply has no access_token".to_string()))
    }
}

#[async_trait]
impl RecognitionBackend for ProxyClient {
    async fn identify(&self, upload: AudioUpload) -> Result<IdentifyReply, ClientError> {
        let url = format!("{}/api/identify-music", self.base_url);

        let mut part = reqwest::multipart::Part::bytes(upload.bytes).file_name(upload.file_name);
        if let Some(content_type) = upload.content_type.as_deref() {
            part = part
                .mime_str(content_type)
                .map_err(|e| ClientError::ParseError(e.to_string()))?;
        }
        let form = reqwest::multipart::Form::new().part(AUDIO_FIELD, part);

        let response = self.http_client.post(&url).multipart(form).send().await?;

        // Failures still carry an `{error}` body worth showing
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or(body);
            return Err(ClientError::ApiError(status.as_u16(), message));
        }

        Ok(response.json().await?)
    }
}
