//! Gemini image generation client

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use crate::config::GenerationConfig;
use crate::error::{PlatformError, Result};
use crate::imaging::{GeneratedImage, ImageGenerator};

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: Option<String>,
}

/// Client for the `generateContent` endpoint with image output
pub struct GeminiGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl GeminiGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PlatformError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            api_key: config
                .api_key
                .clone()
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
        })
    }

    /// Point the client at a different API root (used with mock servers)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl ImageGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str, model: &str) -> Result<GeneratedImage> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            PlatformError::Authentication("generation.api_key is not configured".to_string())
        })?;

        let payload = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseModalities": ["IMAGE", "TEXT"] },
        });

        tracing::debug!(model, prompt_len = prompt.len(), "Requesting image generation");

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, model))
            .header("x-goog-api-key", api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| PlatformError::from_transport(e, PlatformError::Generation))?;

        let status = response.status();
        if !status.is_success() {
            let message = format!("Gemini API error: {}", status);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    PlatformError::Authentication(message)
                }
                StatusCode::TOO_MANY_REQUESTS => PlatformError::RateLimit(message),
                _ => PlatformError::Generation(message),
            }
            .into());
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::Generation(format!("invalid response body: {}", e)))?;

        let inline = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .into_iter()
            .flat_map(|content| content.parts)
            .filter_map(|part| part.inline_data)
            .find(|data| data.data.as_deref().is_some_and(|d| !d.is_empty()))
            .ok_or_else(|| PlatformError::Generation("No image generated".to_string()))?;

        let bytes = STANDARD
            .decode(inline.data.unwrap_or_default())
            .map_err(|e| PlatformError::Generation(format!("invalid image payload: {}", e)))?;

        Ok(GeneratedImage {
            mime_type: inline.mime_type.unwrap_or_else(|| "image/png".to_string()),
            bytes,
        })
    }
}
