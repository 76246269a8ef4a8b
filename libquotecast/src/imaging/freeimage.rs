//! freeimage.host upload client

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::multipart::Form;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use crate::config::ImageHostConfig;
use crate::error::{PlatformError, Result};
use crate::imaging::{GeneratedImage, ImageHost};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    image: Option<UploadedImage>,
}

#[derive(Debug, Deserialize)]
struct UploadedImage {
    url: Option<String>,
}

pub struct FreeImageHost {
    client: reqwest::Client,
    upload_url: String,
    api_key: Option<SecretString>,
}

impl FreeImageHost {
    pub fn new(config: &ImageHostConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PlatformError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            upload_url: config.upload_url.clone(),
            api_key: config
                .api_key
                .clone()
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
        })
    }

    /// Override the upload endpoint (used with mock servers)
    pub fn with_upload_url(mut self, url: impl Into<String>) -> Self {
        self.upload_url = url.into();
        self
    }
}

#[async_trait]
impl ImageHost for FreeImageHost {
    async fn upload(&self, image: &GeneratedImage) -> Result<String> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            PlatformError::Authentication("image_host.api_key is not configured".to_string())
        })?;

        let form = Form::new()
            .text("key", api_key.expose_secret().to_string())
            .text("source", STANDARD.encode(&image.bytes))
            .text("format", "json");

        tracing::debug!(size = image.bytes.len(), mime = %image.mime_type, "Uploading image");

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PlatformError::from_transport(e, PlatformError::Upload))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlatformError::Upload(format!("Image upload failed: {}", status)).into());
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::Upload(format!("invalid response body: {}", e)))?;

        body.image
            .and_then(|image| image.url)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| PlatformError::Upload("No URL returned from image host".to_string()).into())
    }
}
