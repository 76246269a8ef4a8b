//! Templated-background image composer
//!
//! Renders the quote over a background through the OG image service, then
//! re-hosts the bytes on a short-lived file host so the platform can fetch
//! them by URL.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;

use crate::config::ComposeConfig;
use crate::error::{PlatformError, Result};
use crate::imaging::ImageComposer;

/// How long the temporary host keeps the rendered image
const RETENTION: &str = "1h";

pub struct OgComposer {
    client: reqwest::Client,
    render_url: String,
    upload_url: String,
}

impl OgComposer {
    pub fn new(config: &ComposeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PlatformError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            render_url: config.render_url.clone(),
            upload_url: config.upload_url.clone(),
        })
    }

    /// Override both endpoints (used with mock servers)
    pub fn with_urls(mut self, render_url: impl Into<String>, upload_url: impl Into<String>) -> Self {
        self.render_url = render_url.into();
        self.upload_url = upload_url.into();
        self
    }

    async fn render(&self, text: &str, background_url: &str, font: &str) -> Result<Vec<u8>> {
        let clean_text = text.replace(['\r', '\n'], " ");
        let clean_text = clean_text.trim();

        let response = self
            .client
            .get(&self.render_url)
            .query(&[("text", clean_text), ("font", font), ("image", background_url)])
            .send()
            .await
            .map_err(|e| PlatformError::from_transport(e, PlatformError::Generation))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlatformError::Generation(format!("OG image generation failed: {}", status)).into());
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PlatformError::from_transport(e, PlatformError::Generation))?;
        Ok(bytes.to_vec())
    }

    async fn upload(&self, bytes: Vec<u8>) -> Result<String> {
        let file = Part::bytes(bytes)
            .file_name("og-image.png")
            .mime_str("image/png")
            .map_err(|e| PlatformError::Upload(e.to_string()))?;

        let form = Form::new()
            .text("reqtype", "fileupload")
            .text("time", RETENTION)
            .part("fileToUpload", file);

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PlatformError::from_transport(e, PlatformError::Upload))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlatformError::Upload(format!("Upload failed: {}", status)).into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| PlatformError::from_transport(e, PlatformError::Upload))?;
        let url = body.trim();
        if !url.starts_with("http") {
            return Err(PlatformError::Upload(format!("Upload failed: {}", url)).into());
        }

        Ok(url.to_string())
    }
}

#[async_trait]
impl ImageComposer for OgComposer {
    async fn compose(&self, text: &str, background_url: &str, font: &str) -> Result<String> {
        tracing::debug!(background_url, font, "Rendering templated image");
        let bytes = self.render(text, background_url, font).await?;
        self.upload(bytes).await
    }
}
