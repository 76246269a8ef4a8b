//! Mock image collaborators for testing

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::{PlatformError, Result};
use crate::imaging::{GeneratedImage, ImageComposer, ImageGenerator, ImageHost};

fn push<T>(log: &Arc<Mutex<Vec<T>>>, item: T) -> usize {
    match log.lock() {
        Ok(mut items) => {
            items.push(item);
            items.len()
        }
        Err(_) => 0,
    }
}

fn snapshot<T: Clone>(log: &Arc<Mutex<Vec<T>>>) -> Vec<T> {
    log.lock().map(|items| items.clone()).unwrap_or_default()
}

/// Generator returning a fixed PNG payload, or a configured error
#[derive(Debug, Clone, Default)]
pub struct MockGenerator {
    error: Option<PlatformError>,
    prompts: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with a generation error
    pub fn failing(message: &str) -> Self {
        Self {
            error: Some(PlatformError::Generation(message.to_string())),
            ..Default::default()
        }
    }

    /// `(prompt, model)` pairs received so far
    pub fn requests(&self) -> Vec<(String, String)> {
        snapshot(&self.prompts)
    }
}

#[async_trait]
impl ImageGenerator for MockGenerator {
    async fn generate(&self, prompt: &str, model: &str) -> Result<GeneratedImage> {
        push(&self.prompts, (prompt.to_string(), model.to_string()));
        match &self.error {
            Some(error) => Err(error.clone().into()),
            None => Ok(GeneratedImage {
                mime_type: "image/png".to_string(),
                bytes: b"mock-image".to_vec(),
            }),
        }
    }
}

/// Image host handing out sequential URLs
#[derive(Debug, Clone, Default)]
pub struct MockImageHost {
    error: Option<PlatformError>,
    uploads: Arc<Mutex<Vec<GeneratedImage>>>,
}

impl MockImageHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            error: Some(PlatformError::Upload(message.to_string())),
            ..Default::default()
        }
    }

    pub fn upload_count(&self) -> usize {
        snapshot(&self.uploads).len()
    }
}

#[async_trait]
impl ImageHost for MockImageHost {
    async fn upload(&self, image: &GeneratedImage) -> Result<String> {
        let n = push(&self.uploads, image.clone());
        match &self.error {
            Some(error) => Err(error.clone().into()),
            None => Ok(format!("https://img.mock/{}.png", n)),
        }
    }
}

/// A compose request received by [`MockComposer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeRequest {
    pub text: String,
    pub background_url: String,
    pub font: String,
}

/// Composer handing out sequential URLs
#[derive(Debug, Clone, Default)]
pub struct MockComposer {
    error: Option<PlatformError>,
    requests: Arc<Mutex<Vec<ComposeRequest>>>,
}

impl MockComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            error: Some(PlatformError::Generation(message.to_string())),
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<ComposeRequest> {
        snapshot(&self.requests)
    }
}

#[async_trait]
impl ImageComposer for MockComposer {
    async fn compose(&self, text: &str, background_url: &str, font: &str) -> Result<String> {
        let n = push(
            &self.requests,
            ComposeRequest {
                text: text.to_string(),
                background_url: background_url.to_string(),
                font: font.to_string(),
            },
        );
        match &self.error {
            Some(error) => Err(error.clone().into()),
            None => Ok(format!("https://og.mock/{}.png", n)),
        }
    }
}
