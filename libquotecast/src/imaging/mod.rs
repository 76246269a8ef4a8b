//! Image collaborators for image posts
//!
//! Two strategies produce a publicly reachable image URL:
//!
//! - generated: an [`ImageGenerator`] renders the picture from a prompt and
//!   an [`ImageHost`] publishes the bytes
//! - templated background: an [`ImageComposer`] lays the text over a
//!   background and returns a hosted URL directly

use async_trait::async_trait;

use crate::error::Result;

pub mod freeimage;
pub mod gemini;
pub mod og;
pub mod prompt;

// Mocks are available for all builds to support integration tests
pub mod mock;

/// Raw image returned by a generation model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Text-to-image model
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Render one image for `prompt`; zero returned images is an error
    async fn generate(&self, prompt: &str, model: &str) -> Result<GeneratedImage>;
}

/// Public image hosting
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Upload `image` and return its public URL
    async fn upload(&self, image: &GeneratedImage) -> Result<String>;
}

/// Text-over-background image service
#[async_trait]
pub trait ImageComposer: Send + Sync {
    /// Compose `text` over `background_url` with `font`; returns a hosted URL
    async fn compose(&self, text: &str, background_url: &str, font: &str) -> Result<String>;
}
