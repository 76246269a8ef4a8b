//! Publishing platform abstraction
//!
//! A `Publisher` performs exactly one platform write per call and returns
//! the platform's identifier for the created post. The engine only talks to
//! this trait, so tests can swap in [`mock::MockPublisher`].

use async_trait::async_trait;

use crate::error::Result;

pub mod facebook;

// Mock publisher is available for all builds (not just tests) to support integration tests
pub mod mock;

/// Platform write operations used by the auto-post engine
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Create a text post on `page_id`
    ///
    /// `preset_id` selects a decorative background when the platform
    /// supports one.
    async fn create_text_post(
        &self,
        page_id: &str,
        credential: &str,
        message: &str,
        preset_id: Option<&str>,
    ) -> Result<String>;

    /// Create a photo post from a publicly reachable image URL
    async fn create_image_post(
        &self,
        page_id: &str,
        credential: &str,
        image_url: &str,
        caption: &str,
    ) -> Result<String>;

    /// Relay an existing post to `target_page_id` by link
    async fn share_post(
        &self,
        post_id: &str,
        target_page_id: &str,
        target_credential: &str,
    ) -> Result<String>;

    /// Lowercase platform identifier
    fn name(&self) -> &str;
}
