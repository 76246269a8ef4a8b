//! Mock publisher for testing
//!
//! Records every call and hands out predictable post ids. Failures can be
//! configured separately for posts and shares so tests can drive each
//! branch of the engine without network access.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{PlatformError, Result};
use crate::platforms::Publisher;

/// A call received by [`MockPublisher`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishCall {
    Text {
        page_id: String,
        credential: String,
        message: String,
        preset_id: Option<String>,
    },
    Image {
        page_id: String,
        credential: String,
        image_url: String,
        caption: String,
    },
    Share {
        post_id: String,
        target_page_id: String,
        target_credential: String,
    },
}

/// Configuration for mock publisher behavior
#[derive(Debug, Clone, Default)]
pub struct MockPublisherConfig {
    /// Error returned by text and image posts
    pub post_error: Option<PlatformError>,

    /// Error returned by shares
    pub share_error: Option<PlatformError>,
}

/// Mock publisher; clones share the same call log
#[derive(Debug, Clone, Default)]
pub struct MockPublisher {
    config: MockPublisherConfig,
    calls: Arc<Mutex<Vec<PublishCall>>>,
    sequence: Arc<AtomicUsize>,
}

impl MockPublisher {
    /// A publisher where every call succeeds
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MockPublisherConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Posts fail with a posting error; shares still succeed
    pub fn post_failure(error: &str) -> Self {
        Self::with_config(MockPublisherConfig {
            post_error: Some(PlatformError::Posting(error.to_string())),
            ..Default::default()
        })
    }

    /// Shares fail with a posting error; posts still succeed
    pub fn share_failure(error: &str) -> Self {
        Self::with_config(MockPublisherConfig {
            share_error: Some(PlatformError::Posting(error.to_string())),
            ..Default::default()
        })
    }

    /// All calls received so far, in order
    pub fn calls(&self) -> Vec<PublishCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of text and image post calls
    pub fn post_call_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| !matches!(c, PublishCall::Share { .. }))
            .count()
    }

    /// Number of share calls
    pub fn share_call_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, PublishCall::Share { .. }))
            .count()
    }

    fn record(&self, call: PublishCall) -> usize {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    async fn create_text_post(
        &self,
        page_id: &str,
        credential: &str,
        message: &str,
        preset_id: Option<&str>,
    ) -> Result<String> {
        let n = self.record(PublishCall::Text {
            page_id: page_id.to_string(),
            credential: credential.to_string(),
            message: message.to_string(),
            preset_id: preset_id.map(str::to_string),
        });

        match &self.config.post_error {
            Some(error) => Err(error.clone().into()),
            None => Ok(format!("{}_{}", page_id, n)),
        }
    }

    async fn create_image_post(
        &self,
        page_id: &str,
        credential: &str,
        image_url: &str,
        caption: &str,
    ) -> Result<String> {
        let n = self.record(PublishCall::Image {
            page_id: page_id.to_string(),
            credential: credential.to_string(),
            image_url: image_url.to_string(),
            caption: caption.to_string(),
        });

        match &self.config.post_error {
            Some(error) => Err(error.clone().into()),
            None => Ok(format!("{}_{}", page_id, n)),
        }
    }

    async fn share_post(
        &self,
        post_id: &str,
        target_page_id: &str,
        target_credential: &str,
    ) -> Result<String> {
        let n = self.record(PublishCall::Share {
            post_id: post_id.to_string(),
            target_page_id: target_page_id.to_string(),
            target_credential: target_credential.to_string(),
        });

        match &self.config.share_error {
            Some(error) => Err(error.clone().into()),
            None => Ok(format!("{}_share{}", target_page_id, n)),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
