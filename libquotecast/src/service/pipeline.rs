//! Per-config publish pipeline

use chrono::{DateTime, Utc};
use tracing::Instrument;

use super::tick::{PostOutcome, PostResult, SkipReason};
use super::AutoPostService;
use crate::content::next_preset;
use crate::error::Result;
use crate::post_type::next_post_type;
use crate::types::{AutoPostLogEntry, PageConfig, PostType, QuoteItem, ShareQueueItem};

impl AutoPostService {
    /// Run the pipeline for one due config
    ///
    /// Errors stop at this boundary: they become a `failed` result and a
    /// failed log entry, and the caller moves on to the next config. Rows
    /// written here are stamped with the tick's `now`.
    pub(crate) async fn process_config(
        &self,
        config: &PageConfig,
        now: DateTime<Utc>,
    ) -> PostResult {
        let span = tracing::info_span!("auto_post", page_id = %config.page_id);
        let outcome = self.run_pipeline(config, now.timestamp()).instrument(span).await;
        PostResult {
            page_id: config.page_id.clone(),
            outcome,
        }
    }

    async fn run_pipeline(&self, config: &PageConfig, now: i64) -> PostOutcome {
        let Some(credential) = config.credential.as_deref() else {
            tracing::info!("Skipping: no publish credential");
            return PostOutcome::Skipped {
                reason: SkipReason::NoToken,
            };
        };

        let Some(mode) = config.post_mode else {
            return self.fail(config, None, None, "page has no post mode", now).await;
        };

        let quote = match self.db.latest_unused_quote().await {
            Ok(Some(quote)) => quote,
            Ok(None) => {
                tracing::info!("Skipping: no unused quotes");
                return PostOutcome::Skipped {
                    reason: SkipReason::NoQuotes,
                };
            }
            Err(e) => return self.fail(config, None, None, &e.to_string(), now).await,
        };

        let post_type = next_post_type(mode, config.last_post_type);
        tracing::debug!(%post_type, quote_id = quote.id, "Publishing");

        let post_id = match self.publish(config, credential, post_type, &quote).await {
            Ok(post_id) => post_id,
            Err(e) => {
                return self
                    .fail(config, Some(post_type), Some(&quote.text), &e.to_string(), now)
                    .await
            }
        };

        let entry =
            AutoPostLogEntry::success(&config.page_id, post_type, &quote.text, &post_id, now);
        if let Err(e) = self
            .db
            .commit_publish(&config.page_id, post_type, quote.id, &entry)
            .await
        {
            tracing::error!(%post_id, "Published but failed to record the post: {}", e);
            return PostOutcome::Failed {
                error: format!("published {} but failed to record it: {}", post_id, e),
            };
        }

        if let Some(target) = config
            .share_target_page_id
            .as_deref()
            .filter(|_| config.should_enqueue_share(post_type))
        {
            let item = ShareQueueItem::pending(&config.page_id, target, &post_id, post_type, now);
            match self.db.enqueue_share(&item).await {
                Ok(share_id) => tracing::debug!(share_id, target_page_id = target, "Queued share"),
                Err(e) => tracing::warn!(target_page_id = target, "Failed to queue share: {}", e),
            }
        }

        tracing::info!(%post_type, %post_id, "Published");
        PostOutcome::Success { post_type, post_id }
    }

    /// Exactly one platform write for the chosen post type
    async fn publish(
        &self,
        config: &PageConfig,
        credential: &str,
        post_type: PostType,
        quote: &QuoteItem,
    ) -> Result<String> {
        match post_type {
            PostType::Text => {
                let preset = next_preset(&config.color);
                if let Some(choice) = &preset {
                    // Advanced before publishing so failures do not stall the rotation
                    self.db
                        .update_color_preset_index(&config.page_id, choice.next_index)
                        .await?;
                }
                self.publisher
                    .create_text_post(
                        &config.page_id,
                        credential,
                        &quote.text,
                        preset.as_ref().map(|p| p.preset_id.as_str()),
                    )
                    .await
            }
            PostType::Image => {
                let image_url = self.content.image_url(config, &quote.text).await?;
                self.publisher
                    .create_image_post(&config.page_id, credential, &image_url, &quote.text)
                    .await
            }
        }
    }

    async fn fail(
        &self,
        config: &PageConfig,
        post_type: Option<PostType>,
        quote_text: Option<&str>,
        error: &str,
        now: i64,
    ) -> PostOutcome {
        tracing::warn!(post_type = ?post_type, "Auto-post failed: {}", error);

        let entry = AutoPostLogEntry::failure(&config.page_id, post_type, quote_text, error, now);
        if let Err(e) = self.db.insert_log(&entry).await {
            tracing::error!("Failed to write failure log entry: {}", e);
        }

        PostOutcome::Failed {
            error: error.to_string(),
        }
    }
}
