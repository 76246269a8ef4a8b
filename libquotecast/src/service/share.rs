//! Share queue processing

use chrono::{DateTime, Utc};

use super::tick::{ShareOutcome, ShareResult, ShareSkipReason};
use super::AutoPostService;
use crate::clock::LocalTime;
use crate::schedule::share_minute_matches;
use crate::types::ShareQueueItem;

impl AutoPostService {
    /// Relay at most one pending item per source page
    ///
    /// Items are taken strictly oldest first per source. A skipped item
    /// stays pending and keeps blocking the ones behind it.
    pub(crate) async fn process_shares(
        &self,
        now: DateTime<Utc>,
        local: LocalTime,
        force: bool,
    ) -> Vec<ShareResult> {
        let sources = match self.db.pending_share_sources().await {
            Ok(sources) => sources,
            Err(e) => {
                tracing::error!("Failed to load pending share sources: {}", e);
                return Vec::new();
            }
        };

        let mut results = Vec::new();
        for source in sources {
            match self.process_source(&source, now, local, force).await {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(e) => tracing::error!(source_page_id = %source, "Share processing failed: {}", e),
            }
        }
        results
    }

    async fn process_source(
        &self,
        source: &str,
        now: DateTime<Utc>,
        local: LocalTime,
        force: bool,
    ) -> crate::Result<Option<ShareResult>> {
        let source_config = self.db.get_page_config(source).await?;
        let minutes = source_config
            .as_ref()
            .and_then(|c| c.share_schedule_minutes.as_ref());
        if !share_minute_matches(minutes, local, force) {
            return Ok(None);
        }

        let Some(item) = self.db.oldest_pending_share(source).await? else {
            return Ok(None);
        };
        let Some(share_id) = item.id else {
            return Ok(None);
        };

        let age = now.timestamp() - item.created_at;
        if !force && age < self.min_share_age_secs {
            tracing::debug!(share_id, age, "Share too recent, waiting for next cycle");
            return Ok(Some(skipped(share_id, &item, ShareSkipReason::TooRecent)));
        }

        let target_credential = self
            .db
            .get_page_config(&item.target_page_id)
            .await?
            .and_then(|c| c.credential);
        let Some(target_credential) = target_credential else {
            tracing::info!(share_id, target_page_id = %item.target_page_id, "Skipping share: target has no credential");
            return Ok(Some(skipped(share_id, &item, ShareSkipReason::NoTargetToken)));
        };

        let outcome = match self
            .publisher
            .share_post(&item.platform_post_id, &item.target_page_id, &target_credential)
            .await
        {
            Ok(shared_post_id) => {
                match self
                    .db
                    .mark_share_shared(share_id, &shared_post_id, now.timestamp())
                    .await
                {
                    Ok(()) => {
                        tracing::info!(share_id, %shared_post_id, "Shared post");
                        ShareOutcome::Shared { shared_post_id }
                    }
                    Err(e) => self.record_unrecorded_share(share_id, &shared_post_id, e).await,
                }
            }
            Err(e) => {
                let error = e.to_string();
                self.db.mark_share_failed(share_id, &error).await?;
                tracing::warn!(share_id, "Share failed: {}", error);
                ShareOutcome::Failed { error }
            }
        };

        Ok(Some(ShareResult {
            share_id,
            source_page_id: item.source_page_id,
            target_page_id: item.target_page_id,
            outcome,
        }))
    }

    /// The relay went out but the row could not be marked shared
    ///
    /// The item is closed as failed so the next matching minute does not
    /// relay the same post a second time.
    async fn record_unrecorded_share(
        &self,
        share_id: i64,
        shared_post_id: &str,
        cause: crate::QuotecastError,
    ) -> ShareOutcome {
        tracing::error!(share_id, %shared_post_id, "Shared but failed to record it: {}", cause);

        let error = format!("shared as {} but failed to record it: {}", shared_post_id, cause);
        if let Err(e) = self.db.mark_share_failed(share_id, &error).await {
            tracing::error!(share_id, %shared_post_id, "Failed to close share item: {}", e);
        }
        ShareOutcome::Failed { error }
    }
}

fn skipped(share_id: i64, item: &ShareQueueItem, reason: ShareSkipReason) -> ShareResult {
    ShareResult {
        share_id,
        source_page_id: item.source_page_id.clone(),
        target_page_id: item.target_page_id.clone(),
        outcome: ShareOutcome::Skipped { reason },
    }
}
