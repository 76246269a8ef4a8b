//! Tick handler and its summary types

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::AutoPostService;
use crate::clock::{to_local, LocalTime};
use crate::schedule::select_due;
use crate::types::PostType;

/// Why a due config did not publish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The page has no publish credential
    NoToken,
    /// No quote is left that no page has used
    NoQuotes,
}

/// Result of one config's pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PostOutcome {
    Success { post_type: PostType, post_id: String },
    Skipped { reason: SkipReason },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostResult {
    pub page_id: String,
    #[serde(flatten)]
    pub outcome: PostOutcome,
}

impl PostResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, PostOutcome::Success { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareSkipReason {
    /// The target page has no credential; the item stays pending
    NoTargetToken,
    /// The item is younger than the minimum share age; it stays pending
    TooRecent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ShareOutcome {
    Shared { shared_post_id: String },
    Skipped { reason: ShareSkipReason },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareResult {
    pub share_id: i64,
    pub source_page_id: String,
    pub target_page_id: String,
    #[serde(flatten)]
    pub outcome: ShareOutcome,
}

/// Everything one tick did, as printed by the trigger surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    /// Number of successful publishes
    pub processed: usize,
    pub results: Vec<PostResult>,
    #[serde(rename = "shareResults")]
    pub share_results: Vec<ShareResult>,
    pub purged_shares: u64,
    pub local_time: LocalTime,
}

impl AutoPostService {
    /// Run one scheduler tick at `now`
    ///
    /// Never fails: storage and collaborator errors are logged and folded
    /// into the per-item results.
    pub async fn run_tick(&self, now: DateTime<Utc>, force: bool) -> TickSummary {
        let local = to_local(now);
        tracing::info!(local_time = %local, force, "Running auto-post tick");

        let purged_shares = if local.is_midnight() {
            match self.db.purge_pending_shares().await {
                Ok(count) => {
                    tracing::info!(count, "Purged pending shares at local midnight");
                    count
                }
                Err(e) => {
                    tracing::error!("Failed to purge pending shares: {}", e);
                    0
                }
            }
        } else {
            0
        };

        let configs = match self.db.list_schedulable_configs().await {
            Ok(configs) => configs,
            Err(e) => {
                tracing::error!("Failed to load page configurations: {}", e);
                Vec::new()
            }
        };

        let due = select_due(configs, local, force);
        tracing::debug!(due = due.len(), "Selected due configs");

        let mut results = Vec::with_capacity(due.len());
        for config in &due {
            results.push(self.process_config(config, now).await);
        }
        let processed = results.iter().filter(|r| r.is_success()).count();

        let share_results = self.process_shares(now, local, force).await;

        tracing::info!(
            processed,
            due = due.len(),
            shares = share_results.len(),
            "Tick complete"
        );

        TickSummary {
            processed,
            results,
            share_results,
            purged_shares,
            local_time: local,
        }
    }
}
