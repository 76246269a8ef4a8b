//! Auto-post engine
//!
//! `AutoPostService` is the single entry point for the scheduler. One call
//! to [`AutoPostService::run_tick`] performs, in order:
//!
//! 1. the midnight purge of pending shares
//! 2. due-config selection and the per-config publish pipeline
//! 3. share queue processing
//!
//! Configs are processed sequentially. Quote selection has no atomic claim,
//! so two configs must never publish concurrently.
//!
//! # Example
//!
//! ```no_run
//! use libquotecast::service::AutoPostService;
//! use libquotecast::Config;
//!
//! # async fn example() -> libquotecast::Result<()> {
//! let config = Config::load()?;
//! let service = AutoPostService::from_config(&config).await?;
//!
//! let summary = service.run_tick(chrono::Utc::now(), false).await;
//! println!("Published {} posts", summary.processed);
//! # Ok(())
//! # }
//! ```

mod pipeline;
mod share;
mod tick;

pub use tick::{
    PostOutcome, PostResult, ShareOutcome, ShareResult, ShareSkipReason, SkipReason, TickSummary,
};

use std::sync::Arc;

use crate::config::{Config, SchedulerConfig};
use crate::content::{ContentDefaults, ContentGenerator};
use crate::imaging::freeimage::FreeImageHost;
use crate::imaging::gemini::GeminiGenerator;
use crate::imaging::og::OgComposer;
use crate::platforms::facebook::FacebookPublisher;
use crate::platforms::Publisher;
use crate::{Database, Result};

/// Scheduler engine over one database and one set of collaborators
pub struct AutoPostService {
    db: Database,
    publisher: Arc<dyn Publisher>,
    content: ContentGenerator,
    min_share_age_secs: i64,
}

impl AutoPostService {
    /// Build the engine with the HTTP collaborators described by `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated, or if
    /// an HTTP client cannot be constructed.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let db = Database::new(&config.database.path).await?;

        let publisher = Arc::new(FacebookPublisher::new(&config.facebook)?);
        let content = ContentGenerator::new(
            Arc::new(GeminiGenerator::new(&config.generation)?),
            Arc::new(FreeImageHost::new(&config.image_host)?),
            Arc::new(OgComposer::new(&config.compose)?),
        )
        .with_defaults(ContentDefaults::from(config));

        Ok(Self::new(db, publisher, content)
            .with_min_share_age(config.scheduler.min_share_age_secs))
    }

    /// Build the engine from explicit parts (used by tests with mocks)
    pub fn new(db: Database, publisher: Arc<dyn Publisher>, content: ContentGenerator) -> Self {
        Self {
            db,
            publisher,
            content,
            min_share_age_secs: SchedulerConfig::default().min_share_age_secs,
        }
    }

    /// Share items younger than `secs` wait for a later matching minute
    pub fn with_min_share_age(mut self, secs: i64) -> Self {
        self.min_share_age_secs = secs;
        self
    }

    pub fn db(&self) -> &Database {
        &self.db
    }
}
