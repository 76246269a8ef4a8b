//! Quotecast - scheduled quote posting for Facebook pages
//!
//! This library holds the auto-post engine: page configuration and the
//! quote pool in SQLite, due-config selection, content generation, the
//! publisher, and the share queue that relays posts to a second page.

pub mod clock;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod imaging;
pub mod logging;
pub mod platforms;
pub mod post_type;
pub mod schedule;
pub mod service;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use db::Database;
pub use error::{QuotecastError, Result};
pub use service::{AutoPostService, TickSummary};
pub use types::{
    AutoPostLogEntry, ImageSource, PageConfig, PostMode, PostType, QuoteItem, ShareMode,
    ShareQueueItem, ShareStatus,
};
