//! Database operations for Quotecast

use sqlx::sqlite::{SqliteConnection, SqlitePool, SqliteRow};
use sqlx::Row;
use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

use crate::error::{DbError, Result};
use crate::schedule::{format_minutes, parse_minutes};
use crate::types::{
    AutoPostLogEntry, ColorPresets, ImageSettings, LogStatus, PageConfig, PostType, QuoteItem,
    ShareQueueItem, ShareStatus, WorkingHours,
};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(db_path: &str) -> Result<Self> {
        // Expand path and create parent directories
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(DbError::IoError)?;
        }

        // mode=rwc creates the file on first use
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(DbError::SqlxError)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DbError::MigrationError)?;

        Ok(Self { pool })
    }

    /// Access the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ------------------------------------------------------------------
    // Page settings
    // ------------------------------------------------------------------

    /// Insert or replace a page configuration
    pub async fn upsert_page_config(&self, config: &PageConfig) -> Result<()> {
        let presets = if config.color.presets.is_empty() {
            None
        } else {
            Some(config.color.presets.join(","))
        };

        sqlx::query(
            r#"
            INSERT INTO page_settings (
                page_id, page_name, enabled, schedule_minutes, working_hours_start,
                working_hours_end, post_mode, last_post_type, credential, image_source,
                og_background_url, og_font, ai_model, ai_resolution, image_aspect_ratio,
                image_prompt, color_bg, color_presets, color_preset_index,
                share_target_page_id, share_mode, share_schedule_minutes, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(page_id) DO UPDATE SET
                page_name = excluded.page_name,
                enabled = excluded.enabled,
                schedule_minutes = excluded.schedule_minutes,
                working_hours_start = excluded.working_hours_start,
                working_hours_end = excluded.working_hours_end,
                post_mode = excluded.post_mode,
                last_post_type = excluded.last_post_type,
                credential = excluded.credential,
                image_source = excluded.image_source,
                og_background_url = excluded.og_background_url,
                og_font = excluded.og_font,
                ai_model = excluded.ai_model,
                ai_resolution = excluded.ai_resolution,
                image_aspect_ratio = excluded.image_aspect_ratio,
                image_prompt = excluded.image_prompt,
                color_bg = excluded.color_bg,
                color_presets = excluded.color_presets,
                color_preset_index = excluded.color_preset_index,
                share_target_page_id = excluded.share_target_page_id,
                share_mode = excluded.share_mode,
                share_schedule_minutes = excluded.share_schedule_minutes,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&config.page_id)
        .bind(&config.page_name)
        .bind(config.enabled)
        .bind(config.schedule_minutes.as_ref().map(format_minutes))
        .bind(i64::from(config.working_hours.start))
        .bind(i64::from(config.working_hours.end))
        .bind(config.post_mode.map(|m| m.as_str()))
        .bind(config.last_post_type.map(|t| t.as_str()))
        .bind(&config.credential)
        .bind(config.image.source.as_str())
        .bind(&config.image.background_url)
        .bind(&config.image.font)
        .bind(&config.image.model)
        .bind(&config.image.resolution)
        .bind(&config.image.aspect_ratio)
        .bind(&config.image.prompt_template)
        .bind(config.color.enabled)
        .bind(presets)
        .bind(i64::from(config.color.index))
        .bind(&config.share_target_page_id)
        .bind(config.share_mode.as_str())
        .bind(config.share_schedule_minutes.as_ref().map(format_minutes))
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Get a page configuration by page ID
    pub async fn get_page_config(&self, page_id: &str) -> Result<Option<PageConfig>> {
        let row = sqlx::query("SELECT * FROM page_settings WHERE page_id = ?")
            .bind(page_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(row.as_ref().map(page_config_from_row))
    }

    /// All page configurations, ordered by page ID
    pub async fn list_page_configs(&self) -> Result<Vec<PageConfig>> {
        let rows = sqlx::query("SELECT * FROM page_settings ORDER BY page_id")
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(rows.iter().map(page_config_from_row).collect())
    }

    /// Enabled configurations that have a post mode
    pub async fn list_schedulable_configs(&self) -> Result<Vec<PageConfig>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM page_settings
            WHERE enabled = 1 AND post_mode IS NOT NULL
            ORDER BY page_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(rows
            .iter()
            .map(page_config_from_row)
            .filter(|config| config.post_mode.is_some())
            .collect())
    }

    /// Persist the rotating preset index
    pub async fn update_color_preset_index(&self, page_id: &str, index: u32) -> Result<()> {
        sqlx::query("UPDATE page_settings SET color_preset_index = ?, updated_at = ? WHERE page_id = ?")
            .bind(i64::from(index))
            .bind(chrono::Utc::now().timestamp())
            .bind(page_id)
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Store the publish credential for a page, creating a disabled row if needed
    pub async fn set_credential(&self, page_id: &str, credential: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO page_settings (page_id, credential, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(page_id) DO UPDATE SET
                credential = excluded.credential,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(page_id)
        .bind(credential)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Quotes
    // ------------------------------------------------------------------

    /// Add an unused quote created now
    pub async fn add_quote(&self, text: &str) -> Result<i64> {
        self.insert_quote(text, chrono::Utc::now().timestamp()).await
    }

    /// Add an unused quote with an explicit creation time
    pub async fn insert_quote(&self, text: &str, created_at: i64) -> Result<i64> {
        let result = sqlx::query("INSERT INTO quotes (text, consumed_by, created_at) VALUES (?, '[]', ?)")
            .bind(text)
            .bind(created_at)
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(result.last_insert_rowid())
    }

    /// Get a quote by ID
    pub async fn get_quote(&self, id: i64) -> Result<Option<QuoteItem>> {
        let row = sqlx::query("SELECT id, text, consumed_by, created_at FROM quotes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(row.as_ref().map(quote_from_row))
    }

    /// Most recently created quote that no page has used
    ///
    /// Equal creation times resolve to the later insert.
    pub async fn latest_unused_quote(&self) -> Result<Option<QuoteItem>> {
        let row = sqlx::query(
            r#"
            SELECT id, text, consumed_by, created_at FROM quotes
            WHERE json_array_length(consumed_by) = 0
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(row.as_ref().map(quote_from_row))
    }

    /// Count quotes that no page has used
    pub async fn count_unused_quotes(&self) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM quotes WHERE json_array_length(consumed_by) = 0")
                .fetch_one(&self.pool)
                .await
                .map_err(DbError::SqlxError)?;

        Ok(count)
    }

    /// Append `page_id` to a quote's consumers
    pub async fn mark_quote_consumed(&self, quote_id: i64, page_id: &str) -> Result<()> {
        let mut conn = self.pool.acquire().await.map_err(DbError::SqlxError)?;
        mark_quote_consumed_on(&mut conn, quote_id, page_id).await
    }

    // ------------------------------------------------------------------
    // Auto-post log
    // ------------------------------------------------------------------

    /// Append a log entry
    pub async fn insert_log(&self, entry: &AutoPostLogEntry) -> Result<i64> {
        let mut conn = self.pool.acquire().await.map_err(DbError::SqlxError)?;
        insert_log_on(&mut conn, entry).await
    }

    /// Most recent log entries first
    pub async fn recent_logs(&self, page_id: Option<&str>, limit: usize) -> Result<Vec<AutoPostLogEntry>> {
        let rows = match page_id {
            Some(page) => {
                sqlx::query(
                    r#"
                    SELECT * FROM auto_post_logs WHERE page_id = ?
                    ORDER BY created_at DESC, id DESC LIMIT ?
                    "#,
                )
                .bind(page)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query("SELECT * FROM auto_post_logs ORDER BY created_at DESC, id DESC LIMIT ?")
                    .bind(limit as i64)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(DbError::SqlxError)?;

        Ok(rows.iter().map(log_from_row).collect())
    }

    /// Record a successful publish: post type, quote consumption and log
    /// entry are written in one transaction.
    pub async fn commit_publish(
        &self,
        page_id: &str,
        post_type: PostType,
        quote_id: i64,
        entry: &AutoPostLogEntry,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(DbError::SqlxError)?;

        sqlx::query("UPDATE page_settings SET last_post_type = ?, updated_at = ? WHERE page_id = ?")
            .bind(post_type.as_str())
            .bind(chrono::Utc::now().timestamp())
            .bind(page_id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::SqlxError)?;

        mark_quote_consumed_on(&mut tx, quote_id, page_id).await?;
        insert_log_on(&mut tx, entry).await?;

        tx.commit().await.map_err(DbError::SqlxError)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Share queue
    // ------------------------------------------------------------------

    /// Queue a relay
    pub async fn enqueue_share(&self, item: &ShareQueueItem) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO share_queue (source_page_id, target_page_id, platform_post_id, post_type, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.source_page_id)
        .bind(&item.target_page_id)
        .bind(&item.platform_post_id)
        .bind(item.post_type.as_str())
        .bind(item.status.as_str())
        .bind(item.created_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(result.last_insert_rowid())
    }

    /// Distinct source pages with at least one pending item
    pub async fn pending_share_sources(&self) -> Result<Vec<String>> {
        let sources: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT source_page_id FROM share_queue WHERE status = 'pending' ORDER BY source_page_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(sources)
    }

    /// Oldest pending item for a source page
    pub async fn oldest_pending_share(&self, source_page_id: &str) -> Result<Option<ShareQueueItem>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM share_queue
            WHERE status = 'pending' AND source_page_id = ?
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(source_page_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(row.as_ref().map(share_from_row))
    }

    /// Share items, optionally filtered by status, oldest first
    pub async fn list_shares(&self, status: Option<ShareStatus>) -> Result<Vec<ShareQueueItem>> {
        let rows = match status {
            Some(status) => {
                sqlx::query("SELECT * FROM share_queue WHERE status = ? ORDER BY created_at ASC, id ASC")
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query("SELECT * FROM share_queue ORDER BY created_at ASC, id ASC")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(DbError::SqlxError)?;

        Ok(rows.iter().map(share_from_row).collect())
    }

    /// Get a share item by ID
    pub async fn get_share(&self, id: i64) -> Result<Option<ShareQueueItem>> {
        let row = sqlx::query("SELECT * FROM share_queue WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(row.as_ref().map(share_from_row))
    }

    /// Terminal success for a pending item
    pub async fn mark_share_shared(&self, id: i64, shared_post_id: &str, shared_at: i64) -> Result<()> {
        sqlx::query(
            "UPDATE share_queue SET status = 'shared', shared_post_id = ?, shared_at = ? WHERE id = ? AND status = 'pending'",
        )
        .bind(shared_post_id)
        .bind(shared_at)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Terminal failure for a pending item
    pub async fn mark_share_failed(&self, id: i64, error_message: &str) -> Result<()> {
        sqlx::query(
            "UPDATE share_queue SET status = 'failed', error_message = ? WHERE id = ? AND status = 'pending'",
        )
        .bind(error_message)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Remove every pending item; returns how many were removed
    pub async fn purge_pending_shares(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM share_queue WHERE status = 'pending'")
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected())
    }
}

async fn mark_quote_consumed_on(conn: &mut SqliteConnection, quote_id: i64, page_id: &str) -> Result<()> {
    let current: Option<String> = sqlx::query_scalar("SELECT consumed_by FROM quotes WHERE id = ?")
        .bind(quote_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(DbError::SqlxError)?;

    let Some(current) = current else {
        return Err(DbError::SqlxError(sqlx::Error::RowNotFound).into());
    };

    let mut consumed = parse_consumed_by(&current);
    consumed.insert(page_id.to_string());

    sqlx::query("UPDATE quotes SET consumed_by = ? WHERE id = ?")
        .bind(encode_consumed_by(&consumed))
        .bind(quote_id)
        .execute(&mut *conn)
        .await
        .map_err(DbError::SqlxError)?;

    Ok(())
}

async fn insert_log_on(conn: &mut SqliteConnection, entry: &AutoPostLogEntry) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO auto_post_logs (page_id, post_type, quote_text, status, platform_post_id, error_message, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&entry.page_id)
    .bind(entry.post_type.map(|t| t.as_str()))
    .bind(&entry.quote_text)
    .bind(entry.status.as_str())
    .bind(&entry.platform_post_id)
    .bind(&entry.error_message)
    .bind(entry.created_at)
    .execute(&mut *conn)
    .await
    .map_err(DbError::SqlxError)?;

    Ok(result.last_insert_rowid())
}

fn parse_consumed_by(raw: &str) -> BTreeSet<String> {
    serde_json::from_str::<Vec<String>>(raw)
        .map(|pages| pages.into_iter().collect())
        .unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed consumed_by value {:?}: {}", raw, e);
            BTreeSet::new()
        })
}

fn encode_consumed_by(pages: &BTreeSet<String>) -> String {
    serde_json::to_string(pages).unwrap_or_else(|_| "[]".to_string())
}

/// Parse an optional enum column, dropping unknown values with a warning
fn parse_column<T: FromStr<Err = String>>(value: Option<String>, column: &str) -> Option<T> {
    let value = value?;
    if value.trim().is_empty() {
        return None;
    }
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("Ignoring {} value: {}", column, e);
            None
        }
    }
}

fn hour_column(value: Option<i64>, default: u8) -> u8 {
    value.map(|h| h.clamp(0, 24) as u8).unwrap_or(default)
}

fn page_config_from_row(r: &SqliteRow) -> PageConfig {
    let defaults = WorkingHours::default();
    let presets: Option<String> = r.get("color_presets");

    PageConfig {
        page_id: r.get("page_id"),
        page_name: r.get("page_name"),
        enabled: r.get::<i64, _>("enabled") != 0,
        schedule_minutes: r
            .get::<Option<String>, _>("schedule_minutes")
            .map(|raw| parse_minutes(&raw)),
        working_hours: WorkingHours {
            start: hour_column(r.get("working_hours_start"), defaults.start),
            end: hour_column(r.get("working_hours_end"), defaults.end),
        },
        post_mode: parse_column(r.get("post_mode"), "post_mode"),
        last_post_type: parse_column(r.get("last_post_type"), "last_post_type"),
        credential: r
            .get::<Option<String>, _>("credential")
            .filter(|token| !token.trim().is_empty()),
        image: ImageSettings {
            source: parse_column(r.get("image_source"), "image_source").unwrap_or_default(),
            model: r.get("ai_model"),
            resolution: r.get("ai_resolution"),
            aspect_ratio: r.get("image_aspect_ratio"),
            prompt_template: r.get("image_prompt"),
            background_url: r.get("og_background_url"),
            font: r.get("og_font"),
        },
        color: ColorPresets {
            enabled: r.get::<i64, _>("color_bg") != 0,
            presets: presets
                .map(|raw| {
                    raw.split(',')
                        .map(|p| p.trim().to_string())
                        .filter(|p| !p.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            index: r.get::<i64, _>("color_preset_index").max(0) as u32,
        },
        share_target_page_id: r
            .get::<Option<String>, _>("share_target_page_id")
            .filter(|id| !id.trim().is_empty()),
        share_mode: parse_column(r.get("share_mode"), "share_mode").unwrap_or_default(),
        share_schedule_minutes: r
            .get::<Option<String>, _>("share_schedule_minutes")
            .map(|raw| parse_minutes(&raw)),
    }
}

fn quote_from_row(r: &SqliteRow) -> QuoteItem {
    QuoteItem {
        id: r.get("id"),
        text: r.get("text"),
        consumed_by: parse_consumed_by(&r.get::<String, _>("consumed_by")),
        created_at: r.get("created_at"),
    }
}

fn log_from_row(r: &SqliteRow) -> AutoPostLogEntry {
    AutoPostLogEntry {
        id: r.get("id"),
        page_id: r.get("page_id"),
        post_type: parse_column(r.get("post_type"), "post_type"),
        quote_text: r.get("quote_text"),
        status: match r.get::<String, _>("status").as_str() {
            "success" => LogStatus::Success,
            _ => LogStatus::Failed,
        },
        platform_post_id: r.get("platform_post_id"),
        error_message: r.get("error_message"),
        created_at: r.get("created_at"),
    }
}

fn share_from_row(r: &SqliteRow) -> ShareQueueItem {
    ShareQueueItem {
        id: r.get("id"),
        source_page_id: r.get("source_page_id"),
        target_page_id: r.get("target_page_id"),
        platform_post_id: r.get("platform_post_id"),
        post_type: parse_column(r.get("post_type"), "post_type").unwrap_or(PostType::Text),
        status: r
            .get::<String, _>("status")
            .parse()
            .unwrap_or(ShareStatus::Failed),
        created_at: r.get("created_at"),
        shared_post_id: r.get("shared_post_id"),
        shared_at: r.get("shared_at"),
        error_message: r.get("error_message"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuotecastError;
    use crate::types::{PostMode, ShareMode};
    use tempfile::TempDir;

    async fn setup_db() -> (Database, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Database::new(db_path.to_str().unwrap()).await.unwrap();
        (db, temp_dir)
    }

    fn sample_config(page_id: &str) -> PageConfig {
        let mut config = PageConfig::new(page_id);
        config.page_name = Some("Daily Quotes".to_string());
        config.enabled = true;
        config.post_mode = Some(PostMode::Alternate);
        config.schedule_minutes = Some(parse_minutes("0,30"));
        config.credential = Some("token-abc".to_string());
        config.color = ColorPresets {
            enabled: true,
            presets: vec!["111".to_string(), "222".to_string()],
            index: 1,
        };
        config.share_target_page_id = Some("page-b".to_string());
        config.share_mode = ShareMode::ImageOnly;
        config.share_schedule_minutes = Some(parse_minutes("10"));
        config
    }

    #[tokio::test]
    async fn test_database_initialization_with_invalid_path() {
        #[cfg(unix)]
        let invalid_path = "/tmp/test\0invalid.db";

        #[cfg(windows)]
        let invalid_path = "C:\\invalid<>path\\test.db";

        let result = Database::new(invalid_path).await;
        assert!(matches!(result, Err(QuotecastError::Database(_))));
    }

    #[tokio::test]
    async fn test_page_config_round_trip() {
        let (db, _temp_dir) = setup_db().await;
        let config = sample_config("page-a");
        db.upsert_page_config(&config).await.unwrap();

        let loaded = db.get_page_config("page-a").await.unwrap().unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_unset_columns_load_as_defaults() {
        let (db, _temp_dir) = setup_db().await;
        db.set_credential("page-x", "tok").await.unwrap();

        let loaded = db.get_page_config("page-x").await.unwrap().unwrap();
        assert!(!loaded.enabled);
        assert_eq!(loaded.schedule_minutes, None);
        assert_eq!(loaded.working_hours, WorkingHours::default());
        assert_eq!(loaded.post_mode, None);
        assert_eq!(loaded.share_mode, ShareMode::Both);
        assert_eq!(loaded.credential.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_unknown_post_mode_is_not_schedulable() {
        let (db, _temp_dir) = setup_db().await;
        db.upsert_page_config(&sample_config("page-a")).await.unwrap();
        sqlx::query("UPDATE page_settings SET post_mode = 'video' WHERE page_id = 'page-a'")
            .execute(db.pool())
            .await
            .unwrap();

        assert!(db.list_schedulable_configs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_schedulable_configs_filter() {
        let (db, _temp_dir) = setup_db().await;
        db.upsert_page_config(&sample_config("page-a")).await.unwrap();

        let mut disabled = sample_config("page-b");
        disabled.enabled = false;
        db.upsert_page_config(&disabled).await.unwrap();

        let mut no_mode = sample_config("page-c");
        no_mode.post_mode = None;
        db.upsert_page_config(&no_mode).await.unwrap();

        let configs = db.list_schedulable_configs().await.unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].page_id, "page-a");
    }

    #[tokio::test]
    async fn test_latest_unused_quote_prefers_newest() {
        let (db, _temp_dir) = setup_db().await;
        db.insert_quote("old", 100).await.unwrap();
        let newest = db.insert_quote("new", 200).await.unwrap();
        db.insert_quote("middle", 150).await.unwrap();

        let quote = db.latest_unused_quote().await.unwrap().unwrap();
        assert_eq!(quote.id, newest);
        assert_eq!(quote.text, "new");
    }

    #[tokio::test]
    async fn test_latest_unused_quote_tie_breaks_on_insert_order() {
        let (db, _temp_dir) = setup_db().await;
        db.insert_quote("first", 100).await.unwrap();
        let second = db.insert_quote("second", 100).await.unwrap();

        let quote = db.latest_unused_quote().await.unwrap().unwrap();
        assert_eq!(quote.id, second);
    }

    #[tokio::test]
    async fn test_consumed_quote_is_not_eligible() {
        let (db, _temp_dir) = setup_db().await;
        let used = db.insert_quote("used", 200).await.unwrap();
        let fresh = db.insert_quote("fresh", 100).await.unwrap();

        db.mark_quote_consumed(used, "page-a").await.unwrap();

        let quote = db.latest_unused_quote().await.unwrap().unwrap();
        assert_eq!(quote.id, fresh);
        assert_eq!(db.count_unused_quotes().await.unwrap(), 1);

        let used_quote = db.get_quote(used).await.unwrap().unwrap();
        assert!(used_quote.consumed_by.contains("page-a"));
    }

    #[tokio::test]
    async fn test_mark_quote_consumed_is_a_set() {
        let (db, _temp_dir) = setup_db().await;
        let id = db.add_quote("quote").await.unwrap();
        db.mark_quote_consumed(id, "page-a").await.unwrap();
        db.mark_quote_consumed(id, "page-a").await.unwrap();
        db.mark_quote_consumed(id, "page-b").await.unwrap();

        let quote = db.get_quote(id).await.unwrap().unwrap();
        assert_eq!(quote.consumed_by.len(), 2);
    }

    #[tokio::test]
    async fn test_mark_missing_quote_fails() {
        let (db, _temp_dir) = setup_db().await;
        assert!(db.mark_quote_consumed(999, "page-a").await.is_err());
    }

    #[tokio::test]
    async fn test_commit_publish_writes_all_three() {
        let (db, _temp_dir) = setup_db().await;
        db.upsert_page_config(&sample_config("page-a")).await.unwrap();
        let quote_id = db.add_quote("Be kind").await.unwrap();

        let entry = AutoPostLogEntry::success("page-a", PostType::Image, "Be kind", "fb_1", 100);
        db.commit_publish("page-a", PostType::Image, quote_id, &entry)
            .await
            .unwrap();

        let config = db.get_page_config("page-a").await.unwrap().unwrap();
        assert_eq!(config.last_post_type, Some(PostType::Image));

        let quote = db.get_quote(quote_id).await.unwrap().unwrap();
        assert!(quote.consumed_by.contains("page-a"));

        let logs = db.recent_logs(Some("page-a"), 10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, LogStatus::Success);
        assert_eq!(logs[0].platform_post_id.as_deref(), Some("fb_1"));
    }

    #[tokio::test]
    async fn test_commit_publish_rolls_back_on_missing_quote() {
        let (db, _temp_dir) = setup_db().await;
        db.upsert_page_config(&sample_config("page-a")).await.unwrap();

        let entry = AutoPostLogEntry::success("page-a", PostType::Text, "gone", "fb_2", 100);
        let result = db.commit_publish("page-a", PostType::Text, 42, &entry).await;
        assert!(result.is_err());

        let config = db.get_page_config("page-a").await.unwrap().unwrap();
        assert_eq!(config.last_post_type, None);
        assert!(db.recent_logs(None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recent_logs_filter_and_order() {
        let (db, _temp_dir) = setup_db().await;
        let first = AutoPostLogEntry::failure("page-a", None, None, "boom", 10);
        let second = AutoPostLogEntry::success("page-a", PostType::Text, "q", "fb", 20);
        let other = AutoPostLogEntry::success("page-b", PostType::Text, "q", "fb", 30);

        db.insert_log(&first).await.unwrap();
        db.insert_log(&second).await.unwrap();
        db.insert_log(&other).await.unwrap();

        let logs = db.recent_logs(Some("page-a"), 10).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].status, LogStatus::Success);
        assert_eq!(logs[1].error_message.as_deref(), Some("boom"));
        assert_eq!(logs[1].post_type, None);

        assert_eq!(db.recent_logs(None, 1).await.unwrap()[0].page_id, "page-b");
    }

    #[tokio::test]
    async fn test_share_queue_fifo_per_source() {
        let (db, _temp_dir) = setup_db().await;

        let newer = ShareQueueItem::pending("page-a", "page-b", "fb_2", PostType::Text, 200);
        let older = ShareQueueItem::pending("page-a", "page-b", "fb_1", PostType::Image, 100);
        let other = ShareQueueItem::pending("page-c", "page-b", "fb_3", PostType::Text, 50);

        db.enqueue_share(&newer).await.unwrap();
        db.enqueue_share(&older).await.unwrap();
        db.enqueue_share(&other).await.unwrap();

        assert_eq!(
            db.pending_share_sources().await.unwrap(),
            vec!["page-a".to_string(), "page-c".to_string()]
        );

        let head = db.oldest_pending_share("page-a").await.unwrap().unwrap();
        assert_eq!(head.platform_post_id, "fb_1");
        assert_eq!(head.post_type, PostType::Image);
    }

    #[tokio::test]
    async fn test_share_terminal_states() {
        let (db, _temp_dir) = setup_db().await;
        let shared = db
            .enqueue_share(&ShareQueueItem::pending("page-a", "page-b", "fb_1", PostType::Text, 100))
            .await
            .unwrap();
        let failed = db
            .enqueue_share(&ShareQueueItem::pending("page-a", "page-b", "fb_2", PostType::Text, 100))
            .await
            .unwrap();

        db.mark_share_shared(shared, "fb_shared", 1234).await.unwrap();
        db.mark_share_failed(failed, "token expired").await.unwrap();

        let item = db.get_share(shared).await.unwrap().unwrap();
        assert_eq!(item.status, ShareStatus::Shared);
        assert_eq!(item.shared_post_id.as_deref(), Some("fb_shared"));
        assert_eq!(item.shared_at, Some(1234));

        let item = db.get_share(failed).await.unwrap().unwrap();
        assert_eq!(item.status, ShareStatus::Failed);
        assert_eq!(item.error_message.as_deref(), Some("token expired"));

        // Terminal rows do not go back to another state
        db.mark_share_shared(failed, "late", 99).await.unwrap();
        let item = db.get_share(failed).await.unwrap().unwrap();
        assert_eq!(item.status, ShareStatus::Failed);

        assert!(db.pending_share_sources().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_purge_only_removes_pending() {
        let (db, _temp_dir) = setup_db().await;
        let done = db
            .enqueue_share(&ShareQueueItem::pending("page-a", "page-b", "fb_1", PostType::Text, 100))
            .await
            .unwrap();
        db.mark_share_shared(done, "fb_s", 1).await.unwrap();
        db.enqueue_share(&ShareQueueItem::pending("page-a", "page-b", "fb_2", PostType::Text, 100))
            .await
            .unwrap();
        db.enqueue_share(&ShareQueueItem::pending("page-c", "page-d", "fb_3", PostType::Image, 100))
            .await
            .unwrap();

        assert_eq!(db.purge_pending_shares().await.unwrap(), 2);
        assert!(db.list_shares(Some(ShareStatus::Pending)).await.unwrap().is_empty());
        assert_eq!(db.list_shares(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_color_preset_index() {
        let (db, _temp_dir) = setup_db().await;
        db.upsert_page_config(&sample_config("page-a")).await.unwrap();
        db.update_color_preset_index("page-a", 0).await.unwrap();

        let config = db.get_page_config("page-a").await.unwrap().unwrap();
        assert_eq!(config.color.index, 0);
    }
}
