//! Integration tests for quote-send

use assert_cmd::Command;
use libquotecast::schedule::parse_minutes;
use libquotecast::{Database, PageConfig, PostMode};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to escape path for TOML on Windows
fn escape_path_for_toml(path: &str) -> String {
    path.replace('\\', "\\\\")
}

/// Write a config pointing at a fresh database and `api_base`
async fn setup_test_env(api_base: &str) -> (TempDir, String, Database) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    let db_path = temp_dir.path().join("quotecast.db");

    let config_content = format!(
        r#"
[database]
path = "{}"

[facebook]
api_base = "{}"
timeout_secs = 5
"#,
        escape_path_for_toml(&db_path.to_string_lossy()),
        api_base
    );
    fs::write(&config_path, config_content).unwrap();

    let db = Database::new(db_path.to_str().unwrap()).await.unwrap();

    (temp_dir, config_path.to_string_lossy().to_string(), db)
}

fn quote_send(config_path: &str) -> Command {
    let mut cmd = Command::cargo_bin("quote-send").unwrap();
    cmd.env("QUOTECAST_CONFIG", config_path)
        .env_remove("QUOTECAST_DB_PATH")
        .env_remove("RUST_LOG");
    cmd
}

async fn seed_text_page(db: &Database) {
    let mut config = PageConfig::new("page-1");
    config.enabled = true;
    config.post_mode = Some(PostMode::Text);
    config.schedule_minutes = Some(parse_minutes("15"));
    config.credential = Some("page-token".to_string());
    db.upsert_page_config(&config).await.unwrap();
    db.insert_quote("Small steps every day", 100).await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_once_with_empty_database() {
    let (_temp_dir, config_path, _db) = setup_test_env("http://127.0.0.1:9").await;

    quote_send(&config_path)
        .arg("--once")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"processed\": 0"))
        .stdout(predicate::str::contains("\"shareResults\": []"))
        .stderr(predicate::str::contains("quote-send starting"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_config_exits_with_config_code() {
    let temp_dir = TempDir::new().unwrap();
    let invalid_config = temp_dir.path().join("invalid.toml");
    fs::write(&invalid_config, "invalid toml content [[[").unwrap();

    quote_send(invalid_config.to_str().unwrap())
        .arg("--once")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Configuration error"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_once_publishes_due_page() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/page-1/feed"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "page-1_999"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (_temp_dir, config_path, db) = setup_test_env(&server.uri()).await;
    seed_text_page(&db).await;

    // 03:15 UTC is 10:15 local
    quote_send(&config_path)
        .args(["--once", "--at", "2025-03-10T03:15:00Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"processed\": 1"))
        .stdout(predicate::str::contains("page-1_999"));

    assert_eq!(db.count_unused_quotes().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_off_schedule_does_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (_temp_dir, config_path, db) = setup_test_env(&server.uri()).await;
    seed_text_page(&db).await;

    quote_send(&config_path)
        .args(["--once", "--at", "2025-03-10T03:16:00Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"results\": []"));

    assert_eq!(db.count_unused_quotes().await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_force_posts_off_schedule() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/page-1/feed"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "page-1_1000"})),
        )
        .mount(&server)
        .await;

    let (_temp_dir, config_path, db) = setup_test_env(&server.uri()).await;
    seed_text_page(&db).await;

    quote_send(&config_path)
        .args(["--once", "--force", "--at", "2025-03-10T20:16:00Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"success\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_platform_failure_is_reported_not_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/page-1/feed"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {"message": "Error validating access token", "code": 190}
        })))
        .mount(&server)
        .await;

    let (_temp_dir, config_path, db) = setup_test_env(&server.uri()).await;
    seed_text_page(&db).await;

    quote_send(&config_path)
        .args(["--once", "--at", "2025-03-10T03:15:00Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"failed\""))
        .stdout(predicate::str::contains("Error validating access token"));

    assert_eq!(db.count_unused_quotes().await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_verbose_logging() {
    let (_temp_dir, config_path, _db) = setup_test_env("http://127.0.0.1:9").await;

    quote_send(&config_path)
        .args(["--once", "--verbose"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Running auto-post tick"));
}
