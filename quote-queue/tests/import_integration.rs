//! Integration tests for quote-queue import command

use assert_cmd::Command;
use libquotecast::Database;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to escape path for TOML on Windows
fn escape_path_for_toml(path: &str) -> String {
    path.replace('\\', "\\\\")
}

async fn setup_test_env() -> (TempDir, String, Database) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    let db_path = temp_dir.path().join("quotecast.db");

    fs::write(
        &config_path,
        format!(
            "[database]\npath = \"{}\"\n",
            escape_path_for_toml(&db_path.to_string_lossy())
        ),
    )
    .unwrap();

    let db = Database::new(db_path.to_str().unwrap()).await.unwrap();

    (temp_dir, config_path.to_string_lossy().to_string(), db)
}

fn quote_queue(config_path: &str) -> Command {
    let mut cmd = Command::cargo_bin("quote-queue").unwrap();
    cmd.env("QUOTECAST_CONFIG", config_path)
        .env_remove("QUOTECAST_DB_PATH");
    cmd
}

#[tokio::test(flavor = "multi_thread")]
async fn test_import_from_file() {
    let (temp_dir, config_path, db) = setup_test_env().await;
    let quotes_path = temp_dir.path().join("quotes.txt");
    fs::write(&quotes_path, "Be kind\n\n  Keep going  \n").unwrap();

    quote_queue(&config_path)
        .arg("import")
        .arg(&quotes_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 quotes"));

    assert_eq!(db.count_unused_quotes().await.unwrap(), 2);
    let latest = db.latest_unused_quote().await.unwrap().unwrap();
    assert!(latest.text == "Be kind" || latest.text == "Keep going");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_import_from_stdin() {
    let (_temp_dir, config_path, db) = setup_test_env().await;

    quote_queue(&config_path)
        .args(["import", "-"])
        .write_stdin("One\nTwo\nThree\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 3 quotes (3 unused in pool)"));

    assert_eq!(db.count_unused_quotes().await.unwrap(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_import_missing_file() {
    let (temp_dir, config_path, _db) = setup_test_env().await;

    quote_queue(&config_path)
        .arg("import")
        .arg(temp_dir.path().join("missing.txt"))
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("failed to read"));
}
