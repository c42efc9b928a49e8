//! End-to-end tests for the paperproxy service
//!
//! Runs the real watch/reconcile/upload pipeline against a temporary
//! directory and an in-process fake Paperless server.

mod common;

use cli_lib::{daemon, Config};
use clap::Parser;
use client::testing::FakePaperless;
use common::ProxyCommand;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::oneshot;

const WAIT: Duration = Duration::from_secs(10);

fn config(watch_dir: &Path, host: &str, extra: &[&str]) -> Config {
    let mut args = vec![
        "paperproxy".to_string(),
        "--watch-dir".to_string(),
        watch_dir.display().to_string(),
        "--paperless-host".to_string(),
        host.to_string(),
        "--api-key".to_string(),
        "test-token".to_string(),
    ];
    args.extend(extra.iter().map(|s| s.to_string()));
    Config::try_parse_from(args).unwrap()
}

async fn wait_until_gone(path: &Path) {
    tokio::time::timeout(WAIT, async {
        while path.exists() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("{} was never deleted", path.display()));
}

#[tokio::test]
async fn test_reconciles_then_uploads_new_files() {
    let temp_dir = TempDir::new().unwrap();
    let old = temp_dir.path().join("old.pdf");
    fs::write(&old, b"left over from last run").unwrap();

    let mut paperless = FakePaperless::start().await;
    let config = config(temp_dir.path(), paperless.host(), &["--tag", "5"]);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let service = tokio::spawn(daemon::run_until(config, async {
        let _ = stop_rx.await;
    }));

    let upload = paperless.next_upload(WAIT).await;
    assert_eq!(upload.file_name.as_deref(), Some("old.pdf"));
    assert_eq!(upload.authorization.as_deref(), Some("Token test-token"));
    assert_eq!(upload.tags.as_deref(), Some("5"));
    wait_until_gone(&old).await;

    // Give the watch a moment to register after reconciliation.
    tokio::time::sleep(Duration::from_millis(500)).await;

    let new = temp_dir.path().join("new.pdf");
    fs::write(&new, b"first half").unwrap();
    {
        use std::io::Write;
        let mut file = fs::OpenOptions::new().append(true).open(&new).unwrap();
        file.write_all(b" second half").unwrap();
    }

    let upload = paperless.next_upload(WAIT).await;
    assert_eq!(upload.file_name.as_deref(), Some("new.pdf"));
    assert_eq!(upload.document, b"first half second half");
    wait_until_gone(&new).await;

    // The burst of events for new.pdf must have produced a single upload.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(paperless.drain().is_empty());

    stop_tx.send(()).unwrap();
    service.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_missing_watch_dir_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let paperless = FakePaperless::start().await;
    let config = config(&temp_dir.path().join("consume"), paperless.host(), &[]);

    let err = daemon::run_until(config, std::future::pending()).await.unwrap_err();
    assert!(err.to_string().contains("failed to list directory"));
}

#[test]
fn test_binary_requires_api_key() {
    let temp_dir = TempDir::new().unwrap();

    let result = ProxyCommand::new()
        .env("WATCH_DIR", &temp_dir.path().display().to_string())
        .assert_failure()
        .unwrap();

    assert_eq!(result.exit_code, 2);
    assert!(result.contains_stderr("--api-key"));
}

#[test]
fn test_binary_exits_when_watch_dir_unreadable() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("consume");

    let result = ProxyCommand::new()
        .env("PAPERLESS_API_KEY", "test-token")
        .env("WATCH_DIR", &missing.display().to_string())
        .assert_failure()
        .unwrap();

    assert_eq!(result.exit_code, 1);
    // Startup is logged as JSON on stdout before the fatal error.
    assert!(result.contains_stdout("\"message\":\"starting paperproxy\""));
    assert!(result.contains_stderr("failed to list directory for startup reconcile"));
}
