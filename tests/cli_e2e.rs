//! End-to-end CLI tests for the harvester binary.

use std::path::Path;

use assert_cmd::Command;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

mod support;
use support::site::{
    items, listing_page, mount_first_listing_page, mount_login_page, mount_phone,
    mount_redirecting_login,
};
use support::localhost::start_site;

/// Binary with an isolated config directory and no ambient credentials.
fn harvester(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("harvester").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env_remove("HARVESTER_EMAIL")
        .env_remove("HARVESTER_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_binary_help_displays_usage() {
    let dir = TempDir::new().unwrap();
    harvester(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Crawl the hellojob.az cv-pool"))
        .stdout(predicate::str::contains("--pages"))
        .stdout(predicate::str::contains("--password").not());
}

#[test]
fn test_binary_version_displays_version() {
    let dir = TempDir::new().unwrap();
    harvester(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("harvester"));
}

#[test]
fn test_binary_invalid_concurrency_is_usage_error() {
    let dir = TempDir::new().unwrap();
    harvester(dir.path())
        .args(["-c", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("concurrency"));
}

#[test]
fn test_binary_missing_email_fails() {
    let dir = TempDir::new().unwrap();
    harvester(dir.path())
        .env("HARVESTER_PASSWORD", "secret")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("HARVESTER_EMAIL"));
}

#[test]
fn test_binary_missing_password_fails() {
    let dir = TempDir::new().unwrap();
    harvester(dir.path())
        .args(["--email", "hr@example.az"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("HARVESTER_PASSWORD"));
}

#[test]
fn test_binary_invalid_config_file_reports_line() {
    let dir = TempDir::new().unwrap();
    let config_dir = dir.path().join("harvester");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "detail = true\nconcurrency = many\n").unwrap();

    harvester(dir.path())
        .args(["--email", "hr@example.az"])
        .env("HARVESTER_PASSWORD", "secret")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("line 2"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_binary_full_run_exports_csv() {
    let Some(server) = start_site().await else {
        return;
    };
    mount_login_page(&server, false).await;
    mount_redirecting_login(&server).await;
    mount_first_listing_page(&server, listing_page(&items(1..=2), 1)).await;
    mount_phone(&server, "1", "+994501111111").await;
    mount_phone(&server, "2", "+994502222222").await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("run.csv");
    let mut cmd = harvester(dir.path());
    cmd.args(["--email", "hr@example.az", "--no-warm-up", "--batch-pause-ms", "0"])
        .args(["--base-url", &server.uri()])
        .arg("-o")
        .arg(&output)
        .env("HARVESTER_PASSWORD", "secret");

    let result = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();

    result
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 candidates (2 with phone)"));
    let content = std::fs::read_to_string(&output).unwrap();
    assert!(content.starts_with("phone,name,age"));
    assert!(content.contains("+994502222222"));
}
