//! CLI end-to-end tests
//!
//! Tests for the imghost command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the imghost binary
#[allow(deprecated)]
fn imghost_cmd() -> Command {
    Command::cargo_bin("imghost").unwrap()
}

fn write_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    fs::write(
        &path,
        format!(
            "[storage]\ndata_dir = {:?}\nupload_dir = {:?}\n\n[cleanup]\nenabled = false\n",
            dir.join("data"),
            dir.join("uploads")
        ),
    )
    .unwrap();
    path
}

#[test]
fn test_cli_no_args_shows_help() {
    imghost_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    imghost_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("imghost "));
}

#[test]
fn test_cli_generate_api_key() {
    let output = imghost_cmd().arg("generate-api-key").output().unwrap();
    assert!(output.status.success());
    let key = String::from_utf8(output.stdout).unwrap();
    assert_eq!(key.trim().len(), 48);
}

#[test]
fn test_cli_hash_password() {
    imghost_cmd()
        .args(["hash-password", "hunter22"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("$2"));
}

#[test]
fn test_cli_validate_config() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());

    imghost_cmd()
        .arg("validate")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Cleanup: disabled"));
}

#[test]
fn test_cli_validate_rejects_bad_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[images]\nallowed_mime_types = []\n").unwrap();

    imghost_cmd().arg("validate").arg(&path).assert().failure();
}

#[test]
fn test_cli_stats_creates_store() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());

    imghost_cmd()
        .arg("--config")
        .arg(&config)
        .args(["stats", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"users\": 1"))
        .stdout(predicate::str::contains("\"total\": 0"));

    assert!(dir.path().join("data").join("db.json").exists());
}

#[test]
fn test_cli_sweep_on_empty_store() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());

    imghost_cmd()
        .arg("--config")
        .arg(&config)
        .arg("sweep")
        .assert()
        .success()
        .stdout(predicate::str::contains("Expired records: 0"));
}

#[test]
fn test_cli_writes_log_file() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    let log_path = dir.path().join("logs").join("app.log");
    let mut content = fs::read_to_string(&config).unwrap();
    content.push_str(&format!("\n[logging]\nfile = {:?}\n", log_path));
    fs::write(&config, content).unwrap();

    imghost_cmd()
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&config)
        .arg("stats")
        .assert()
        .success();

    let log = fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("Document loaded"));
    assert!(!log.contains('\u{1b}'));
}
