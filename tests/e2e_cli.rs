//! CLI end-to-end tests
//!
//! Tests for the onair command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{tempdir, TempDir};

const CATALOG: &str = r#"{
    "programs": [
        {
            "id": "11111111-1111-4111-8111-111111111111",
            "title": "Morning News",
            "duration_ms": 1800000,
            "location": "/media/news.mkv",
            "kind": "episode"
        }
    ],
    "channels": [
        {
            "id": "22222222-2222-4222-8222-222222222222",
            "number": 5,
            "name": "Five",
            "start_time": "2024-01-01T00:00:00Z",
            "lineup": [
                {"type": "content", "id": "11111111-1111-4111-8111-111111111111", "duration_ms": 1800000},
                {"type": "offline", "duration_ms": 1800000}
            ]
        }
    ]
}"#;

/// Get a command for the onair binary
#[allow(deprecated)]
fn onair_cmd() -> Command {
    Command::cargo_bin("onair").unwrap()
}

/// Write a config pointing at a database inside `dir`.
fn write_config(dir: &Path) -> PathBuf {
    let config_path = dir.join("onair.toml");
    let db_path = dir.join("onair.db");
    fs::write(
        &config_path,
        format!("[database]\npath = {:?}\n", db_path.to_string_lossy()),
    )
    .unwrap();
    config_path
}

fn imported() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    let catalog = dir.path().join("catalog.json");
    fs::write(&catalog, CATALOG).unwrap();

    onair_cmd()
        .arg("--config")
        .arg(&config)
        .arg("import")
        .arg(&catalog)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 programs, 0 filler lists, 1 channels"));

    (dir, config)
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = onair_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = onair_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("onair"));
}

#[test]
fn test_cli_resolve_help() {
    let mut cmd = onair_cmd();
    cmd.args(["resolve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Show what a channel is airing"));
}

#[test]
fn test_cli_validate_valid_config() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        "[playback]\nslack_ms = 5000\n\n[throttle]\nmax_attempts = 3\n",
    )
    .unwrap();

    let mut cmd = onair_cmd();
    cmd.arg("validate")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("3 attempts per 10s"));
}

#[test]
fn test_cli_validate_invalid_config() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "[throttle]\nmax_attempts = 0\n").unwrap();

    let mut cmd = onair_cmd();
    cmd.arg("validate").arg(&config_path).assert().failure();
}

#[test]
fn test_cli_channels_lists_imported() {
    let (_dir, config) = imported();

    onair_cmd()
        .arg("--config")
        .arg(&config)
        .arg("channels")
        .assert()
        .success()
        .stdout(predicate::str::contains("Five"))
        .stdout(predicate::str::contains("1:00:00.000"));
}

#[test]
fn test_cli_resolve_program_json() {
    let (_dir, config) = imported();

    onair_cmd()
        .arg("--config")
        .arg(&config)
        .args(["resolve", "5", "--at", "2024-01-01T00:10:00Z", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""type": "program""#))
        .stdout(predicate::str::contains(r#""start_offset_ms": 600000"#))
        .stdout(predicate::str::contains(r#""from_cache": false"#));
}

#[test]
fn test_cli_resolve_offline_by_id() {
    let (_dir, config) = imported();

    onair_cmd()
        .arg("--config")
        .arg(&config)
        .args([
            "resolve",
            "22222222-2222-4222-8222-222222222222",
            "--at",
            "2024-01-01T00:45:00Z",
            "--no-commit",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Type: offline"))
        .stdout(predicate::str::contains("Stream duration: 0:10:00.000"));
}

#[test]
fn test_cli_resolve_resumes_committed_stream() {
    let (_dir, config) = imported();

    for expected in ["\"from_cache\": false", "\"from_cache\": true"] {
        onair_cmd()
            .arg("--config")
            .arg(&config)
            .args(["resolve", "5", "--at", "2024-01-01T00:10:00Z", "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains(expected));
    }

    onair_cmd()
        .arg("--config")
        .arg(&config)
        .args(["stop", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stopped channel 5"));
}

#[test]
fn test_cli_resolve_unknown_channel() {
    let (_dir, config) = imported();

    onair_cmd()
        .arg("--config")
        .arg(&config)
        .args(["resolve", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Channel 99 not found"));
}
