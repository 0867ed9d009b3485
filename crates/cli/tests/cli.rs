//! Bootstrap tests for the bkt binary
//!
//! These cover the failure paths that end the process before any request
//! reaches a storage service, so they need no server.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn run_bkt(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bkt"))
        .current_dir(dir)
        .args(args)
        .env_remove("BKT_CONFIG")
        .env("AWS_ACCESS_KEY_ID", "test")
        .env("AWS_SECRET_ACCESS_KEY", "test")
        .output()
        .expect("Failed to execute bkt")
}

fn write_config(dir: &Path, body: &str) -> String {
    let path = dir.join("config.json");
    std::fs::write(&path, body).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_missing_config_exits_with_error() {
    let dir = TempDir::new().unwrap();
    let output = run_bkt(dir.path(), &["--once", "--no-color"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Could not load config file"), "{stderr}");
}

#[test]
fn test_malformed_config_exits_with_error() {
    let dir = TempDir::new().unwrap();
    let conf = write_config(dir.path(), "{ not json");
    let output = run_bkt(dir.path(), &["--conf", &conf, "--once"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid json file"), "{stderr}");
}

#[test]
fn test_missing_log_section_exits_with_error() {
    let dir = TempDir::new().unwrap();
    let conf = write_config(dir.path(), r#"{"S3Bucket": "a", "S3Bucket2": "b"}"#);
    let output = run_bkt(dir.path(), &["--conf", &conf, "--once"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("log configuration is empty"), "{stderr}");
}

#[test]
fn test_unknown_log_level_exits_with_error() {
    let dir = TempDir::new().unwrap();
    let conf = write_config(
        dir.path(),
        r#"{"Logs": {"Common": {"Level": "loud", "Stdout": true}}}"#,
    );
    let output = run_bkt(dir.path(), &["--conf", &conf, "--once"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("could not find log level loud"), "{stderr}");
}

#[test]
fn test_unset_bucket_fails_before_upload() {
    let dir = TempDir::new().unwrap();
    let conf = write_config(
        dir.path(),
        r#"{
            "Logs": {"Common": {"Level": "error", "Stdout": true}},
            "S3Region": "us-east-1",
            "S3Endpoint": "http://127.0.0.1:1"
        }"#,
    );
    // Go-style flag spelling
    let output = run_bkt(dir.path(), &[&format!("-conf={conf}"), "--once", "--no-color"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Unable to start run: Configuration error: S3Bucket is not set"),
        "{stderr}"
    );
}
