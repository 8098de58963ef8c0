//! Tests for the binary's output streams
//!
//! `export` writes JSON Lines to stdout when no output file is given, so
//! diagnostics must never land there.

use mockito::Matcher;
use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

fn write_config(base_url: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[registry]
base_url = "{base_url}"
api_key = "sk_test"

[registry.retry]
max_retries = 0

[sync]
registry_id = "src_1"
composite_schema_id = "ts_antibody"
"#
    )
    .unwrap();
    file.flush().unwrap();
    file
}

fn registrar(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_registrar"))
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn test_export_config_error_keeps_stdout_clean() {
    let output = registrar(&["--config", "/nonexistent/registrar.toml", "export"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty(), "stdout: {}", String::from_utf8_lossy(&output.stdout));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load configuration"));
}

#[test]
fn test_export_failure_keeps_stdout_clean() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", Matcher::Any)
        .with_status(400)
        .with_body(r#"{"error": {"message": "Unknown registry"}}"#)
        .create();

    let config = write_config(&server.url());
    let output = registrar(&["--config", config.path().to_str().unwrap(), "export"]);

    assert_eq!(output.status.code(), Some(5));
    assert!(output.stdout.is_empty(), "stdout: {}", String::from_utf8_lossy(&output.stdout));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Export failed"));
}
