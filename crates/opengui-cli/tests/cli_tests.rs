//! Integration tests for the opengui CLI
//!
//! These tests invoke the actual binary and verify:
//! - Exit codes (0 = success, 1 = invalid / rejected, 2 = error)
//! - stdout/stderr output
//! - JSON output format

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use serde_json::{json, Value};

// ── Helpers ───────────────────────────────────────────────

fn opengui_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_opengui"))
}

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .display()
        .to_string()
}

fn run_opengui(args: &[&str]) -> Output {
    Command::new(opengui_bin())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute opengui")
}

fn run_with_stdin(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(opengui_bin())
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn opengui");

    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(input.as_bytes())
        .expect("failed to write stdin");

    child.wait_with_output().expect("failed to wait for opengui")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

/// The JSON document printed after the interactive prompts.
fn trailing_json(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let start = stdout.find("\n{").expect("should print a JSON result");
    serde_json::from_str(&stdout[start..]).expect("result should be JSON")
}

// ── Version ───────────────────────────────────────────────

#[test]
fn test_version_command() {
    let output = run_opengui(&["version"]);
    assert!(output.status.success(), "version should exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("opengui"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
    assert!(stdout.contains(&format!("(opengui-core {})", opengui_core::VERSION)));
}

#[test]
fn test_version_flag() {
    let output = run_opengui(&["--version"]);
    assert!(output.status.success(), "--version should exit 0");
}

// ── Options / Submit ──────────────────────────────────────

#[test]
fn test_options_empty_request() {
    let output = run_opengui(&["options", &fixture("request_empty.json")]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stderr).contains("status: 200"));

    let body = stdout_json(&output);
    assert_eq!(body["fields"][0]["name"], json!("types"));
    assert_eq!(body["valid"], json!(true));
    assert!(body.get("ready").is_none());
}

#[test]
fn test_options_reports_missing_values() {
    let output = run_opengui(&["options", &fixture("request_rejected.json")]);
    assert_eq!(output.status.code(), Some(0));

    let body = stdout_json(&output);
    assert_eq!(body["valid"], json!(false));
    assert_eq!(body["ready"], json!(true));
    assert_eq!(body["fields"][1]["errors"], json!(["missing value"]));
}

#[test]
fn test_submit_created() {
    let output = run_opengui(&["submit", &fixture("request_created.json")]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stderr).contains("status: 201"));
    assert_eq!(stdout_json(&output), json!({"message": "created"}));
}

#[test]
fn test_submit_rejected() {
    let output = run_opengui(&["submit", &fixture("request_rejected.json")]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("status: 400"));
    assert_eq!(stdout_json(&output)["valid"], json!(false));
}

#[test]
fn test_submit_with_spec() {
    let output = run_opengui(&[
        "submit",
        &fixture("request_form.json"),
        "--spec",
        &fixture("form.yaml"),
    ]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_json(&output), json!({"message": "created"}));
}

#[test]
fn test_missing_request_file() {
    let output = run_opengui(&["submit", "/no/such/request.json"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read"));
}

// ── Check ─────────────────────────────────────────────────

#[test]
fn test_check_valid_values() {
    let output = run_opengui(&[
        "check",
        &fixture("form.yaml"),
        "--values",
        &fixture("values_valid.json"),
    ]);
    assert_eq!(output.status.code(), Some(0));

    let body = stdout_json(&output);
    assert_eq!(body["valid"], json!(true));
    assert_eq!(body["fields"][1]["value"], json!("red"));
}

#[test]
fn test_check_invalid_values() {
    let output = run_opengui(&[
        "check",
        &fixture("form.yaml"),
        "--values",
        &fixture("values_invalid.json"),
    ]);
    assert_eq!(output.status.code(), Some(1));

    let body = stdout_json(&output);
    assert_eq!(body["valid"], json!(false));
    assert_eq!(body["errors"], json!(["unknown field 'extra'"]));
    assert_eq!(body["fields"][0]["errors"], json!(["missing value"]));
    assert_eq!(body["fields"][1]["errors"], json!(["invalid value 'purple'"]));
    assert_eq!(
        body["fields"][2]["fields"][1]["errors"],
        json!(["must match '[0-9]{5}'"])
    );
}

#[test]
fn test_check_originals() {
    let output = run_opengui(&[
        "check",
        &fixture("form.yaml"),
        "--values",
        &fixture("values_valid.json"),
        "--originals",
        &fixture("originals.json"),
    ]);
    assert_eq!(output.status.code(), Some(1));

    let body = stdout_json(&output);
    assert_eq!(body["fields"][3]["value"], json!(7));
    assert_eq!(body["fields"][3]["errors"], json!(["invalid value '7'"]));
}

#[test]
fn test_check_missing_file() {
    let output = run_opengui(&["check", "/no/such/form.yaml"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load form"));
}

// ── Ask ───────────────────────────────────────────────────

#[test]
fn test_ask_example() {
    let output = run_with_stdin(&["ask", "--example"], "3\nyes\n\n");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        trailing_json(&output),
        json!({"types": ["fields"], "yin": "yes", "yang": null})
    );
}

#[test]
fn test_ask_document() {
    let output = run_with_stdin(&["ask", &fixture("form.yaml")], "\nAda\n3\n\n12345\n");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Your name *"));
    assert!(stdout.contains("  ! missing value"));
    assert!(stdout.contains("  Pick one, Ada"));
    assert!(stdout.contains("[red] > "));

    assert_eq!(
        trailing_json(&output),
        json!({"name": "Ada", "color": "blue", "street": null, "zip": 12345, "id": null})
    );
}

#[test]
fn test_ask_input_ends_early() {
    let output = run_with_stdin(&["ask", "--example"], "1\n");
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Input ended"));
}

#[test]
fn test_ask_requires_a_form() {
    let output = run_opengui(&["ask"]);
    assert!(!output.status.success());
}
