//! CLI integration tests
//!
//! These run the compiled binary and check command parsing, output formats,
//! artifacts and exit codes. Remote analysis is always disabled.

use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn buildmedic(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_buildmedic"))
        .args(args)
        .arg("--root")
        .arg(root)
        .env_remove("BUILDMEDIC_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("PROJECT_TYPE")
        .env_remove("MAX_ERROR_LENGTH")
        .env("BUILDMEDIC_LOG_LEVEL", "error")
        .output()
        .expect("Failed to execute buildmedic")
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_buildmedic"))
        .arg("--help")
        .output()
        .expect("Failed to execute buildmedic");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("analyze"));
    assert!(stdout.contains("classify"));
    assert!(stdout.contains("fix"));
}

#[test]
fn test_analyze_json_output() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("build_log.txt"),
        "Traceback (most recent call last):\n  File \"app.py\", line 3\nIndentationError: unexpected indent\n",
    )
    .unwrap();

    let output = buildmedic(
        dir.path(),
        &["analyze", "--project", "python", "--format", "json"],
    );
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["classification"]["kind"], "minor");
    assert_eq!(report["classification"]["source"], "pattern");
    assert_eq!(report["classification"]["locations"][0]["file"], "app.py");
    assert_eq!(report["remediation"]["applied"][0]["step"], "scaffold");

    assert!(dir.path().join("tests/__init__.py").exists());
    assert_eq!(
        fs::read_to_string(dir.path().join("error_type.txt")).unwrap(),
        "minor"
    );
}

#[test]
fn test_missing_transcript_exits_zero_as_major() {
    let dir = TempDir::new().unwrap();

    let output = buildmedic(dir.path(), &["analyze", "--format", "json"]);
    assert_eq!(output.status.code(), Some(0));

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["classification"]["kind"], "major");
    assert_eq!(
        fs::read_to_string(dir.path().join("error_type.txt")).unwrap(),
        "major"
    );
}

#[test]
fn test_unreadable_transcript_exits_one() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("build_log.txt")).unwrap();

    let output = buildmedic(dir.path(), &["analyze"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_classify_then_fix() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("package.json"),
        r#"{"name": "app", "version": "1.0.0"}"#,
    )
    .unwrap();
    fs::write(dir.path().join("build_log.txt"), "npm ERR! missing script: build").unwrap();

    let classify = buildmedic(dir.path(), &["classify", "--project", "nodejs", "--format", "json"]);
    assert!(classify.status.success());
    let report: Value = serde_json::from_slice(&classify.stdout).unwrap();
    assert!(report.get("remediation").is_none());

    let manifest = fs::read_to_string(dir.path().join("package.json")).unwrap();
    assert!(!manifest.contains("No build script specified"));

    let fix = buildmedic(dir.path(), &["fix", "--format", "json"]);
    assert!(fix.status.success());
    let report: Value = serde_json::from_slice(&fix.stdout).unwrap();
    assert_eq!(report["project"], "nodejs");
    assert_eq!(report["remediation"]["succeeded"], 1);

    let manifest_text = fs::read_to_string(dir.path().join("package.json")).unwrap();
    let manifest: Value = serde_json::from_str(&manifest_text).unwrap();
    assert_eq!(
        manifest["scripts"]["build"],
        "echo \"No build script specified\""
    );
}

#[test]
fn test_fix_without_record_exits_one() {
    let dir = TempDir::new().unwrap();
    let output = buildmedic(dir.path(), &["fix"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_output_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("build_log.txt"), "error[E0308]: mismatched types").unwrap();
    let report_path = dir.path().join("report.yaml");

    let output = buildmedic(
        dir.path(),
        &[
            "classify",
            "--project",
            "rust",
            "--format",
            "yaml",
            "--output",
            report_path.to_str().unwrap(),
        ],
    );
    assert!(output.status.success());

    let yaml = fs::read_to_string(&report_path).unwrap();
    assert!(yaml.contains("kind: major"));
}

#[test]
fn test_invalid_max_chars_exits_one() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("build_log.txt"), "SyntaxError").unwrap();

    let output = buildmedic(dir.path(), &["classify", "--max-chars", "0"]);
    assert_eq!(output.status.code(), Some(1));
}
