//! Integration tests for the `cvpkit` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! offline commands, and error handling without a live CVP server.
#![allow(clippy::unwrap_used)]

use std::io::Write as _;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `cvpkit` binary with env isolation.
///
/// Clears all `CVP_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn cvpkit_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("cvpkit");
    cmd.env("HOME", "/tmp/cvpkit-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/cvpkit-cli-test-nonexistent")
        .env_remove("CVP_PROFILE")
        .env_remove("CVP_SERVER")
        .env_remove("CVP_USERNAME")
        .env_remove("CVP_PASSWORD")
        .env_remove("CVP_OUTPUT")
        .env_remove("CVP_INSECURE")
        .env_remove("CVP_TIMEOUT")
        .env_remove("CVP_SSH_PASSWORD")
        .env_remove("CVP_MAIL_PASSWORD");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

const FABRIC: [&str; 10] = [
    "fabric",
    "build",
    "--name",
    "dc1",
    "--gateway",
    "192.168.0.254",
    "--mgmt-network",
    "192.168.0.",
    "--mlag",
    "--dry-run",
];

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = cvpkit_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    cvpkit_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("CloudVision")
            .and(predicate::str::contains("inventory"))
            .and(predicate::str::contains("compliance"))
            .and(predicate::str::contains("configlets")),
    );
}

#[test]
fn test_version_flag() {
    cvpkit_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cvpkit"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    cvpkit_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    cvpkit_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = cvpkit_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success(), "Expected failure for invalid subcommand");
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_devices_list_no_server() {
    cvpkit_cmd()
        .args(["devices", "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn test_unknown_profile() {
    cvpkit_cmd()
        .args(["--profile", "prod", "devices", "list"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("prod"));
}

#[test]
fn test_server_without_credentials() {
    cvpkit_cmd()
        .args(["--server", "cvp.example.com", "devices", "list"])
        .assert()
        .code(3);
}

#[test]
fn test_invalid_output_format() {
    let output = cvpkit_cmd()
        .args(["--output", "invalid", "devices", "list"])
        .output()
        .unwrap();
    assert!(!output.status.success(), "Expected failure for invalid output format");
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values") || text.contains("valid value"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_global_flags_parsing() {
    // All flags should parse; the failure is about missing configuration.
    cvpkit_cmd()
        .args([
            "--output",
            "json",
            "--verbose",
            "--insecure",
            "--timeout",
            "60",
            "devices",
            "list",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration"));
}

#[test]
fn test_sync_needs_a_source() {
    cvpkit_cmd()
        .args(["configlets", "sync", "--dry-run"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("repo"));
}

#[test]
fn test_sync_repo_conflicts_with_dir() {
    cvpkit_cmd()
        .args(["configlets", "sync", "--repo", "https://git.example.com/c.git", "--dir", "."])
        .assert()
        .code(2);
}

#[test]
fn test_render_needs_a_device() {
    cvpkit_cmd().args(["configlets", "render"]).assert().code(2);
}

#[test]
fn test_export_parse_missing_file() {
    cvpkit_cmd()
        .args(["configlets", "export-parse", "/tmp/cvpkit-cli-test-nonexistent/export.zip"])
        .assert()
        .failure();
}

// ── Offline commands ────────────────────────────────────────────────

#[test]
fn test_config_show_no_config() {
    // `config show` renders the default config when no file exists.
    cvpkit_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[defaults]"));
}

#[test]
fn test_config_path() {
    cvpkit_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_fabric_dry_run_prints_configlets() {
    cvpkit_cmd().args(FABRIC).assert().success().stdout(
        predicate::str::contains("# dc1spine1 configuration")
            .and(predicate::str::contains("# dc1leaf4 configuration"))
            .and(predicate::str::contains("# dc1 Base config")),
    );
}

#[test]
fn test_fabric_dry_run_json() {
    let output = cvpkit_cmd()
        .args(["--output", "json"])
        .args(FABRIC)
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(value.is_object());
}

#[test]
fn test_fabric_odd_leafs_with_mlag() {
    cvpkit_cmd()
        .args(FABRIC)
        .args(["--leafs", "3"])
        .assert()
        .failure();
}

#[test]
fn test_ping_check_without_login() {
    cvpkit_cmd()
        .args(["checks", "ping", "--devices", "10.0.0.1", "--targets", "10.0.0.2"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("device login"));
}

#[test]
fn test_check_action_file_with_wrong_shape() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "name: device_ping\nargs:\n  passmark: 100").unwrap();
    cvpkit_cmd()
        .args(["checks", "ping", "--args-file"])
        .arg(file.path())
        .assert()
        .failure();
}

// ── Subcommand help discovery ───────────────────────────────────────

#[test]
fn test_configlets_subcommands_exist() {
    cvpkit_cmd()
        .args(["configlets", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("list")
                .and(predicate::str::contains("sync"))
                .and(predicate::str::contains("export-parse"))
                .and(predicate::str::contains("render")),
        );
}

#[test]
fn test_checks_subcommands_exist() {
    cvpkit_cmd()
        .args(["checks", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("ping")
                .and(predicate::str::contains("page"))
                .and(predicate::str::contains("switch-type")),
        );
}

#[test]
fn test_config_subcommands_exist() {
    cvpkit_cmd()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("init")
                .and(predicate::str::contains("show"))
                .and(predicate::str::contains("set-password")),
        );
}
