//! Integration tests for the `dashstyle` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! and error handling without a live host.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `dashstyle` binary with env isolation.
///
/// Clears all `DASHSTYLE_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn dashstyle_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("dashstyle");
    cmd.env("HOME", "/tmp/dashstyle-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/dashstyle-cli-test-nonexistent")
        .env_remove("DASHSTYLE_PROFILE")
        .env_remove("DASHSTYLE_URL")
        .env_remove("DASHSTYLE_TOKEN")
        .env_remove("DASHSTYLE_OUTPUT")
        .env_remove("DASHSTYLE_COLOR")
        .env_remove("DASHSTYLE_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = dashstyle_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    dashstyle_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("dashboard")
            .and(predicate::str::contains("show"))
            .and(predicate::str::contains("rooms"))
            .and(predicate::str::contains("entities"))
            .and(predicate::str::contains("session")),
    );
}

#[test]
fn test_version_flag() {
    dashstyle_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dashstyle"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    dashstyle_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    dashstyle_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = dashstyle_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_show_without_config() {
    dashstyle_cmd()
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config init"));
}

#[test]
fn test_url_without_token_is_an_auth_error() {
    let output = dashstyle_cmd()
        .args(["--url", "http://127.0.0.1:9", "rooms", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "Expected auth exit code");
    assert!(combined_output(&output).contains("No access token"));
}

#[test]
fn test_unknown_profile() {
    let output = dashstyle_cmd()
        .args(["--profile", "office", "show"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("office"));
}

#[test]
fn test_unreachable_host_is_a_connection_error() {
    let output = dashstyle_cmd()
        .args([
            "--url",
            "http://127.0.0.1:9",
            "--token",
            "t",
            "--timeout",
            "2",
            "--quiet",
            "show",
        ])
        .output()
        .unwrap();
    let code = output.status.code();
    assert!(
        code == Some(7) || code == Some(8),
        "Expected connection or timeout exit code, got {code:?}:\n{}",
        combined_output(&output)
    );
}

#[test]
fn test_invalid_url_is_a_usage_error() {
    let output = dashstyle_cmd()
        .args(["--url", "ftp://ha.local", "--token", "t", "show"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_config_show_no_config() {
    // `config show` renders the default config when no file exists.
    dashstyle_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[defaults]"));
}

#[test]
fn test_invalid_output_format() {
    let output = dashstyle_cmd()
        .args(["--output", "invalid", "show"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_unknown_entity_type() {
    let output = dashstyle_cmd()
        .args(["entities", "add", "Kitchen", "light.a", "--type", "toaster"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("media_player"));
}

// ── Subcommand help discovery ───────────────────────────────────────

#[test]
fn test_rooms_subcommands_exist() {
    dashstyle_cmd()
        .args(["rooms", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("list")
                .and(predicate::str::contains("add"))
                .and(predicate::str::contains("remove")),
        );
}

#[test]
fn test_config_subcommands_exist() {
    dashstyle_cmd()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("init")
                .and(predicate::str::contains("show"))
                .and(predicate::str::contains("set-token")),
        );
}
