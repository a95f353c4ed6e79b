//! Common utilities for CLI E2E tests.

#![allow(dead_code)]

use std::process::Command;

use tempfile::TempDir;

/// A CLI sandbox with its own home directory, so config and database
/// files never touch the real data directory.
pub struct Sandbox {
    home: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            home: tempfile::tempdir().expect("Failed to create temp home"),
        }
    }

    /// Invoke a CLI command and return (stdout, stderr, exit code).
    pub fn run_cli(&self, args: &[&str]) -> (String, String, i32) {
        let output = Command::new(env!("CARGO_BIN_EXE_launchplan-cli"))
            .args(args)
            .env("HOME", self.home.path())
            .env_remove("LAUNCHPLAN_ENV")
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute CLI command");

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);

        (stdout, stderr, code)
    }

    /// Invoke a CLI command and expect success.
    pub fn run_cli_success(&self, args: &[&str]) -> String {
        let (stdout, stderr, code) = self.run_cli(args);
        assert_eq!(code, 0, "CLI command failed: {args:?}\nstderr: {stderr}");
        stdout
    }

    /// Invoke a CLI command and expect failure; returns stderr.
    pub fn run_cli_failure(&self, args: &[&str]) -> String {
        let (_, stderr, code) = self.run_cli(args);
        assert!(code != 0, "CLI command unexpectedly succeeded: {args:?}");
        stderr
    }

    /// Invoke a CLI command with `--json` and parse its output.
    pub fn run_json(&self, args: &[&str]) -> serde_json::Value {
        let mut full = args.to_vec();
        full.push("--json");
        parse_json(&self.run_cli_success(&full))
    }
}

/// Parse JSON output from CLI.
pub fn parse_json<T: for<'de> serde::Deserialize<'de>>(json: &str) -> T {
    serde_json::from_str(json).expect("Failed to parse JSON output")
}

/// Check if string contains substring
pub fn assert_contains(haystack: &str, needle: &str) {
    assert!(
        haystack.contains(needle),
        "Expected '{}' to contain '{}'",
        haystack,
        needle
    );
}
