#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uuid::Uuid;

/// Test harness for running CLI commands against a temporary task file
pub struct CliTestHarness {
    temp_dir: TempDir,
    store_path: PathBuf,
}

impl CliTestHarness {
    /// Create a new test harness with an empty task file location
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let store_path = temp_dir.path().join("tasks.json");

        Self {
            temp_dir,
            store_path,
        }
    }

    /// Get a Command instance configured for testing
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("cadence").expect("Failed to find cadence binary");

        // Run inside the temp dir so no stray cadence.toml is picked up
        cmd.current_dir(self.temp_dir.path());
        cmd.env("CADENCE_STORE_PATH", &self.store_path);
        cmd.env_remove("CADENCE_DEFAULT_VIEW");
        cmd.env_remove("CADENCE_WEEK_START");

        cmd
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Helper to run a command and assert success
    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    /// Helper to run a command and assert failure
    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Runs `add` with `args` and returns the id of the created task
    pub fn add_task(&self, args: &[&str]) -> String {
        let mut full = vec!["add"];
        full.extend_from_slice(args);
        let output = self.run_success(&full).get_output().stdout.clone();
        extract_task_id(&String::from_utf8_lossy(&output))
            .expect("add output should contain the task id")
    }
}

/// First full UUID printed in `output`
pub fn extract_task_id(output: &str) -> Option<String> {
    output
        .split(|c: char| !(c.is_ascii_hexdigit() || c == '-'))
        .find(|word| word.len() == 36 && Uuid::parse_str(word).is_ok())
        .map(str::to_string)
}

/// Common test fixtures
pub struct TestFixtures;

impl TestFixtures {
    /// Every other Monday, starting on Monday 2024-01-01
    pub fn biweekly_series_args() -> Vec<&'static str> {
        vec![
            "Sprint review",
            "--date",
            "2024-01-01",
            "--every",
            "weekly",
            "--interval",
            "2",
        ]
    }
}

/// Utility functions for test assertions
pub mod assertions {
    use predicates::prelude::*;

    /// Predicate to check if output contains agenda table headers
    pub fn has_agenda_headers() -> impl Predicate<str> {
        predicate::str::contains("Date")
            .and(predicate::str::contains("Title"))
            .and(predicate::str::contains("Priority"))
    }

    /// Predicate to check if output indicates successful task creation
    pub fn task_created_successfully() -> impl Predicate<str> {
        predicate::str::contains("Created task").or(predicate::str::contains("Created recurring task"))
    }

    /// Predicate to check for error messages
    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error")
    }
}
