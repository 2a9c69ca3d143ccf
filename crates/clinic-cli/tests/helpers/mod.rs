use assert_cmd::Command;
use chrono::{Duration, Local};
use std::path::PathBuf;
use tempfile::TempDir;

/// Test harness for running CLI commands with temporary databases
pub struct CliTestHarness {
    temp_dir: TempDir,
    db_path: PathBuf,
}

impl CliTestHarness {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");

        Self { temp_dir, db_path }
    }

    /// Command isolated from any `clinic.toml` in the working tree.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("clinic").expect("Failed to find clinic binary");
        cmd.current_dir(self.temp_dir.path());
        cmd.env("CLINIC_DATABASE_PATH", &self.db_path);
        cmd.env_remove("RUST_LOG");
        cmd
    }

    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Runs a command and returns its stdout.
    pub fn stdout(&self, args: &[&str]) -> String {
        let output = self.run_success(args).get_output().stdout.clone();
        String::from_utf8(output).expect("stdout is not UTF-8")
    }

    /// Registers a patient; the first one in a fresh database gets id 1.
    pub fn add_patient(&self, name: &str, email: &str) {
        self.run_success(&["patient", "add", name, "--email", email]);
    }
}

/// `YYYY-MM-DD HH:MM` text `days` from now, at 10:00.
pub fn days_from_now(days: i64) -> String {
    let date = (Local::now().naive_local() + Duration::days(days)).date();
    format!("{} 10:00", date.format("%Y-%m-%d"))
}

pub mod assertions {
    use predicates::prelude::*;

    pub fn created_successfully() -> impl Predicate<str> {
        predicate::str::contains("✓")
    }

    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error").or(predicate::str::contains("error"))
    }
}
