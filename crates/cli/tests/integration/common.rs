//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Isolated test environment.
///
/// Each test gets its own temporary project directory holding a
/// `targets.toml`.
pub struct TestEnv {
  pub temp: TempDir,
  pub targets_path: PathBuf,
}

impl TestEnv {
  /// Create from a fixture file.
  ///
  /// Copies the fixture content to a temporary `targets.toml` file.
  pub fn from_fixture(name: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let targets_path = temp.path().join("targets.toml");
    std::fs::write(&targets_path, fixture_content(name)).unwrap();
    Self { temp, targets_path }
  }

  /// Write a file relative to the project directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Read a file relative to the project directory, if it exists.
  pub fn read_file(&self, relative_path: &str) -> Option<String> {
    std::fs::read_to_string(self.temp.path().join(relative_path)).ok()
  }

  /// Canonical project directory.
  pub fn project_dir(&self) -> PathBuf {
    let p = self.temp.path().to_path_buf();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  /// Get a pre-configured Command for the stagehand binary.
  ///
  /// Runs from the project directory with logging quieted, so assertions on
  /// stderr only see command output.
  pub fn stagehand_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("stagehand");
    cmd.current_dir(self.temp.path());
    cmd.env("RUST_LOG", "error");
    cmd
  }
}
