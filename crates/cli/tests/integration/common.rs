//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// A project whose targets point at a closed local port, so nothing is downloaded.
pub const OFFLINE_CONFIG: &str = r#"
install_root = "browsers"
legacy_paths = [".local-chromium"]
rebuild_command = ""
regenerate_command = "exit 1"

[[targets]]
name = "chromium"
engine = "chromium"
revision = "1"
url = "http://127.0.0.1:9/chromium.zip"
bindings_command = ""

[[targets]]
name = "firefox"
engine = "firefox"
revision = "2"
url = "http://127.0.0.1:9/firefox.zip"
bindings_command = ""
"#;

/// Isolated project directory.
pub struct TestEnv {
  pub temp: TempDir,
  pub config_path: PathBuf,
}

impl TestEnv {
  /// Create a project with the given `provision.toml`.
  pub fn with_config(content: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("provision.toml");
    std::fs::write(&config_path, content).unwrap();
    Self { temp, config_path }
  }

  /// Create a directory relative to the project root.
  pub fn mkdir(&self, relative_path: &str) -> PathBuf {
    let path = self.root().join(relative_path);
    std::fs::create_dir_all(&path).unwrap();
    path
  }

  pub fn root(&self) -> PathBuf {
    dunce::canonicalize(self.temp.path()).unwrap_or_else(|_| self.temp.path().to_path_buf())
  }

  /// Both configured targets already on disk, plus one stale install.
  pub fn provisioned(&self) -> PathBuf {
    self.mkdir("browsers/chromium-1");
    self.mkdir("browsers/firefox-2");
    self.mkdir("browsers/old-legacy-browser")
  }

  /// Command for the provision binary, run from the project root.
  pub fn provision_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("provision");
    cmd.current_dir(self.root());
    cmd.env_remove("PROVISION_DOWNLOAD_HOST");
    cmd.env_remove("RUST_LOG");
    cmd
  }
}
