//! Test utilities for provision-lib.
//!
//! Cross-platform shell snippets, timestamp helpers and a scripted [`Target`]
//! used by the orchestrator tests.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;

use crate::target::{Engine, Target, TargetError, TargetSpec};

/// Shell command that creates an empty file in the current directory.
#[cfg(unix)]
pub fn touch_file(filename: &str) -> String {
  format!("touch {}", filename)
}

#[cfg(windows)]
pub fn touch_file(filename: &str) -> String {
  format!("type nul > {}", filename)
}

/// Write `path` and give it a modification time `age` in the past.
pub fn write_with_age(path: &Path, age: Duration) {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(path, b"content").unwrap();
  set_age(path, age);
}

/// Set the modification time of `path` to `age` in the past.
pub fn set_age(path: &Path, age: Duration) {
  let file = File::options().write(true).open(path).unwrap();
  file.set_modified(SystemTime::now() - age).unwrap();
}

pub fn spec(name: &str, install_path: PathBuf) -> TargetSpec {
  TargetSpec {
    name: name.to_string(),
    engine: Engine::Chromium,
    revision: "1".to_string(),
    executable: install_path.join("bin"),
    install_path,
    download_url: Some(format!("http://localhost/{}.zip", name)),
    bindings_command: None,
  }
}

/// How a [`FakeTarget`] behaves when asked to do its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
  Succeed,
  FailFetch,
  FailBindings,
  HangFetch,
}

/// A target that installs by creating its install directory.
pub struct FakeTarget {
  spec: TargetSpec,
  behavior: Behavior,
  pub fetches: AtomicUsize,
  pub bindings: Mutex<Vec<PathBuf>>,
}

impl FakeTarget {
  pub fn new(name: &str, install_root: &Path, behavior: Behavior) -> Self {
    Self {
      spec: spec(name, install_root.join(name)),
      behavior,
      fetches: AtomicUsize::new(0),
      bindings: Mutex::new(Vec::new()),
    }
  }

  pub fn fetch_count(&self) -> usize {
    self.fetches.load(Ordering::SeqCst)
  }

  pub fn binding_calls(&self) -> Vec<PathBuf> {
    self.bindings.lock().unwrap().clone()
  }
}

#[async_trait]
impl Target for FakeTarget {
  fn spec(&self) -> &TargetSpec {
    &self.spec
  }

  async fn fetch(&self) -> Result<PathBuf, TargetError> {
    self.fetches.fetch_add(1, Ordering::SeqCst);
    match self.behavior {
      Behavior::FailFetch => Err(std::io::Error::other("network unreachable").into()),
      Behavior::HangFetch => {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        unreachable!("fetch should have been cancelled")
      }
      Behavior::Succeed | Behavior::FailBindings => {
        tokio::fs::create_dir_all(&self.spec.install_path).await?;
        Ok(self.spec.executable.clone())
      }
    }
  }

  async fn generate_bindings(&self, binary: &Path) -> Result<(), TargetError> {
    self.bindings.lock().unwrap().push(binary.to_path_buf());
    match self.behavior {
      Behavior::FailBindings => Err(std::io::Error::other("generator crashed").into()),
      _ => Ok(()),
    }
  }
}
