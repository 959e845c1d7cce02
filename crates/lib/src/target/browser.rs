use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use super::{Target, TargetError, TargetSpec};
use crate::bindings;
use crate::fetch::{Downloader, install_archive};

/// A browser engine fetched as a zip archive over HTTP.
pub struct BrowserTarget {
  spec: TargetSpec,
  downloader: Arc<Downloader>,
  /// Working directory for the binding generator.
  project_root: PathBuf,
  command_timeout: Option<Duration>,
}

impl BrowserTarget {
  pub fn new(
    spec: TargetSpec,
    downloader: Arc<Downloader>,
    project_root: PathBuf,
    command_timeout: Option<Duration>,
  ) -> Self {
    Self {
      spec,
      downloader,
      project_root,
      command_timeout,
    }
  }
}

#[async_trait]
impl Target for BrowserTarget {
  fn spec(&self) -> &TargetSpec {
    &self.spec
  }

  async fn fetch(&self) -> Result<PathBuf, TargetError> {
    info!(
      target = %self.spec.name,
      revision = %self.spec.revision,
      "downloading engine"
    );
    let url = self
      .spec
      .download_url
      .as_deref()
      .ok_or(TargetError::UnsupportedPlatform {
        engine: self.spec.engine,
      })?;

    install_archive(&self.downloader, &self.spec.name, url, &self.spec.install_path).await?;

    Ok(self.spec.executable.clone())
  }

  async fn generate_bindings(&self, binary: &Path) -> Result<(), TargetError> {
    let template = self.spec.bindings_command.as_deref().ok_or(TargetError::NoGenerator)?;
    let input = self.spec.engine.bindings_input(&self.spec.install_path, binary);

    bindings::generate(template, &self.spec, input, &self.project_root, self.command_timeout).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::target::Engine;
  use tempfile::TempDir;

  fn webkit_spec(root: &Path, command: Option<&str>) -> TargetSpec {
    let install_path = root.join("webkit-1180");
    TargetSpec {
      name: "webkit".to_string(),
      engine: Engine::Webkit,
      revision: "1180".to_string(),
      executable: install_path.join("pw_run.sh"),
      install_path,
      download_url: Some("http://127.0.0.1:9/unreachable.zip".to_string()),
      bindings_command: command.map(str::to_string),
    }
  }

  #[tokio::test]
  async fn missing_generator_is_reported() {
    let temp = TempDir::new().unwrap();
    let target = BrowserTarget::new(
      webkit_spec(temp.path(), None),
      Arc::new(Downloader::new(false).unwrap()),
      temp.path().to_path_buf(),
      None,
    );

    let result = target.generate_bindings(Path::new("/nowhere")).await;

    assert!(matches!(result, Err(TargetError::NoGenerator)));
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn webkit_generator_receives_install_dir() {
    let temp = TempDir::new().unwrap();
    let spec = webkit_spec(temp.path(), Some("echo {binary} > bindings.txt"));
    let install_path = spec.install_path.clone();
    let target = BrowserTarget::new(
      spec,
      Arc::new(Downloader::new(false).unwrap()),
      temp.path().to_path_buf(),
      None,
    );

    target
      .generate_bindings(&install_path.join("pw_run.sh"))
      .await
      .unwrap();

    let written = std::fs::read_to_string(temp.path().join("bindings.txt")).unwrap();
    assert_eq!(written.trim(), install_path.to_string_lossy());
  }

  #[tokio::test]
  async fn unpublished_engine_cannot_be_fetched() {
    let temp = TempDir::new().unwrap();
    let mut spec = webkit_spec(temp.path(), None);
    spec.download_url = None;
    let target = BrowserTarget::new(
      spec,
      Arc::new(Downloader::new(false).unwrap()),
      temp.path().to_path_buf(),
      None,
    );

    let result = target.fetch().await;

    assert!(matches!(
      result,
      Err(TargetError::UnsupportedPlatform { engine: Engine::Webkit })
    ));
  }

  #[tokio::test]
  async fn unreachable_host_fails_fetch() {
    let temp = TempDir::new().unwrap();
    let spec = webkit_spec(temp.path(), None);
    let install_path = spec.install_path.clone();
    let target = BrowserTarget::new(
      spec,
      Arc::new(Downloader::new(false).unwrap()),
      temp.path().to_path_buf(),
      None,
    );

    let result = target.fetch().await;

    assert!(matches!(result, Err(TargetError::Fetch(_))));
    assert!(!install_path.exists());
  }
}
