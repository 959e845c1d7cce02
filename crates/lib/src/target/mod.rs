//! Provisioning targets.
//!
//! A target is one external engine binary. Its static description lives in
//! [`TargetSpec`]; the work of getting it onto disk and deriving its bindings
//! is behind the [`Target`] trait so the orchestrator can drive any mix of
//! implementations.

mod browser;
mod engine;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::command::CommandError;
use crate::fetch::FetchError;

pub use browser::BrowserTarget;
pub use engine::Engine;

#[derive(Debug, Error)]
pub enum TargetError {
  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error("binding generation failed: {0}")]
  Bindings(#[from] CommandError),

  #[error("no binding generator configured")]
  NoGenerator,

  #[error("{engine} is not published for this platform; configure a download url")]
  UnsupportedPlatform { engine: Engine },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Immutable description of one engine to provision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetSpec {
  pub name: String,
  pub engine: Engine,
  pub revision: String,
  /// Absolute directory the engine is unpacked into.
  pub install_path: PathBuf,
  /// Absolute path of the engine's executable inside `install_path`.
  pub executable: PathBuf,
  /// Archive to fetch; `None` when the engine is not published for this host.
  pub download_url: Option<String>,
  /// Shell command template producing this engine's bindings.
  pub bindings_command: Option<String>,
}

#[async_trait]
pub trait Target: Send + Sync {
  fn spec(&self) -> &TargetSpec;

  /// Download and install the target, returning the installed binary.
  async fn fetch(&self) -> Result<PathBuf, TargetError>;

  /// Derive interface bindings from an installed binary.
  async fn generate_bindings(&self, binary: &Path) -> Result<(), TargetError>;

  fn name(&self) -> &str {
    &self.spec().name
  }

  fn install_path(&self) -> &Path {
    &self.spec().install_path
  }
}
