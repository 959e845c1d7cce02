//! On-disk representation of `provision.toml`.

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use super::ConfigError;
use crate::platform::Platform;
use crate::platform::os::Os;
use crate::target::{Engine, TargetSpec};

/// Every key is optional; unset keys take the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
  pub project_root: Option<PathBuf>,
  pub source_root: Option<PathBuf>,
  pub compiled_root: Option<PathBuf>,
  pub source_ext: Option<String>,
  pub compiled_ext: Option<String>,
  pub install_root: Option<PathBuf>,
  pub legacy_paths: Option<Vec<PathBuf>>,
  pub rebuild_command: Option<String>,
  pub regenerate_command: Option<String>,
  pub download_host: Option<String>,
  pub concurrent: Option<bool>,
  pub fetch_timeout_secs: Option<u64>,
  pub command_timeout_secs: Option<u64>,
  pub targets: Vec<TargetEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetEntry {
  pub name: String,
  pub engine: Engine,
  /// Defaults to the revision pinned for the engine.
  pub revision: Option<String>,
  /// Explicit archive URL, bypassing the host template.
  pub url: Option<String>,
  /// Directory name under the install root; defaults to `<name>-<revision>`.
  pub install_dir: Option<String>,
  pub bindings_command: Option<String>,
}

impl TargetEntry {
  /// One entry per engine, named after it.
  pub fn defaults() -> Vec<TargetEntry> {
    Engine::ALL
      .iter()
      .map(|engine| TargetEntry {
        name: engine.as_str().to_string(),
        engine: *engine,
        revision: None,
        url: None,
        install_dir: None,
        bindings_command: Some(format!(
          "node utils/protocol-types-generator {} \"{{binary}}\"",
          engine.as_str()
        )),
      })
      .collect()
  }

  pub(super) fn resolve(
    &self,
    install_root: &Path,
    host: Option<&str>,
    platform: Option<Platform>,
  ) -> Result<TargetSpec, ConfigError> {
    let revision = self
      .revision
      .clone()
      .unwrap_or_else(|| self.engine.default_revision().to_string());

    let dir = self
      .install_dir
      .clone()
      .unwrap_or_else(|| format!("{}-{}", self.name, revision));
    if !is_single_component(&dir) {
      return Err(ConfigError::InvalidInstallDir {
        name: self.name.clone(),
        dir,
      });
    }

    let install_path = install_root.join(&dir);
    let download_url = match &self.url {
      Some(url) => Some(url.clone()),
      None => platform.and_then(|p| self.engine.download_url(host, &revision, p)),
    };

    // Unknown hosts fall back to the Linux layout; they can only install
    // from an explicit url anyway.
    let os = platform.map_or(Os::Linux, |p| p.os);
    let executable = install_path.join(self.engine.executable(os));

    Ok(TargetSpec {
      name: self.name.clone(),
      engine: self.engine,
      revision,
      install_path,
      executable,
      download_url,
      bindings_command: self.bindings_command.clone().filter(|cmd| !cmd.is_empty()),
    })
  }
}

fn is_single_component(dir: &str) -> bool {
  let mut components = Path::new(dir).components();
  matches!(
    (components.next(), components.next()),
    (Some(Component::Normal(_)), None)
  )
}
