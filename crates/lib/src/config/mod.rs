//! Provisioning configuration.
//!
//! A run is driven entirely by a [`ProvisionConfig`] holding absolute paths.
//! It is built from an optional `provision.toml` whose relative paths resolve
//! against the project root, falling back to the built-in browser targets.

mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::consts::{CONFIG_FILENAME, DOWNLOAD_HOST_ENV, LEGACY_DIRS};
use crate::platform::Platform;
use crate::target::TargetSpec;

pub use file::{ConfigFile, TargetEntry};

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30 * 60);
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("target `{0}` is declared more than once")]
  DuplicateTarget(String),

  #[error("target `{name}` has an invalid install directory `{dir}`: must be a single path component")]
  InvalidInstallDir { name: String, dir: String },

  #[error("targets `{first}` and `{second}` share the install path {path}")]
  SharedInstallPath {
    first: String,
    second: String,
    path: PathBuf,
  },

  #[error("failed to determine the current directory: {0}")]
  CurrentDir(#[source] std::io::Error),
}

/// Fully resolved configuration for one provisioning run.
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
  /// Working directory for every command the run executes.
  pub project_root: PathBuf,
  pub source_root: PathBuf,
  pub compiled_root: PathBuf,
  pub source_ext: String,
  pub compiled_ext: String,
  pub install_root: PathBuf,
  pub legacy_paths: Vec<PathBuf>,
  pub rebuild_command: Option<String>,
  pub regenerate_command: Option<String>,
  pub concurrent: bool,
  pub fetch_timeout: Option<Duration>,
  pub command_timeout: Option<Duration>,
  pub targets: Vec<TargetSpec>,
}

impl ProvisionConfig {
  /// Load the config file at `path`; relative paths resolve against its directory.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let file: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;

    let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let base = absolutize(&base)?;
    debug!(path = ?path, base = ?base, "loaded config file");

    Self::resolve(file, &base, Platform::current())
  }

  /// Use `provision.toml` in `dir` if present, otherwise the defaults rooted at `dir`.
  pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
    let candidate = dir.join(CONFIG_FILENAME);
    if candidate.is_file() {
      return Self::load(&candidate);
    }

    debug!(dir = ?dir, "no config file found, using defaults");
    Self::resolve(ConfigFile::default(), &absolutize(dir)?, Platform::current())
  }

  /// Resolve a parsed file against `base`.
  ///
  /// `PROVISION_DOWNLOAD_HOST` takes precedence over `download_host`.
  pub fn resolve(file: ConfigFile, base: &Path, platform: Option<Platform>) -> Result<Self, ConfigError> {
    let project_root = match &file.project_root {
      Some(root) => base.join(root),
      None => base.to_path_buf(),
    };
    let at_root = |path: &Option<PathBuf>, default: &str| project_root.join(path.as_deref().unwrap_or(Path::new(default)));

    let install_root = at_root(&file.install_root, ".local-browsers");
    let legacy_paths = match &file.legacy_paths {
      Some(paths) => paths.iter().map(|p| project_root.join(p)).collect(),
      None => LEGACY_DIRS.iter().map(|dir| project_root.join(dir)).collect(),
    };

    let host = std::env::var(DOWNLOAD_HOST_ENV).ok().or(file.download_host.clone());
    let entries = if file.targets.is_empty() {
      TargetEntry::defaults()
    } else {
      file.targets.clone()
    };
    let targets = resolve_targets(&entries, &install_root, host.as_deref(), platform)?;

    Ok(Self {
      source_root: at_root(&file.source_root, "src"),
      compiled_root: at_root(&file.compiled_root, "lib"),
      source_ext: file.source_ext.clone().unwrap_or_else(|| ".ts".to_string()),
      compiled_ext: file.compiled_ext.clone().unwrap_or_else(|| ".js".to_string()),
      install_root,
      legacy_paths,
      rebuild_command: command_or_default(&file.rebuild_command, "npm run build"),
      regenerate_command: command_or_default(&file.regenerate_command, "npm run generate-types"),
      concurrent: file.concurrent.unwrap_or(false),
      fetch_timeout: timeout_or_default(file.fetch_timeout_secs, DEFAULT_FETCH_TIMEOUT),
      command_timeout: timeout_or_default(file.command_timeout_secs, DEFAULT_COMMAND_TIMEOUT),
      targets,
      project_root,
    })
  }
}

fn resolve_targets(
  entries: &[TargetEntry],
  install_root: &Path,
  host: Option<&str>,
  platform: Option<Platform>,
) -> Result<Vec<TargetSpec>, ConfigError> {
  let mut targets: Vec<TargetSpec> = Vec::with_capacity(entries.len());

  for entry in entries {
    if targets.iter().any(|t| t.name == entry.name) {
      return Err(ConfigError::DuplicateTarget(entry.name.clone()));
    }

    let spec = entry.resolve(install_root, host, platform)?;

    if let Some(other) = targets.iter().find(|t| t.install_path == spec.install_path) {
      return Err(ConfigError::SharedInstallPath {
        first: other.name.clone(),
        second: spec.name,
        path: spec.install_path,
      });
    }

    targets.push(spec);
  }

  Ok(targets)
}

/// An empty string disables the command.
fn command_or_default(value: &Option<String>, default: &str) -> Option<String> {
  match value.as_deref() {
    Some("") => None,
    Some(cmd) => Some(cmd.to_string()),
    None => Some(default.to_string()),
  }
}

/// Zero disables the timeout.
fn timeout_or_default(secs: Option<u64>, default: Duration) -> Option<Duration> {
  match secs {
    Some(0) => None,
    Some(secs) => Some(Duration::from_secs(secs)),
    None => Some(default),
  }
}

fn absolutize(path: &Path) -> Result<PathBuf, ConfigError> {
  if path.is_absolute() {
    return Ok(path.to_path_buf());
  }
  let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
  let joined = cwd.join(path);
  Ok(dunce::canonicalize(&joined).unwrap_or(joined))
}
