//! Removal of stale installations.
//!
//! Everything under the installation root that is not a current install path
//! is stale, as are the legacy directories of earlier layouts. Deletions are
//! independent of one another and run concurrently.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use super::report::{CleanupOutcome, CleanupReport};
use crate::consts::LOCK_FILENAME;

/// Paths a cleanup pass should remove, sorted.
///
/// A missing `install_root` counts as empty. Paths in `valid`, their parents
/// and their children are never returned, even when also listed as legacy.
pub async fn candidates(install_root: &Path, valid: &BTreeSet<PathBuf>, legacy: &[PathBuf]) -> io::Result<Vec<PathBuf>> {
  let mut found = BTreeSet::new();

  match fs::read_dir(install_root).await {
    Ok(mut entries) => {
      while let Some(entry) = entries.next_entry().await? {
        if entry.file_name() == LOCK_FILENAME {
          continue;
        }
        found.insert(entry.path());
      }
    }
    Err(e) if e.kind() == io::ErrorKind::NotFound => {
      debug!(root = ?install_root, "installation root does not exist");
    }
    Err(e) => return Err(e),
  }

  found.extend(legacy.iter().cloned());
  Ok(
    found
      .into_iter()
      .filter(|path| !protects_install(path, install_root, valid))
      .collect(),
  )
}

/// Whether removing `path` would take a valid install, or the root holding them, with it.
fn protects_install(path: &Path, install_root: &Path, valid: &BTreeSet<PathBuf>) -> bool {
  let overlaps = install_root.starts_with(path) || valid.iter().any(|v| v.starts_with(path) || path.starts_with(v));
  if overlaps && !valid.contains(path) {
    warn!(path = ?path, "not removing path that contains or lies inside a current installation");
  }
  overlaps
}

/// Remove every path concurrently; one failure does not stop the others.
pub async fn remove_all(paths: Vec<PathBuf>) -> Vec<CleanupReport> {
  let mut join_set = JoinSet::new();
  for path in paths {
    join_set.spawn(async move {
      let outcome = remove_path(&path).await;
      CleanupReport { path, outcome }
    });
  }

  let mut reports = Vec::new();
  while let Some(joined) = join_set.join_next().await {
    match joined {
      Ok(report) => reports.push(report),
      Err(e) => error!(error = %e, "cleanup task panicked"),
    }
  }

  reports.sort_by(|a, b| a.path.cmp(&b.path));
  reports
}

/// Report what [`remove_all`] would do without touching anything.
pub async fn plan(paths: Vec<PathBuf>) -> Vec<CleanupReport> {
  let mut reports = Vec::with_capacity(paths.len());
  for path in paths {
    let outcome = match fs::symlink_metadata(&path).await {
      Ok(_) => CleanupOutcome::WouldRemove,
      Err(_) => CleanupOutcome::Absent,
    };
    reports.push(CleanupReport { path, outcome });
  }
  reports
}

async fn remove_path(path: &Path) -> CleanupOutcome {
  let metadata = match fs::symlink_metadata(path).await {
    Ok(metadata) => metadata,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return CleanupOutcome::Absent,
    Err(e) => return failed(path, e),
  };

  let result = if metadata.is_dir() {
    fs::remove_dir_all(path).await
  } else {
    fs::remove_file(path).await
  };

  match result {
    Ok(()) => {
      debug!(path = ?path, "removed stale installation");
      CleanupOutcome::Removed
    }
    Err(e) if e.kind() == io::ErrorKind::NotFound => CleanupOutcome::Absent,
    Err(e) => failed(path, e),
  }
}

fn failed(path: &Path, e: io::Error) -> CleanupOutcome {
  warn!(path = ?path, error = %e, "failed to remove stale installation");
  CleanupOutcome::Failed { reason: e.to_string() }
}
