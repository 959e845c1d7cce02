//! Staleness detection for compiled artifacts.
//!
//! Every source file under the source root has a compiled counterpart under
//! the compiled root. A pair is stale when the source was modified after the
//! compiled file, or when either side cannot be stat'ed. A single stale pair
//! means the tree needs a rebuild.

use std::io;
use std::path::{Path, PathBuf};

use futures_util::future::join_all;
use serde::Serialize;
use tokio::fs;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// A source file and the artifact compiled from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceArtifactPair {
  pub source: PathBuf,
  pub compiled: PathBuf,
}

impl SourceArtifactPair {
  /// Map `source` under `source_root` onto `compiled_root` with `compiled_ext`.
  ///
  /// Returns `None` when `source` does not live under `source_root`.
  pub fn derive(source: &Path, source_root: &Path, compiled_root: &Path, compiled_ext: &str) -> Option<Self> {
    let relative = source.strip_prefix(source_root).ok()?;
    // Everything from the last dot is the extension, so `.ts` maps to `.js`.
    let name = relative.file_name()?.to_string_lossy();
    let stem = name.rfind('.').map_or(name.as_ref(), |dot| &name[..dot]);
    let compiled = compiled_root
      .join(relative)
      .with_file_name(format!("{}.{}", stem, compiled_ext.trim_start_matches('.')));

    Some(Self {
      source: source.to_path_buf(),
      compiled,
    })
  }

  /// Whether the compiled artifact is out of date.
  ///
  /// A missing or unreadable file on either side counts as stale.
  pub async fn is_stale(&self) -> bool {
    let (source, compiled) = tokio::join!(fs::metadata(&self.source), fs::metadata(&self.compiled));

    let modified = source
      .and_then(|m| m.modified())
      .and_then(|s| compiled.and_then(|m| m.modified()).map(|c| (s, c)));

    match modified {
      Ok((source, compiled)) => source > compiled,
      Err(e) => {
        debug!(source = ?self.source, compiled = ?self.compiled, error = %e, "treating pair as stale");
        true
      }
    }
  }
}

/// Outcome of scanning a source tree.
#[derive(Debug, Default, Serialize)]
pub struct StalenessReport {
  pub pairs_checked: usize,
  pub stale: Vec<SourceArtifactPair>,
}

impl StalenessReport {
  pub fn is_rebuild_needed(&self) -> bool {
    !self.stale.is_empty()
  }
}

/// Whether any artifact under `compiled_root` lags behind its source.
pub async fn is_rebuild_needed(source_root: &Path, compiled_root: &Path, source_ext: &str, compiled_ext: &str) -> bool {
  scan(source_root, compiled_root, source_ext, compiled_ext)
    .await
    .is_rebuild_needed()
}

/// Compare every source file with its compiled counterpart.
pub async fn scan(source_root: &Path, compiled_root: &Path, source_ext: &str, compiled_ext: &str) -> StalenessReport {
  let pairs: Vec<SourceArtifactPair> = list_files(source_root)
    .await
    .into_iter()
    .filter(|path| has_extension(path, source_ext))
    .filter_map(|path| SourceArtifactPair::derive(&path, source_root, compiled_root, compiled_ext))
    .collect();

  let verdicts = join_all(pairs.iter().map(|pair| pair.is_stale())).await;

  let pairs_checked = pairs.len();
  let stale: Vec<SourceArtifactPair> = pairs
    .into_iter()
    .zip(verdicts)
    .filter_map(|(pair, stale)| stale.then_some(pair))
    .collect();

  debug!(pairs_checked, stale = stale.len(), "staleness scan complete");
  StalenessReport { pairs_checked, stale }
}

/// Case-insensitive suffix match; `ext` may be given with or without the dot.
fn has_extension(path: &Path, ext: &str) -> bool {
  let ext = ext.trim_start_matches('.').to_lowercase();
  path
    .to_string_lossy()
    .to_lowercase()
    .ends_with(&format!(".{}", ext))
}

struct Listing {
  files: Vec<PathBuf>,
  dirs: Vec<PathBuf>,
}

/// Recursively list regular files under `root`.
///
/// Subdirectories are read concurrently. Directories that cannot be read are
/// skipped; a missing root yields no files.
pub async fn list_files(root: &Path) -> Vec<PathBuf> {
  let mut files = Vec::new();
  let mut pending = JoinSet::new();
  pending.spawn(read_dir(root.to_path_buf()));

  while let Some(joined) = pending.join_next().await {
    match joined {
      Ok(Ok(listing)) => {
        files.extend(listing.files);
        for dir in listing.dirs {
          pending.spawn(read_dir(dir));
        }
      }
      Ok(Err((dir, e))) if e.kind() == io::ErrorKind::NotFound => {
        debug!(dir = ?dir, "directory vanished or missing");
      }
      Ok(Err((dir, e))) => {
        warn!(dir = ?dir, error = %e, "skipping unreadable directory");
      }
      Err(e) => {
        error!(error = %e, "directory listing task panicked");
      }
    }
  }

  files
}

async fn read_dir(dir: PathBuf) -> Result<Listing, (PathBuf, io::Error)> {
  let mut entries = match fs::read_dir(&dir).await {
    Ok(entries) => entries,
    Err(e) => return Err((dir, e)),
  };

  let mut listing = Listing {
    files: Vec::new(),
    dirs: Vec::new(),
  };

  loop {
    let entry = match entries.next_entry().await {
      Ok(Some(entry)) => entry,
      Ok(None) => break,
      Err(e) => return Err((dir, e)),
    };

    // Symlinks are neither followed nor compared.
    match entry.file_type().await {
      Ok(ft) if ft.is_file() => listing.files.push(entry.path()),
      Ok(ft) if ft.is_dir() => listing.dirs.push(entry.path()),
      Ok(_) => {}
      Err(e) => warn!(path = ?entry.path(), error = %e, "cannot determine file type"),
    }
  }

  Ok(listing)
}
