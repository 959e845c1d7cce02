//! Engine download and installation.
//!
//! Engines are published as zip archives. An archive is streamed into a
//! staging directory next to its install path, unpacked there and renamed into
//! place, so an install path only ever exists once its contents are complete.

mod archive;
mod progress;

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::Client;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use indicatif::{MultiProgress, ProgressDrawTarget};
use tracing::debug;

use crate::consts::{APP_NAME, STAGING_PREFIX};

pub use archive::extract_zip;

#[derive(Debug, Error)]
pub enum FetchError {
  #[error("failed to create HTTP client: {0}")]
  Client(#[source] reqwest::Error),

  #[error("fetch failed for {url}: {source}")]
  Http {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  #[error("fetch failed for {url}: HTTP {status}")]
  Status { url: String, status: u16 },

  #[error("invalid archive {path}: {message}")]
  Archive { path: PathBuf, message: String },

  #[error("install path has no parent directory: {0}")]
  NoParent(PathBuf),

  #[error("extraction task failed: {0}")]
  Task(String),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Streams files over HTTP, optionally drawing progress bars.
///
/// Every download started through one `Downloader` draws into the same
/// [`MultiProgress`], so concurrent downloads stack instead of overwriting
/// each other.
#[derive(Debug, Clone)]
pub struct Downloader {
  client: Client,
  progress: Option<MultiProgress>,
}

impl Downloader {
  pub fn new(show_progress: bool) -> Result<Self, FetchError> {
    let client = Client::builder()
      .user_agent(format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(FetchError::Client)?;

    let progress = show_progress.then(|| MultiProgress::with_draw_target(ProgressDrawTarget::stderr()));

    Ok(Self { client, progress })
  }

  /// Download `url` into `dest`, returning the number of bytes written.
  pub async fn download(&self, url: &str, dest: &Path, label: &str) -> Result<u64, FetchError> {
    debug!(url = %url, "fetching URL");

    let response = self.client.get(url).send().await.map_err(|source| FetchError::Http {
      url: url.to_string(),
      source,
    })?;

    if !response.status().is_success() {
      return Err(FetchError::Status {
        url: url.to_string(),
        status: response.status().as_u16(),
      });
    }

    let bar = progress::download_bar(response.content_length(), label, self.progress.as_ref());

    let mut file = fs::File::create(dest).await?;
    let mut written: u64 = 0;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
      let chunk = chunk.map_err(|source| FetchError::Http {
        url: url.to_string(),
        source,
      })?;
      file.write_all(&chunk).await?;
      written += chunk.len() as u64;
      bar.set_position(written);
    }

    file.flush().await?;
    bar.finish_and_clear();

    debug!(path = ?dest, size = written, "download complete");
    Ok(written)
  }
}

/// Download the archive at `url` and unpack it into `install_path`.
///
/// `install_path` must not exist yet. Nothing is left behind on failure.
pub async fn install_archive(
  downloader: &Downloader,
  label: &str,
  url: &str,
  install_path: &Path,
) -> Result<(), FetchError> {
  let parent = install_path
    .parent()
    .ok_or_else(|| FetchError::NoParent(install_path.to_path_buf()))?;
  fs::create_dir_all(parent).await?;

  let staging = tempfile::Builder::new().prefix(STAGING_PREFIX).tempdir_in(parent)?;
  debug!(staging = ?staging.path(), "created staging directory");

  let archive = staging.path().join("archive.zip");
  downloader.download(url, &archive, label).await?;

  let unpacked = staging.path().join("unpacked");
  extract_zip(&archive, &unpacked).await?;

  fs::rename(&unpacked, install_path).await?;
  debug!(path = ?install_path, "unpacked into place");

  Ok(())
}
