use std::path::Path;

use tracing::debug;

use super::FetchError;

/// Unpack the zip at `archive` into `dest`, creating `dest` if needed.
///
/// Runs on the blocking pool; the zip reader is synchronous.
pub async fn extract_zip(archive: &Path, dest: &Path) -> Result<(), FetchError> {
  let archive = archive.to_path_buf();
  let dest = dest.to_path_buf();

  tokio::task::spawn_blocking(move || extract_blocking(&archive, &dest))
    .await
    .map_err(|e| FetchError::Task(e.to_string()))?
}

fn extract_blocking(archive: &Path, dest: &Path) -> Result<(), FetchError> {
  let invalid = |e: zip::result::ZipError| FetchError::Archive {
    path: archive.to_path_buf(),
    message: e.to_string(),
  };

  let file = std::fs::File::open(archive)?;
  let mut zip = zip::ZipArchive::new(file).map_err(invalid)?;
  debug!(archive = ?archive, entries = zip.len(), "extracting archive");

  std::fs::create_dir_all(dest)?;
  zip.extract(dest).map_err(invalid)?;

  Ok(())
}
