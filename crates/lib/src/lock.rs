//! File-based locking of the installation root.
//!
//! A provisioning run installs into and deletes from the installation root.
//! Two runs against the same root would race, so each run holds an exclusive
//! lock on `<install_root>/.lock` until it finishes.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::LOCK_FILENAME;

#[derive(Debug, Serialize, Deserialize)]
pub struct LockMetadata {
  pub version: u32,
  pub pid: u32,
  pub started_at_unix: u64,
  pub command: String,
  pub install_root: PathBuf,
}

#[derive(Debug, Error)]
pub enum LockError {
  #[error(
    "Installation root is locked by another process: {command} (PID {pid}, started at Unix timestamp {started_at_unix})\n\
             If you're sure no provisioning run is active, remove the lock file:\n  {lock_path}"
  )]
  Contention {
    command: String,
    pid: u32,
    started_at_unix: u64,
    lock_path: PathBuf,
  },

  #[error(
    "Installation root is locked (could not read lock metadata)\n\
             If you're sure no provisioning run is active, remove the lock file:\n  {lock_path}"
  )]
  ContentionUnknown { lock_path: PathBuf },

  #[error("Failed to create installation root: {0}")]
  CreateDir(#[source] io::Error),

  #[error("Failed to open lock file: {0}")]
  OpenFile(#[source] io::Error),

  #[error("Failed to write lock metadata: {0}")]
  WriteMetadata(#[source] io::Error),

  #[error("Failed to acquire lock: {0}")]
  LockFailed(#[source] io::Error),
}

/// Exclusive lock on an installation root, released on drop.
#[derive(Debug)]
pub struct InstallLock {
  _file: File,
  lock_path: PathBuf,
}

impl InstallLock {
  /// Lock `install_root`, creating it if needed.
  ///
  /// Fails immediately if another process holds the lock.
  pub fn acquire(install_root: &Path, command: &str) -> Result<Self, LockError> {
    std::fs::create_dir_all(install_root).map_err(LockError::CreateDir)?;
    let lock_path = install_root.join(LOCK_FILENAME);

    let file = OpenOptions::new()
      .read(true)
      .write(true)
      .create(true)
      .truncate(false)
      .open(&lock_path)
      .map_err(LockError::OpenFile)?;

    if let Err(err) = try_lock_exclusive(&file) {
      if err.kind() == io::ErrorKind::WouldBlock {
        return Err(read_contention_error(&lock_path));
      }
      return Err(LockError::LockFailed(err));
    }

    write_metadata(&file, command, install_root)?;

    Ok(InstallLock { _file: file, lock_path })
  }

  pub fn lock_path(&self) -> &Path {
    &self.lock_path
  }
}

fn write_metadata(file: &File, command: &str, install_root: &Path) -> Result<(), LockError> {
  let metadata = LockMetadata {
    version: 1,
    pid: std::process::id(),
    started_at_unix: SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .unwrap_or_default()
      .as_secs(),
    command: command.to_string(),
    install_root: install_root.to_path_buf(),
  };

  file.set_len(0).map_err(LockError::WriteMetadata)?;
  let mut writer = io::BufWriter::new(file);
  serde_json::to_writer_pretty(&mut writer, &metadata).map_err(|e| LockError::WriteMetadata(io::Error::other(e)))?;
  writer.flush().map_err(LockError::WriteMetadata)?;

  Ok(())
}

fn read_contention_error(lock_path: &Path) -> LockError {
  if let Ok(mut file) = File::open(lock_path) {
    let mut contents = String::new();
    if file.read_to_string(&mut contents).is_ok()
      && let Ok(metadata) = serde_json::from_str::<LockMetadata>(&contents)
    {
      return LockError::Contention {
        command: metadata.command,
        pid: metadata.pid,
        started_at_unix: metadata.started_at_unix,
        lock_path: lock_path.to_path_buf(),
      };
    }
  }

  LockError::ContentionUnknown {
    lock_path: lock_path.to_path_buf(),
  }
}

#[cfg(unix)]
fn try_lock_exclusive(file: &File) -> io::Result<()> {
  use rustix::fs::{FlockOperation, flock};
  use std::os::unix::io::AsFd;

  flock(file.as_fd(), FlockOperation::NonBlockingLockExclusive).map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

#[cfg(windows)]
fn try_lock_exclusive(file: &File) -> io::Result<()> {
  use std::os::windows::io::AsRawHandle;
  use windows_sys::Win32::Foundation::HANDLE;
  use windows_sys::Win32::Storage::FileSystem::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, LockFileEx};

  let handle = file.as_raw_handle() as HANDLE;

  // SAFETY: OVERLAPPED is a plain data struct that is valid when zero-initialized,
  // and the handle belongs to an open file for the duration of the call.
  let result = unsafe {
    let mut overlapped = std::mem::zeroed();
    LockFileEx(
      handle,
      LOCKFILE_FAIL_IMMEDIATELY | LOCKFILE_EXCLUSIVE_LOCK,
      0,
      1,
      0,
      &mut overlapped,
    )
  };

  if result == 0 {
    let err = io::Error::last_os_error();
    // ERROR_LOCK_VIOLATION
    if err.raw_os_error() == Some(33) {
      return Err(io::Error::new(io::ErrorKind::WouldBlock, err));
    }
    Err(err)
  } else {
    Ok(())
  }
}
