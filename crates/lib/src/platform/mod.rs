//! Host platform detection.
//!
//! Engine archives and executable layouts differ per OS, so the download URL
//! and binary path of every target are derived from the detected platform.

pub mod arch;
pub mod os;

use arch::Arch;
use os::Os;
use std::fmt;

/// Platform identifier combining architecture and OS (e.g., "x86_64-linux")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
  pub arch: Arch,
  pub os: Os,
}

impl Platform {
  pub fn new(arch: Arch, os: Os) -> Self {
    Self { arch, os }
  }

  /// Detect the current platform at runtime
  ///
  /// Returns `None` if the OS or architecture is not supported
  pub fn current() -> Option<Self> {
    Some(Self {
      arch: Arch::current()?,
      os: Os::current()?,
    })
  }

  pub fn triple(&self) -> String {
    format!("{}-{}", self.arch, self.os)
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.triple())
  }
}
