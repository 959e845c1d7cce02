use std::fmt;

/// Operating systems engines are published for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  MacOs,
  Windows,
}

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::MacOs),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  /// Returns the short name engine archives use for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "mac",
      Self::Windows => "win",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
