use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::platform::Platform;
use crate::platform::arch::Arch;
use crate::platform::os::Os;

const CHROMIUM_HOST: &str = "https://storage.googleapis.com";
const PLAYWRIGHT_HOST: &str = "https://playwright.azureedge.net";

/// The engine families a target can provision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
  Chromium,
  Firefox,
  Webkit,
}

impl Engine {
  pub const ALL: [Engine; 3] = [Engine::Chromium, Engine::Firefox, Engine::Webkit];

  pub fn as_str(&self) -> &'static str {
    match self {
      Engine::Chromium => "chromium",
      Engine::Firefox => "firefox",
      Engine::Webkit => "webkit",
    }
  }

  /// Revision pinned for this engine when the config does not name one.
  pub fn default_revision(&self) -> &'static str {
    match self {
      Engine::Chromium => "740847",
      Engine::Firefox => "1072",
      Engine::Webkit => "1180",
    }
  }

  fn default_host(&self) -> &'static str {
    match self {
      Engine::Chromium => CHROMIUM_HOST,
      Engine::Firefox | Engine::Webkit => PLAYWRIGHT_HOST,
    }
  }

  /// Archive URL for `revision` on `platform`.
  ///
  /// Returns `None` when the engine is not published for the platform.
  pub fn download_url(&self, host: Option<&str>, revision: &str, platform: Platform) -> Option<String> {
    // Linux builds are only published for x86_64.
    if platform.os == Os::Linux && platform.arch != Arch::X86_64 {
      return None;
    }

    let host = host.unwrap_or(self.default_host()).trim_end_matches('/');
    let url = match (self, platform.os) {
      (Engine::Chromium, os) => {
        let (dir, archive) = match os {
          Os::Linux => ("Linux_x64", "chrome-linux.zip"),
          Os::MacOs => ("Mac", "chrome-mac.zip"),
          Os::Windows => ("Win_x64", "chrome-win.zip"),
        };
        format!("{}/chromium-browser-snapshots/{}/{}/{}", host, dir, revision, archive)
      }
      (Engine::Firefox, os) => {
        let archive = match os {
          Os::Linux => "firefox-linux.zip",
          Os::MacOs => "firefox-mac.zip",
          Os::Windows => "firefox-win64.zip",
        };
        format!("{}/builds/firefox/{}/{}", host, revision, archive)
      }
      (Engine::Webkit, os) => {
        let archive = match os {
          Os::Linux => "minibrowser-gtk-wpe.zip",
          Os::MacOs => "minibrowser-mac-10.15.zip",
          Os::Windows => "minibrowser-win64.zip",
        };
        format!("{}/builds/webkit/{}/{}", host, revision, archive)
      }
    };

    Some(url)
  }

  /// Executable location relative to the install directory.
  pub fn executable(&self, os: Os) -> PathBuf {
    let parts: &[&str] = match (self, os) {
      (Engine::Chromium, Os::Linux) => &["chrome-linux", "chrome"],
      (Engine::Chromium, Os::MacOs) => &["chrome-mac", "Chromium.app", "Contents", "MacOS", "Chromium"],
      (Engine::Chromium, Os::Windows) => &["chrome-win", "chrome.exe"],
      (Engine::Firefox, Os::Linux) => &["firefox", "firefox"],
      (Engine::Firefox, Os::MacOs) => &["firefox", "Nightly.app", "Contents", "MacOS", "firefox"],
      (Engine::Firefox, Os::Windows) => &["firefox", "firefox.exe"],
      (Engine::Webkit, Os::Linux | Os::MacOs) => &["pw_run.sh"],
      (Engine::Webkit, Os::Windows) => &["Playwright.exe"],
    };
    parts.iter().collect()
  }

  /// Path handed to the binding generator.
  ///
  /// WebKit's generator reads the protocol from the install directory; the
  /// others introspect a running executable.
  pub fn bindings_input<'a>(&self, install_path: &'a Path, binary: &'a Path) -> &'a Path {
    match self {
      Engine::Webkit => install_path,
      Engine::Chromium | Engine::Firefox => binary,
    }
  }
}

impl fmt::Display for Engine {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
