/// Application name used for config discovery and user agents.
pub const APP_NAME: &str = "provision";

/// Config file looked up in the working directory when none is given.
pub const CONFIG_FILENAME: &str = "provision.toml";

/// Lock file kept inside the installation root while a run is active.
pub const LOCK_FILENAME: &str = ".lock";

/// Prefix of the staging directories archives are unpacked into.
pub const STAGING_PREFIX: &str = ".staging-";

/// Directory names used by earlier layouts, one per engine.
/// They live next to the installation root and are always purged.
pub const LEGACY_DIRS: &[&str] = &[".local-chromium", ".local-firefox", ".local-webkit"];

/// Overrides the download host for every engine that has no explicit URL.
pub const DOWNLOAD_HOST_ENV: &str = "PROVISION_DOWNLOAD_HOST";
