mod clean;
mod install;
mod status;

use anyhow::{Context, Result};
use tracing::debug;

use provision_lib::config::ProvisionConfig;

use crate::CommonArgs;

pub use clean::cmd_clean;
pub use install::{InstallFlags, cmd_install};
pub use status::cmd_status;

/// Load the config named on the command line, or discover one in the working directory.
fn load_config(common: &CommonArgs) -> Result<ProvisionConfig> {
  let config = match &common.config {
    Some(path) => {
      ProvisionConfig::load(path).with_context(|| format!("Failed to load config {}", path.display()))
    }
    None => {
      let cwd = std::env::current_dir().context("Failed to determine current directory")?;
      ProvisionConfig::discover(&cwd).context("Failed to load config")
    }
  }?;

  debug!(
    project_root = ?config.project_root,
    install_root = ?config.install_root,
    targets = config.targets.len(),
    "loaded config"
  );
  Ok(config)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
  tokio::runtime::Runtime::new().context("Failed to create async runtime")
}
