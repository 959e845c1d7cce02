//! Status command implementation.
//!
//! Reports which targets are installed, whether compiled artifacts are stale
//! and what a cleanup pass would remove. Nothing on disk is changed.

use anyhow::{Context, Result};

use provision_lib::provision::Provisioner;

use super::{load_config, runtime};
use crate::CommonArgs;
use crate::output::{self, print_info, print_json, print_removed, print_stat, print_success, print_warning};

pub fn cmd_status(common: &CommonArgs, verbose: bool) -> Result<()> {
  let config = load_config(common)?;
  let install_root = config.install_root.clone();
  let provisioner = Provisioner::from_config(config, false)?;

  let rt = runtime()?;
  let status = rt.block_on(provisioner.status()).context("Failed to read status")?;

  if common.output.is_json() {
    return print_json(&status);
  }

  print_info(&format!("Installation root: {}", install_root.display()));
  print_stat("Platform", status.platform.as_deref().unwrap_or("unsupported"));
  println!();
  for target in &status.targets {
    let line = format!("{} ({} r{})", target.name, target.engine.as_str(), target.revision);
    if target.installed {
      print_success(&line);
    } else {
      print_warning(&format!("{} not installed", line));
    }
    if verbose {
      println!("      {}", target.install_path.display());
    }
  }

  println!();
  if status.staleness.is_rebuild_needed() {
    print_warning(&format!(
      "{} of {} compiled artifact(s) stale",
      status.staleness.stale.len(),
      status.staleness.pairs_checked
    ));
    if verbose {
      for pair in &status.staleness.stale {
        println!("  {} {}", output::symbols::INFO, pair.source.display());
      }
    }
  } else {
    print_success("Compiled artifacts up to date");
  }
  print_stat("Pairs checked", &status.staleness.pairs_checked.to_string());

  if !status.cleanup_candidates.is_empty() {
    println!();
    println!("Cleanup candidates:");
    for path in &status.cleanup_candidates {
      print_removed(path);
    }
  }

  Ok(())
}
