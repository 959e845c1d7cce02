//! Implementation of the `provision install` command.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use provision_lib::provision::{
  CleanupOutcome, Provisioner, RebuildOutcome, RunOptions, RunReport, StepOutcome, TargetState,
};

use super::{load_config, runtime};
use crate::CommonArgs;
use crate::output::{format_duration, print_info, print_json, print_removed, print_stat, print_success, print_warning};

#[derive(Debug, Clone, Copy, Default)]
pub struct InstallFlags {
  pub concurrent: bool,
  pub skip_rebuild: bool,
  pub fetch_timeout: Option<Duration>,
}

/// Execute the install command.
///
/// Runs the full provisioning sequence. Per-target failures are printed as
/// warnings and do not change the exit code.
pub fn cmd_install(common: &CommonArgs, flags: InstallFlags) -> Result<()> {
  let mut config = load_config(common)?;
  if flags.concurrent {
    config.concurrent = true;
  }
  if let Some(limit) = flags.fetch_timeout {
    config.fetch_timeout = (!limit.is_zero()).then_some(limit);
  }

  debug!(
    concurrent = config.concurrent,
    fetch_timeout = ?config.fetch_timeout,
    skip_rebuild = flags.skip_rebuild,
    "starting install"
  );

  let provisioner = Provisioner::from_config(config, !common.output.is_json())?;
  let options = RunOptions {
    skip_rebuild: flags.skip_rebuild,
  };

  let rt = runtime()?;
  let report = rt.block_on(provisioner.run(options)).context("Provisioning failed")?;

  if common.output.is_json() {
    print_json(&report)?;
  } else {
    print_report(&report);
  }

  Ok(())
}

fn print_report(report: &RunReport) {
  match &report.rebuild {
    RebuildOutcome::Skipped => {}
    RebuildOutcome::UpToDate { pairs_checked } => {
      print_info(&format!("Compiled artifacts up to date ({} checked)", pairs_checked));
    }
    RebuildOutcome::Rebuilt { stale } => {
      print_success(&format!("Rebuilt {} stale artifact(s)", stale));
    }
    RebuildOutcome::Failed { .. } => {}
  }

  for target in &report.targets {
    match &target.state {
      TargetState::AlreadyInstalled => print_info(&format!("{} already installed", target.name)),
      TargetState::Installed {
        bindings: StepOutcome::Warning { .. },
        ..
      } => print_success(&format!("{} installed (bindings failed)", target.name)),
      TargetState::Installed { .. } => print_success(&format!("{} installed", target.name)),
      TargetState::FetchFailed { .. } => {}
    }
  }

  let removed = report.removed();
  if !removed.is_empty() {
    println!();
    println!("Removed:");
    for path in &removed {
      print_removed(path);
    }
  }

  if report.regenerate == StepOutcome::Success {
    print_success("Bindings regenerated");
  }

  let warnings = report.warnings();
  if !warnings.is_empty() {
    println!();
    for warning in &warnings {
      print_warning(warning);
    }
  }

  println!();
  print_success("Provisioning complete!");
  print_stat("Fetched", &report.fetched().to_string());
  print_stat("Removed", &removed.len().to_string());
  print_stat(
    "Absent",
    &report
      .cleanup
      .iter()
      .filter(|c| c.outcome == CleanupOutcome::Absent)
      .count()
      .to_string(),
  );
  print_stat("Warnings", &warnings.len().to_string());
  print_stat("Duration", &format_duration(Duration::from_millis(report.elapsed_ms)));
}
