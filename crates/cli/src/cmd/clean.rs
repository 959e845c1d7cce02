use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use provision_lib::provision::{CleanupOutcome, CleanupReport, Provisioner};

use super::{load_config, runtime};
use crate::CommonArgs;
use crate::output::{format_duration, print_info, print_json, print_removed, print_stat, print_success, print_warning};

#[derive(Serialize)]
struct CleanOutput<'a> {
  dry_run: bool,
  entries: &'a [CleanupReport],
}

pub fn cmd_clean(common: &CommonArgs, dry_run: bool) -> Result<()> {
  let start = Instant::now();

  let config = load_config(common)?;
  debug!(install_root = ?config.install_root, legacy = ?config.legacy_paths, dry_run, "starting cleanup");
  let provisioner = Provisioner::from_config(config, false)?;

  let rt = runtime()?;
  let entries = rt.block_on(provisioner.clean(dry_run)).context("Cleanup failed")?;

  if common.output.is_json() {
    return print_json(&CleanOutput {
      dry_run,
      entries: &entries,
    });
  }

  let count = |wanted: fn(&CleanupOutcome) -> bool| entries.iter().filter(|e| wanted(&e.outcome)).count();

  for entry in &entries {
    match &entry.outcome {
      CleanupOutcome::Removed | CleanupOutcome::WouldRemove => print_removed(&entry.path),
      CleanupOutcome::Failed { reason } => {
        print_warning(&format!("failed to remove {}: {}", entry.path.display(), reason))
      }
      CleanupOutcome::Absent => {}
    }
  }

  println!();
  if dry_run {
    print_info("Dry run - no changes made");
    print_stat("Would remove", &count(|o| *o == CleanupOutcome::WouldRemove).to_string());
  } else {
    print_success("Cleanup complete!");
    print_stat("Removed", &count(|o| *o == CleanupOutcome::Removed).to_string());
    print_stat(
      "Failed",
      &count(|o| matches!(o, CleanupOutcome::Failed { .. })).to_string(),
    );
  }
  print_stat("Duration", &format_duration(start.elapsed()));

  Ok(())
}
