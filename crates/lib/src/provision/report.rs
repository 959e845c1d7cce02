//! Structured results of a provisioning run.
//!
//! Every step that may fail without aborting the run records its outcome here
//! instead of being silently dropped.

use std::path::PathBuf;

use serde::Serialize;

use crate::staleness::StalenessReport;
use crate::target::Engine;

/// Outcome of a best-effort step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
  Success,
  Warning { reason: String },
  Skipped,
}

impl StepOutcome {
  pub fn warning(reason: impl ToString) -> Self {
    StepOutcome::Warning {
      reason: reason.to_string(),
    }
  }

  pub fn is_warning(&self) -> bool {
    matches!(self, StepOutcome::Warning { .. })
  }
}

/// What the staleness check decided and whether the rebuild worked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RebuildOutcome {
  /// Not checked: disabled by option or no rebuild command configured.
  Skipped,
  UpToDate { pairs_checked: usize },
  Rebuilt { stale: usize },
  Failed { stale: usize, reason: String },
}

/// Terminal state of one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TargetState {
  AlreadyInstalled,
  Installed { binary: PathBuf, bindings: StepOutcome },
  FetchFailed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetReport {
  pub name: String,
  pub install_path: PathBuf,
  #[serde(flatten)]
  pub state: TargetState,
}

impl TargetReport {
  pub fn was_fetched(&self) -> bool {
    matches!(self.state, TargetState::Installed { .. })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CleanupOutcome {
  Removed,
  /// Nothing existed at the path.
  Absent,
  /// Dry run: the path exists and would be removed.
  WouldRemove,
  Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
  pub path: PathBuf,
  #[serde(flatten)]
  pub outcome: CleanupOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub rebuild: RebuildOutcome,
  pub targets: Vec<TargetReport>,
  pub cleanup: Vec<CleanupReport>,
  pub regenerate: StepOutcome,
  pub elapsed_ms: u64,
}

impl RunReport {
  pub fn fetched(&self) -> usize {
    self.targets.iter().filter(|t| t.was_fetched()).count()
  }

  pub fn removed(&self) -> Vec<&PathBuf> {
    self
      .cleanup
      .iter()
      .filter(|c| c.outcome == CleanupOutcome::Removed)
      .map(|c| &c.path)
      .collect()
  }

  /// Human-readable description of every non-fatal problem in the run.
  pub fn warnings(&self) -> Vec<String> {
    let mut warnings = Vec::new();

    if let RebuildOutcome::Failed { reason, .. } = &self.rebuild {
      warnings.push(format!("rebuild failed: {}", reason));
    }

    for target in &self.targets {
      match &target.state {
        TargetState::FetchFailed { reason } => {
          warnings.push(format!("{}: fetch failed: {}", target.name, reason));
        }
        TargetState::Installed {
          bindings: StepOutcome::Warning { reason },
          ..
        } => {
          warnings.push(format!("{}: binding generation failed: {}", target.name, reason));
        }
        _ => {}
      }
    }

    for entry in &self.cleanup {
      if let CleanupOutcome::Failed { reason } = &entry.outcome {
        warnings.push(format!("failed to remove {}: {}", entry.path.display(), reason));
      }
    }

    if let StepOutcome::Warning { reason } = &self.regenerate {
      warnings.push(format!("binding regeneration failed: {}", reason));
    }

    warnings
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetStatus {
  pub name: String,
  pub engine: Engine,
  pub revision: String,
  pub install_path: PathBuf,
  pub installed: bool,
}

/// Read-only view of what a run would find.
#[derive(Debug, Serialize)]
pub struct StatusReport {
  /// Host platform triple; `None` when engines are not published for it.
  pub platform: Option<String>,
  pub targets: Vec<TargetStatus>,
  pub staleness: StalenessReport,
  pub cleanup_candidates: Vec<PathBuf>,
}
