//! The provisioning orchestrator.
//!
//! A run goes through four steps:
//! 1. Rebuild compiled artifacts when the staleness check says they lag behind.
//! 2. Acquire every target that is not installed yet, generating its bindings.
//! 3. Remove stale installations and legacy directories.
//! 4. Regenerate all bindings once.
//!
//! Only failing to lock or enumerate the installation root aborts a run. All
//! other failures are contained to their step and recorded in the
//! [`RunReport`].

pub mod cleanup;
pub mod report;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::fs;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::command::{OutputMode, run_command};
use crate::config::ProvisionConfig;
use crate::fetch::{Downloader, FetchError};
use crate::lock::{InstallLock, LockError};
use crate::platform::Platform;
use crate::staleness;
use crate::target::{BrowserTarget, Target, TargetError};

pub use report::{
  CleanupOutcome, CleanupReport, RebuildOutcome, RunReport, StatusReport, StepOutcome, TargetReport, TargetState,
  TargetStatus,
};

#[derive(Debug, Error)]
pub enum ProvisionError {
  #[error(transparent)]
  Lock(#[from] LockError),

  #[error(transparent)]
  Downloader(#[from] FetchError),

  #[error("failed to read installation root {path}: {source}")]
  ReadInstallRoot {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
  /// Skip the staleness check and rebuild.
  pub skip_rebuild: bool,
}

/// Drives a full provisioning run over a fixed set of targets.
pub struct Provisioner {
  config: ProvisionConfig,
  targets: Vec<Arc<dyn Target>>,
}

impl Provisioner {
  pub fn new(config: ProvisionConfig, targets: Vec<Arc<dyn Target>>) -> Self {
    Self { config, targets }
  }

  /// Build a provisioner with one [`BrowserTarget`] per configured target.
  pub fn from_config(config: ProvisionConfig, show_progress: bool) -> Result<Self, ProvisionError> {
    let downloader = Arc::new(Downloader::new(show_progress)?);
    let targets = config
      .targets
      .iter()
      .map(|spec| {
        Arc::new(BrowserTarget::new(
          spec.clone(),
          downloader.clone(),
          config.project_root.clone(),
          config.command_timeout,
        )) as Arc<dyn Target>
      })
      .collect();

    Ok(Self::new(config, targets))
  }

  /// Run every step while holding the installation root lock.
  pub async fn run(&self, options: RunOptions) -> Result<RunReport, ProvisionError> {
    let start = Instant::now();
    let lock = InstallLock::acquire(&self.config.install_root, "install")?;
    debug!(lock = ?lock.lock_path(), "acquired installation root lock");

    let rebuild = if options.skip_rebuild {
      RebuildOutcome::Skipped
    } else {
      self.rebuild_if_stale().await
    };

    let targets = self.acquire_all().await;
    let cleanup = self.cleanup(false).await?;
    let regenerate = self.regenerate().await;

    let report = RunReport {
      rebuild,
      targets,
      cleanup,
      regenerate,
      elapsed_ms: start.elapsed().as_millis() as u64,
    };

    info!(
      fetched = report.fetched(),
      removed = report.removed().len(),
      warnings = report.warnings().len(),
      "provisioning complete"
    );

    Ok(report)
  }

  /// Run the rebuild command if any compiled artifact is stale.
  ///
  /// A failing rebuild is logged and reported, never propagated.
  pub async fn rebuild_if_stale(&self) -> RebuildOutcome {
    let Some(cmd) = self.config.rebuild_command.as_deref() else {
      debug!("no rebuild command configured");
      return RebuildOutcome::Skipped;
    };

    let report = staleness::scan(
      &self.config.source_root,
      &self.config.compiled_root,
      &self.config.source_ext,
      &self.config.compiled_ext,
    )
    .await;

    if !report.is_rebuild_needed() {
      return RebuildOutcome::UpToDate {
        pairs_checked: report.pairs_checked,
      };
    }

    let stale = report.stale.len();
    info!(stale, "compiled artifacts are stale, rebuilding");

    match run_command(
      cmd,
      &self.config.project_root,
      OutputMode::Silent,
      self.config.command_timeout,
    )
    .await
    {
      Ok(_) => RebuildOutcome::Rebuilt { stale },
      Err(e) => {
        warn!(error = %e, "rebuild failed, continuing with existing artifacts");
        RebuildOutcome::Failed {
          stale,
          reason: e.to_string(),
        }
      }
    }
  }

  /// Acquire every target, in configuration order in the report.
  pub async fn acquire_all(&self) -> Vec<TargetReport> {
    let fetch_timeout = self.config.fetch_timeout;

    if !self.config.concurrent {
      let mut reports = Vec::with_capacity(self.targets.len());
      for target in &self.targets {
        reports.push(acquire_target(target.as_ref(), fetch_timeout).await);
      }
      return reports;
    }

    let mut join_set = JoinSet::new();
    for (index, target) in self.targets.iter().enumerate() {
      let target = target.clone();
      join_set.spawn(async move { (index, acquire_target(target.as_ref(), fetch_timeout).await) });
    }

    let mut slots: Vec<Option<TargetReport>> = (0..self.targets.len()).map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
      match joined {
        Ok((index, report)) => slots[index] = Some(report),
        Err(e) => error!(error = %e, "target task panicked"),
      }
    }

    slots
      .into_iter()
      .zip(&self.targets)
      .map(|(slot, target)| {
        slot.unwrap_or_else(|| TargetReport {
          name: target.name().to_string(),
          install_path: target.install_path().to_path_buf(),
          state: TargetState::FetchFailed {
            reason: "acquisition task panicked".to_string(),
          },
        })
      })
      .collect()
  }

  /// Lock the installation root and remove stale installations.
  pub async fn clean(&self, dry_run: bool) -> Result<Vec<CleanupReport>, ProvisionError> {
    let lock = InstallLock::acquire(&self.config.install_root, "clean")?;
    debug!(lock = ?lock.lock_path(), "acquired installation root lock");
    self.cleanup(dry_run).await
  }

  async fn cleanup(&self, dry_run: bool) -> Result<Vec<CleanupReport>, ProvisionError> {
    let paths = self.cleanup_candidates().await?;
    info!(count = paths.len(), dry_run, "cleaning stale installations");

    if dry_run {
      Ok(cleanup::plan(paths).await)
    } else {
      Ok(cleanup::remove_all(paths).await)
    }
  }

  /// Stale paths, computed from the full target list.
  pub async fn cleanup_candidates(&self) -> Result<Vec<PathBuf>, ProvisionError> {
    let valid: BTreeSet<PathBuf> = self.targets.iter().map(|t| t.install_path().to_path_buf()).collect();

    cleanup::candidates(&self.config.install_root, &valid, &self.config.legacy_paths)
      .await
      .map_err(|source| ProvisionError::ReadInstallRoot {
        path: self.config.install_root.clone(),
        source,
      })
  }

  /// Run the aggregate regeneration command once.
  pub async fn regenerate(&self) -> StepOutcome {
    let Some(cmd) = self.config.regenerate_command.as_deref() else {
      return StepOutcome::Skipped;
    };

    info!("generating types");
    match run_command(
      cmd,
      &self.config.project_root,
      OutputMode::Capture,
      self.config.command_timeout,
    )
    .await
    {
      Ok(_) => StepOutcome::Success,
      Err(e) => {
        warn!(error = %e, "binding regeneration failed");
        StepOutcome::warning(e)
      }
    }
  }

  /// Inspect targets, staleness and cleanup candidates without changing anything.
  pub async fn status(&self) -> Result<StatusReport, ProvisionError> {
    let mut targets = Vec::with_capacity(self.targets.len());
    for target in &self.targets {
      let spec = target.spec();
      targets.push(TargetStatus {
        name: spec.name.clone(),
        engine: spec.engine,
        revision: spec.revision.clone(),
        install_path: spec.install_path.clone(),
        installed: fs::metadata(&spec.install_path).await.is_ok(),
      });
    }

    let staleness = staleness::scan(
      &self.config.source_root,
      &self.config.compiled_root,
      &self.config.source_ext,
      &self.config.compiled_ext,
    )
    .await;

    Ok(StatusReport {
      platform: Platform::current().map(|p| p.to_string()),
      targets,
      staleness,
      cleanup_candidates: self.cleanup_candidates().await?,
    })
  }
}

/// Bring one target to a terminal state.
async fn acquire_target(target: &dyn Target, fetch_timeout: Option<Duration>) -> TargetReport {
  let name = target.name().to_string();
  let install_path = target.install_path().to_path_buf();

  if fs::metadata(&install_path).await.is_ok() {
    debug!(target = %name, path = ?install_path, "already installed");
    return TargetReport {
      name,
      install_path,
      state: TargetState::AlreadyInstalled,
    };
  }

  let fetched = match fetch_timeout {
    Some(limit) => match tokio::time::timeout(limit, target.fetch()).await {
      Ok(result) => result.map_err(|e| e.to_string()),
      Err(_) => Err(format!("timed out after {}s", limit.as_secs())),
    },
    None => target.fetch().await.map_err(|e| e.to_string()),
  };

  let binary = match fetched {
    Ok(binary) => binary,
    Err(reason) => {
      warn!(target = %name, error = %reason, "fetch failed");
      return TargetReport {
        name,
        install_path,
        state: TargetState::FetchFailed { reason },
      };
    }
  };

  let bindings = match target.generate_bindings(&binary).await {
    Ok(()) => StepOutcome::Success,
    Err(TargetError::NoGenerator) => StepOutcome::Skipped,
    Err(e) => {
      warn!(target = %name, error = %e, "binding generation failed");
      StepOutcome::warning(e)
    }
  };

  info!(target = %name, path = ?install_path, "target installed");
  TargetReport {
    name,
    install_path,
    state: TargetState::Installed { binary, bindings },
  }
}
