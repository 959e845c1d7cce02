//! Shell command execution.
//!
//! The rebuild step, per-target binding generators and the aggregate
//! regeneration step are all opaque shell commands. This module runs them
//! through the platform shell with an optional time limit.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CommandError {
  #[error("failed to spawn `{cmd}`: {source}")]
  Spawn {
    cmd: String,
    #[source]
    source: std::io::Error,
  },

  #[error("command failed with exit code {code:?}: {cmd}")]
  Failed { cmd: String, code: Option<i32> },

  #[error("command timed out after {}s: {cmd}", after.as_secs())]
  TimedOut { cmd: String, after: Duration },
}

/// What happens to a command's stdout and stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
  /// Capture both streams; stdout is returned, stderr is logged on failure.
  Capture,
  /// Discard both streams.
  Silent,
}

/// Run `cmd` through the platform shell in `cwd`.
///
/// Returns the trimmed stdout on success (empty in [`OutputMode::Silent`]).
/// With a `timeout`, the child is killed once it expires.
pub async fn run_command(
  cmd: &str,
  cwd: &Path,
  mode: OutputMode,
  timeout: Option<Duration>,
) -> Result<String, CommandError> {
  debug!(cmd = %cmd, "executing command");

  let (shell_cmd, shell_args) = get_shell();

  let mut command = Command::new(shell_cmd);
  command
    .args(shell_args)
    .arg(cmd)
    .current_dir(cwd)
    .stdin(Stdio::null())
    .kill_on_drop(true);

  match mode {
    OutputMode::Capture => {
      command.stdout(Stdio::piped()).stderr(Stdio::piped());
    }
    OutputMode::Silent => {
      command.stdout(Stdio::null()).stderr(Stdio::null());
    }
  }

  debug!(shell = %shell_cmd, cwd = ?cwd, "spawning process");

  let pending = command.output();
  let output = match timeout {
    Some(limit) => match tokio::time::timeout(limit, pending).await {
      Ok(result) => result,
      Err(_) => {
        return Err(CommandError::TimedOut {
          cmd: cmd.to_string(),
          after: limit,
        });
      }
    },
    None => pending.await,
  }
  .map_err(|source| CommandError::Spawn {
    cmd: cmd.to_string(),
    source,
  })?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
      debug!(stderr = %stderr, "command stderr");
    }

    return Err(CommandError::Failed {
      cmd: cmd.to_string(),
      code: output.status.code(),
    });
  }

  let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
  if !stdout.is_empty() {
    debug!(stdout = %stdout, "command output");
  }

  Ok(stdout)
}

/// Shell binary and the flags that make it run a command string.
///
/// The user's `$SHELL` is ignored; `/bin/sh` behaves the same everywhere.
fn get_shell() -> (&'static str, &'static [&'static str]) {
  #[cfg(unix)]
  const SHELL: (&str, &[&str]) = ("/bin/sh", &["-c"]);

  #[cfg(windows)]
  const SHELL: (&str, &[&str]) = ("cmd.exe", &["/C"]);

  SHELL
}
