//! Per-target binding generation.
//!
//! A generator is an opaque shell command. Its template may reference the
//! target through `{binary}`, `{name}`, `{engine}`, `{revision}` and
//! `{install_path}`; anything else in braces is passed through untouched.

use std::path::Path;
use std::time::Duration;

use tracing::info;

use crate::command::{CommandError, OutputMode, run_command};
use crate::target::TargetSpec;

/// Expand the placeholders in `template` for `spec`.
pub fn render(template: &str, spec: &TargetSpec, input: &Path) -> String {
  let install_path = spec.install_path.to_string_lossy();
  let input = input.to_string_lossy();

  [
    ("{binary}", input.as_ref()),
    ("{name}", spec.name.as_str()),
    ("{engine}", spec.engine.as_str()),
    ("{revision}", spec.revision.as_str()),
    ("{install_path}", install_path.as_ref()),
  ]
  .into_iter()
  .fold(template.to_string(), |acc, (key, value)| acc.replace(key, value))
}

/// Run the generator for `spec` against `input`, from `cwd`.
pub async fn generate(
  template: &str,
  spec: &TargetSpec,
  input: &Path,
  cwd: &Path,
  timeout: Option<Duration>,
) -> Result<String, CommandError> {
  let cmd = render(template, spec, input);
  info!(target = %spec.name, input = ?input, "generating bindings");
  run_command(&cmd, cwd, OutputMode::Capture, timeout).await
}
