use predicates::prelude::*;

use super::common::{OFFLINE_CONFIG, TestEnv};

#[test]
fn install_skips_present_targets_and_removes_stale() {
  let env = TestEnv::with_config(OFFLINE_CONFIG);
  let stale = env.provisioned();

  env
    .provision_cmd()
    .arg("install")
    .assert()
    .success()
    .stdout(predicate::str::contains("chromium already installed"))
    .stdout(predicate::str::contains("firefox already installed"))
    .stdout(predicate::str::contains("old-legacy-browser"))
    .stdout(predicate::str::contains("Provisioning complete"));

  assert!(!stale.exists());
  assert!(env.root().join("browsers/chromium-1").is_dir());
  assert!(env.root().join("browsers/firefox-2").is_dir());
}

#[test]
fn install_is_the_default_command() {
  let env = TestEnv::with_config(OFFLINE_CONFIG);
  env.provisioned();

  env
    .provision_cmd()
    .assert()
    .success()
    .stdout(predicate::str::contains("Provisioning complete"));
}

#[test]
fn failed_fetch_is_a_warning_not_an_error() {
  let env = TestEnv::with_config(OFFLINE_CONFIG);
  env.mkdir("browsers/chromium-1");

  env
    .provision_cmd()
    .arg("install")
    .assert()
    .success()
    .stderr(predicate::str::contains("firefox: fetch failed"))
    .stderr(predicate::str::contains("binding regeneration failed"));

  assert!(!env.root().join("browsers/firefox-2").exists());
}

#[test]
fn install_json_output_is_valid() {
  let env = TestEnv::with_config(OFFLINE_CONFIG);
  env.provisioned();

  let output = env
    .provision_cmd()
    .args(["install", "-o", "json"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["rebuild"]["status"], "skipped");
  assert_eq!(report["targets"][0]["name"], "chromium");
  assert_eq!(report["targets"][0]["status"], "already_installed");
  assert_eq!(report["regenerate"]["status"], "warning");
  assert!(
    report["cleanup"]
      .as_array()
      .unwrap()
      .iter()
      .any(|entry| entry["status"] == "removed")
  );
}

#[test]
fn explicit_config_path_is_honoured() {
  let env = TestEnv::with_config(OFFLINE_CONFIG);
  env.provisioned();
  let elsewhere = tempfile::TempDir::new().unwrap();

  let mut cmd = env.provision_cmd();
  cmd.current_dir(elsewhere.path());
  cmd
    .arg("install")
    .arg("--config")
    .arg(&env.config_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("chromium already installed"));

  assert!(!env.root().join("browsers/old-legacy-browser").exists());
}

#[test]
fn invalid_config_fails() {
  let env = TestEnv::with_config("unknown_key = 1\n");

  env
    .provision_cmd()
    .arg("install")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn install_reports_phase_transitions() {
  let env = TestEnv::with_config(OFFLINE_CONFIG);
  env.provisioned();

  env
    .provision_cmd()
    .arg("install")
    .assert()
    .success()
    .stderr(predicate::str::contains("cleaning stale installations"))
    .stderr(predicate::str::contains("generating types"))
    .stderr(predicate::str::contains("loaded config").not());
}

#[test]
fn verbose_flag_enables_debug_logs() {
  let env = TestEnv::with_config(OFFLINE_CONFIG);
  env.provisioned();

  env
    .provision_cmd()
    .args(["-v", "install"])
    .assert()
    .success()
    .stderr(predicate::str::contains("loaded config"));
}
