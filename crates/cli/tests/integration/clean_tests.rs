use predicates::prelude::*;

use super::common::{OFFLINE_CONFIG, TestEnv};

#[test]
fn clean_removes_stale_and_legacy_dirs() {
  let env = TestEnv::with_config(OFFLINE_CONFIG);
  let stale = env.provisioned();
  let legacy = env.mkdir(".local-chromium");

  env
    .provision_cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Cleanup complete"));

  assert!(!stale.exists());
  assert!(!legacy.exists());
  assert!(env.root().join("browsers/chromium-1").is_dir());
}

#[test]
fn clean_dry_run_changes_nothing() {
  let env = TestEnv::with_config(OFFLINE_CONFIG);
  let stale = env.provisioned();

  env
    .provision_cmd()
    .args(["clean", "--dry-run"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Dry run"))
    .stdout(predicate::str::contains("old-legacy-browser"));

  assert!(stale.exists());
}

#[test]
fn clean_json_output_is_valid() {
  let env = TestEnv::with_config(OFFLINE_CONFIG);
  env.provisioned();

  let output = env
    .provision_cmd()
    .args(["clean", "--dry-run", "-o", "json"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["dry_run"], true);
  let entries = json["entries"].as_array().unwrap();
  assert!(entries.iter().any(|e| e["status"] == "would_remove"));
  assert!(entries.iter().any(|e| e["status"] == "absent"));
}

#[test]
fn clean_without_install_root_succeeds() {
  let env = TestEnv::with_config(OFFLINE_CONFIG);

  env
    .provision_cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Removed: 0"));
}
