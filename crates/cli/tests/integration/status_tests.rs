use predicates::prelude::*;

use super::common::{OFFLINE_CONFIG, TestEnv};

#[test]
fn status_lists_targets_without_side_effects() {
  let env = TestEnv::with_config(OFFLINE_CONFIG);
  env.mkdir("browsers/chromium-1");
  let stale = env.mkdir("browsers/old-legacy-browser");

  env
    .provision_cmd()
    .arg("status")
    .assert()
    .success()
    .stdout(predicate::str::contains("Platform"))
    .stdout(predicate::str::contains("chromium (chromium r1)"))
    .stdout(predicate::str::contains("Cleanup candidates"))
    .stderr(predicate::str::contains("firefox (firefox r2) not installed"));

  assert!(stale.exists());
  assert!(!env.root().join("browsers/.lock").exists());
}

#[test]
fn status_json_reports_staleness() {
  let env = TestEnv::with_config(OFFLINE_CONFIG);
  env.mkdir("src");
  std::fs::write(env.root().join("src/index.ts"), "export {}").unwrap();

  let output = env
    .provision_cmd()
    .args(["status", "-o", "json"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["staleness"]["pairs_checked"], 1);
  assert_eq!(json["staleness"]["stale"].as_array().unwrap().len(), 1);
  assert_eq!(json["targets"][1]["installed"], false);
  assert!(json.get("platform").is_some());
}
