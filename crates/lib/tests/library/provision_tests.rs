//! End-to-end runs of the provisioner against a local archive server.

use std::io::Write;
use std::path::Path;

use provision_lib::config::{ConfigFile, ProvisionConfig, TargetEntry};
use provision_lib::provision::{CleanupOutcome, Provisioner, RunOptions, StepOutcome, TargetState};
use provision_lib::target::Engine;
use tempfile::TempDir;

fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
  let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
  for (name, body) in files {
    writer
      .start_file(*name, zip::write::SimpleFileOptions::default())
      .unwrap();
    writer.write_all(body.as_bytes()).unwrap();
  }
  writer.finish().unwrap().into_inner()
}

fn entry(name: &str, engine: Engine, url: String) -> TargetEntry {
  TargetEntry {
    name: name.to_string(),
    engine,
    revision: Some("7".to_string()),
    url: Some(url),
    install_dir: None,
    bindings_command: Some("echo ok > bindings-{name}.txt".to_string()),
  }
}

fn config(root: &Path, targets: Vec<TargetEntry>) -> ProvisionConfig {
  let file = ConfigFile {
    rebuild_command: Some(String::new()),
    regenerate_command: Some("echo ok > regenerated.txt".to_string()),
    legacy_paths: Some(vec![".local-chromium".into()]),
    targets,
    ..ConfigFile::default()
  };
  ProvisionConfig::resolve(file, root, None).unwrap()
}

#[tokio::test]
async fn fresh_project_is_fully_provisioned() {
  let mut server = mockito::Server::new_async().await;
  let firefox = server
    .mock("GET", "/firefox.zip")
    .with_status(200)
    .with_body(zip_bytes(&[("firefox/firefox", "binary")]))
    .expect(1)
    .create_async()
    .await;
  let webkit = server
    .mock("GET", "/webkit.zip")
    .with_status(200)
    .with_body(zip_bytes(&[("pw_run.sh", "#!/bin/sh\n")]))
    .expect(1)
    .create_async()
    .await;

  let temp = TempDir::new().unwrap();
  let root = temp.path();
  std::fs::create_dir_all(root.join(".local-chromium/old")).unwrap();
  std::fs::create_dir_all(root.join(".local-browsers/firefox-6")).unwrap();

  let provisioner = Provisioner::from_config(
    config(
      root,
      vec![
        entry("firefox", Engine::Firefox, format!("{}/firefox.zip", server.url())),
        entry("webkit", Engine::Webkit, format!("{}/webkit.zip", server.url())),
      ],
    ),
    false,
  )
  .unwrap();

  let report = provisioner.run(RunOptions::default()).await.unwrap();

  firefox.assert_async().await;
  webkit.assert_async().await;

  assert!(root.join(".local-browsers/firefox-7/firefox/firefox").is_file());
  assert!(root.join(".local-browsers/webkit-7/pw_run.sh").is_file());
  assert!(root.join("bindings-firefox.txt").is_file());
  assert!(root.join("bindings-webkit.txt").is_file());
  assert!(root.join("regenerated.txt").is_file());
  assert!(!root.join(".local-chromium").exists());
  assert!(!root.join(".local-browsers/firefox-6").exists());

  for target in &report.targets {
    assert!(matches!(
      &target.state,
      TargetState::Installed { bindings: StepOutcome::Success, .. }
    ));
  }
  assert_eq!(report.removed().len(), 2);
  assert!(report.warnings().is_empty());
}

#[tokio::test]
async fn broken_download_is_retried_on_next_run() {
  let mut server = mockito::Server::new_async().await;
  let failing = server
    .mock("GET", "/firefox.zip")
    .with_status(500)
    .expect(1)
    .create_async()
    .await;

  let temp = TempDir::new().unwrap();
  let url = format!("{}/firefox.zip", server.url());
  let provisioner = Provisioner::from_config(
    config(temp.path(), vec![entry("firefox", Engine::Firefox, url)]),
    false,
  )
  .unwrap();

  let first = provisioner.run(RunOptions::default()).await.unwrap();

  failing.assert_async().await;
  assert!(matches!(
    &first.targets[0].state,
    TargetState::FetchFailed { reason } if reason.contains("500")
  ));
  assert!(!temp.path().join(".local-browsers/firefox-7").exists());
  // No staging leftovers are mistaken for stale installs on the next pass.
  assert!(
    first
      .cleanup
      .iter()
      .all(|c| c.outcome == CleanupOutcome::Absent)
  );

  failing.remove_async().await;
  let working = server
    .mock("GET", "/firefox.zip")
    .with_status(200)
    .with_body(zip_bytes(&[("firefox/firefox", "binary")]))
    .expect(1)
    .create_async()
    .await;

  let second = provisioner.run(RunOptions::default()).await.unwrap();

  working.assert_async().await;
  assert!(second.targets[0].was_fetched());
  assert!(temp.path().join(".local-browsers/firefox-7/firefox/firefox").is_file());
}
