#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

use throttle_core::{config, ElevationMethod, HelperConfig, SensorConfig};

const FAKE_LAUNCHCTL: &str = r#"#!/bin/sh
here=$(dirname "$0")
marker="$here/registered"
case "$1" in
  load) [ -f "$2" ] || exit 1; touch "$marker" ;;
  unload) [ -f "$marker" ] || exit 3; rm -f "$marker" ;;
  print) [ -f "$marker" ] ;;
  *) exit 2 ;;
esac
"#;

fn macthrottle(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("macthrottle"));
    cmd.env("HOME", home).env("USERPROFILE", home).env_remove("RUST_LOG");
    cmd
}

fn current_owner() -> String {
    let id = |flag: &str| {
        let out = Command::new("id").arg(flag).output().expect("run id");
        String::from_utf8_lossy(&out.stdout).trim().to_string()
    };
    format!("{}:{}", id("-u"), id("-g"))
}

/// Config pointing every path into `root`, written to `<root>/helper.yaml`.
fn sandbox_config(root: &TempDir) -> (HelperConfig, PathBuf) {
    let fake = root.path().join("fake-launchctl.sh");
    fs::write(&fake, FAKE_LAUNCHCTL).expect("write fake launchctl");

    let helper = HelperConfig {
        script_path: root.path().join("bin/mac-throttle-thermal-monitor"),
        descriptor_dir: root.path().join("LaunchDaemons"),
        state_file: root.path().join("state"),
        staging_root: root.path().join("staging"),
        service_manager: vec!["/bin/sh".to_string(), fake.display().to_string()],
        descriptor_owner: Some(current_owner()),
        elevation: ElevationMethod::None,
        sensor: SensorConfig {
            program: "/bin/sh".to_string(),
            args: vec![
                "-c".to_string(),
                "echo 'Current pressure level: Trapping'".to_string(),
            ],
            ..SensorConfig::default()
        },
        ..HelperConfig::default()
    };
    let path = root.path().join("helper.yaml");
    config::save_to(&path, &helper).expect("write config");
    (helper, path)
}

fn status_json(home: &Path, config_path: &Path) -> serde_json::Value {
    let output = macthrottle(home)
        .arg("--config")
        .arg(config_path)
        .args(["status", "--json"])
        .output()
        .expect("run status");
    assert!(output.status.success(), "status failed: {output:?}");
    serde_json::from_slice(&output.stdout).expect("status JSON")
}

#[test]
fn install_update_uninstall_round() {
    let home = TempDir::new().expect("home");
    let root = TempDir::new().expect("root");
    let (helper, config_path) = sandbox_config(&root);

    let before = status_json(home.path(), &config_path);
    assert_eq!(before["state"], "not_installed");
    assert_eq!(before["registered"], false);

    macthrottle(home.path())
        .arg("--config")
        .arg(&config_path)
        .arg("install")
        .assert()
        .success()
        .stdout(contains("Helper installed"));

    let installed = status_json(home.path(), &config_path);
    assert_eq!(installed["state"], "installed_current");
    assert_eq!(installed["needs_update"], false);
    assert_eq!(installed["registered"], true);
    assert_eq!(installed["artifacts"].as_array().map(Vec::len), Some(2));

    macthrottle(home.path())
        .arg("--config")
        .arg(&config_path)
        .arg("install")
        .assert()
        .success()
        .stdout(contains("already installed"));

    let drifted = fs::read_to_string(&helper.script_path)
        .expect("read script")
        .replace("sleep 10", "sleep 11");
    fs::write(&helper.script_path, drifted).expect("write drift");

    macthrottle(home.path())
        .arg("--config")
        .arg(&config_path)
        .arg("install")
        .assert()
        .failure()
        .stderr(contains("macthrottle update"));

    macthrottle(home.path())
        .arg("--config")
        .arg(&config_path)
        .arg("diff")
        .assert()
        .success()
        .stdout(contains("-    sleep 11").and(contains("+    sleep 10")));

    macthrottle(home.path())
        .arg("--config")
        .arg(&config_path)
        .arg("update")
        .assert()
        .success()
        .stdout(contains("Helper updated"));
    assert_eq!(
        status_json(home.path(), &config_path)["state"],
        "installed_current"
    );

    macthrottle(home.path())
        .arg("--config")
        .arg(&config_path)
        .arg("uninstall")
        .assert()
        .success()
        .stdout(contains("Helper uninstalled"));

    let after = status_json(home.path(), &config_path);
    assert_eq!(after["state"], "not_installed");
    assert_eq!(after["registered"], false);
    assert!(!helper.descriptor_path().exists());
}

#[test]
fn update_requires_an_existing_install() {
    let home = TempDir::new().expect("home");
    let root = TempDir::new().expect("root");
    let (_, config_path) = sandbox_config(&root);

    macthrottle(home.path())
        .arg("--config")
        .arg(&config_path)
        .arg("update")
        .assert()
        .failure()
        .stderr(contains("macthrottle install"));
}

#[test]
fn forced_update_replaces_leftover_registration() {
    let home = TempDir::new().expect("home");
    let root = TempDir::new().expect("root");
    let (helper, config_path) = sandbox_config(&root);

    macthrottle(home.path())
        .arg("--config")
        .arg(&config_path)
        .arg("install")
        .assert()
        .success();
    fs::remove_file(&helper.script_path).expect("remove script");

    let orphaned = status_json(home.path(), &config_path);
    assert_eq!(orphaned["state"], "not_installed");
    assert_eq!(orphaned["registered"], true);

    macthrottle(home.path())
        .arg("--config")
        .arg(&config_path)
        .arg("update")
        .assert()
        .failure()
        .stderr(contains("update --force"));

    macthrottle(home.path())
        .arg("--config")
        .arg(&config_path)
        .args(["update", "--force"])
        .assert()
        .success()
        .stdout(contains("Helper updated"));

    let repaired = status_json(home.path(), &config_path);
    assert_eq!(repaired["state"], "installed_current");
    assert_eq!(repaired["registered"], true);
}

#[test]
fn diff_without_install_reports_nothing() {
    let home = TempDir::new().expect("home");
    let root = TempDir::new().expect("root");
    let (_, config_path) = sandbox_config(&root);

    macthrottle(home.path())
        .arg("--config")
        .arg(&config_path)
        .arg("diff")
        .assert()
        .success()
        .stdout(contains("No differences"));
}

#[test]
fn sample_once_writes_and_prints_snapshot() {
    let home = TempDir::new().expect("home");
    let root = TempDir::new().expect("root");
    let (helper, config_path) = sandbox_config(&root);

    macthrottle(home.path())
        .arg("--config")
        .arg(&config_path)
        .args(["sample", "--once"])
        .assert()
        .success()
        .stdout(contains(r#""pressure":"trapping""#));

    let written = fs::read_to_string(&helper.state_file).expect("state file");
    assert!(written.contains(r#""pressure":"trapping""#));

    let status = status_json(home.path(), &config_path);
    assert_eq!(status["snapshot"]["pressure"], "trapping");
    assert_eq!(status["snapshot"]["throttling"], true);
}
