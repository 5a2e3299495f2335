use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[filter]
sample_rate_hz = 50

[timeouts]
sample_ms = 50
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case::direct(&["walk", "--direct"])]
#[case::sampler(&["walk"])]
#[case::self_check(&["self-check"])]
fn sensor_timeout_maps_to_exit_3(#[case] args: &[&str]) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);

    let mut cmd = Command::cargo_bin("stride_cli").unwrap();
    cmd.env("STRIDE_TEST_SIM_TIMEOUT", "1")
        .arg("--config")
        .arg(&cfg)
        .args(args);

    cmd.assert()
        .code(3)
        .stderr(predicate::str::contains(
            "What happened: Accelerometer read timed out",
        ));
}

#[test]
fn sensor_timeout_json_reason() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);

    let out = Command::cargo_bin("stride_cli")
        .unwrap()
        .env("STRIDE_TEST_SIM_TIMEOUT", "1")
        .arg("--config")
        .arg(&cfg)
        .args(["--json", "walk", "--direct"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));
    let stdout = String::from_utf8_lossy(&out.stdout);
    let last = stdout.lines().last().expect("error line");
    let v: serde_json::Value = serde_json::from_str(last).unwrap();
    assert_eq!(v["event"], "error");
    assert_eq!(v["reason"], "SensorTimeout");
    assert!(v["message"].as_str().unwrap().contains("timed out"));
}
