use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Minimal valid TOML config; every section but [filter] has defaults
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[filter]
gravity_alpha = 0.8
sample_rate_hz = 50

[timeouts]
sample_ms = 100
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

/// Gravity-free recording sampled every 10 ms with spikes producing steps at
/// 100, 600 and 1100 ms.
fn write_recording(dir: &tempfile::TempDir) -> PathBuf {
    let mut csv = String::from("timestamp_ns,x,y,z\n");
    for k in 0..=120u64 {
        let t_ms = k * 10;
        let z = if [90, 590, 1090].contains(&t_ms) { 10.0 } else { 0.0 };
        csv.push_str(&format!("{},0,0,{z}\n", t_ms * 1_000_000));
    }
    let path = dir.path().join("walk.csv");
    fs::write(&path, csv).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["stride", "--height-cm", "170"], 0, "0.765 m", "stdout")]
#[case(&["stride", "--height-cm", "-5"], 2, "positive number", "stderr")]
#[case(&["stride", "--height-cm", "tall"], 2, "positive number", "stderr")]
#[case(&["stride"], 2, "required", "stderr")]
#[case(&["self-check"], 0, "OK: sensor responded", "stdout")]
#[case(&["walk", "--fast", "--walk-ms", "2000", "--idle-ms", "500"], 0, "Session summary", "stdout")]
#[case(&["walk", "--fast", "--stride-m", "0"], 2, "positive number", "stderr")]
#[case(&["walk", "--fast", "--stride-m", "-1"], 2, "positive number", "stderr")]
#[case(&["walk", "--fast", "--speed-limit", "-1"], 2, ">= 0 m/s", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("stride_cli").unwrap();

    // Always include a valid config to avoid relying on built-in defaults
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        _ => {
            assert.stderr(predicate::str::contains(needle));
        }
    }
}

#[test]
fn replay_prints_speeds_stop_and_summary() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let input = write_recording(&dir);

    let out = Command::cargo_bin("stride_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .args(["replay", "--stride-m", "0.7", "--input"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(stdout.matches("speed 1.40 m/s").count(), 2, "{stdout}");
    assert!(stdout.contains("stopped"), "{stdout}");
    assert!(stdout.contains("steps: 3 (0 rejected as noise)"), "{stdout}");
}

#[test]
fn replay_speed_limit_raises_alerts() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let input = write_recording(&dir);

    Command::cargo_bin("stride_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .args(["replay", "--stride-m", "0.7", "--speed-limit", "1.0", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("OVERSPEED 1.40 m/s (limit 1.00 m/s)"))
        .stdout(predicate::str::contains("overspeed alerts: 2"));
}

#[test]
fn replay_rejects_bad_headers() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let input = dir.path().join("bad.csv");
    fs::write(&input, "t,x,y,z\n0,0,0,9.81\n").unwrap();

    Command::cargo_bin("stride_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .args(["replay", "--input"])
        .arg(&input)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Expected 'timestamp_ns,x,y,z'"));
}

#[rstest]
#[case::out_of_range("[filter]\ngravity_alpha = 1.5\nsample_rate_hz = 50\n", "gravity_alpha")]
#[case::missing_filter("[speed]\nstop_timeout_ms = 2500\n", "filter")]
#[case::interval_above_timeout(
    "[filter]\nsample_rate_hz = 50\n[speed]\nmin_step_interval_ms = 3000\nstop_timeout_ms = 2500\n",
    "min_step_interval_ms"
)]
fn invalid_config_exits_with_config_code(#[case] toml: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, toml).unwrap();

    Command::cargo_bin("stride_cli")
        .unwrap()
        .arg("--config")
        .arg(&path)
        .arg("self-check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("What happened: Configuration is invalid"))
        .stderr(predicate::str::contains(needle));
}

#[test]
fn missing_config_file_is_a_config_error() {
    let dir = tempdir().unwrap();
    Command::cargo_bin("stride_cli")
        .unwrap()
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .arg("self-check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn built_in_defaults_apply_without_config() {
    Command::cargo_bin("stride_cli")
        .unwrap()
        .arg("self-check")
        .assert()
        .success()
        .stdout(predicate::str::contains("stride 0.762 m"));
}
