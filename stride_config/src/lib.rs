#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and accelerometer recording parsing for the stride estimator.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The recording CSV loader enforces headers and timestamp ordering so a
//!   replayed session sees samples in the same order the sensor produced them.
use serde::Deserialize;

/// Recording CSV schema.
///
/// Expected headers:
/// timestamp_ns,x,y,z
///
/// Example:
/// timestamp_ns,x,y,z
/// 0,0.12,0.03,9.79
/// 20000000,0.15,0.01,9.92
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct RecordingRow {
    pub timestamp_ns: u64,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Deserialize)]
pub struct FilterCfg {
    /// Smoothing factor of the gravity (low-pass) estimate, in (0.0, 1.0).
    #[serde(default = "default_gravity_alpha")]
    pub gravity_alpha: f32,
    /// Sampler pacing for the simulated or polled sensor.
    pub sample_rate_hz: u32,
}

fn default_gravity_alpha() -> f32 {
    0.8
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DetectorCfg {
    /// Magnitude (m/s²) the linear acceleration must exceed to arm the detector.
    pub threshold_mps2: f32,
}

impl Default for DetectorCfg {
    fn default() -> Self {
        Self {
            threshold_mps2: 1.8,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SpeedCfg {
    /// Step intervals at or below this are treated as noise.
    pub min_step_interval_ms: u64,
    /// Speed drops to zero when no step arrives for this long.
    pub stop_timeout_ms: u64,
}

impl Default for SpeedCfg {
    fn default() -> Self {
        Self {
            min_step_interval_ms: 200,
            stop_timeout_ms: 2_500,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct UserCfg {
    /// Body height in centimetres; used to derive the stride when `stride_m` is absent.
    pub height_cm: Option<f32>,
    /// Explicit stride length in metres; takes precedence over `height_cm`.
    pub stride_m: Option<f32>,
    /// Overspeed threshold in m/s. Absent or 0 disables the alert.
    pub speed_limit_mps: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Sensor timeout per read (ms). Also accepts alias "sensor_ms".
    #[serde(alias = "sensor_ms")]
    pub sample_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { sample_ms: 100 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Sampler,
    Direct,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RunnerCfg {
    /// Default orchestration mode: "sampler" (rate-paced thread) or "direct"
    pub mode: RunMode,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub filter: FilterCfg,
    #[serde(default)]
    pub detector: DetectorCfg,
    #[serde(default)]
    pub speed: SpeedCfg,
    #[serde(default)]
    pub user: UserCfg,
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default)]
    pub logging: Logging,
    /// Runner/orchestration defaults
    #[serde(default)]
    pub runner: RunnerCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Load an accelerometer recording, enforcing the `timestamp_ns,x,y,z` header
/// and non-decreasing timestamps.
pub fn load_recording_csv(path: &std::path::Path) -> eyre::Result<Vec<RecordingRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open recording CSV {:?}: {}", path, e))?;

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["timestamp_ns", "x", "y", "z"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "recording CSV must have headers 'timestamp_ns,x,y,z', got: {}",
            actual.join(",")
        );
    }

    let mut rows: Vec<RecordingRow> = Vec::new();
    for (idx, rec) in rdr.deserialize::<RecordingRow>().enumerate() {
        let row = match rec {
            Ok(row) => row,
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        };
        if let Some(prev) = rows.last()
            && row.timestamp_ns < prev.timestamp_ns
        {
            eyre::bail!(
                "recording timestamps must be non-decreasing (row {}: {} < {})",
                idx + 2,
                row.timestamp_ns,
                prev.timestamp_ns
            );
        }
        rows.push(row);
    }

    if rows.is_empty() {
        eyre::bail!("recording CSV {:?} contains no samples", path);
    }
    Ok(rows)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Filter
        if !(self.filter.gravity_alpha > 0.0 && self.filter.gravity_alpha < 1.0) {
            eyre::bail!("filter.gravity_alpha must be in (0.0, 1.0)");
        }
        if self.filter.sample_rate_hz == 0 {
            eyre::bail!("filter.sample_rate_hz must be > 0");
        }
        if self.filter.sample_rate_hz > 10_000 {
            eyre::bail!("filter.sample_rate_hz is unreasonably large (>10kHz)");
        }

        // Detector
        if !(self.detector.threshold_mps2.is_finite() && self.detector.threshold_mps2 > 0.0) {
            eyre::bail!("detector.threshold_mps2 must be > 0");
        }

        // Speed
        if self.speed.stop_timeout_ms == 0 {
            eyre::bail!("speed.stop_timeout_ms must be >= 1");
        }
        if self.speed.stop_timeout_ms > 60_000 {
            eyre::bail!("speed.stop_timeout_ms is unreasonably large (>60s)");
        }
        if self.speed.min_step_interval_ms >= self.speed.stop_timeout_ms {
            eyre::bail!("speed.min_step_interval_ms must be < speed.stop_timeout_ms");
        }

        // User
        if let Some(h) = self.user.height_cm
            && !(h.is_finite() && h > 0.0 && h <= 300.0)
        {
            eyre::bail!("user.height_cm must be in (0, 300]");
        }
        if let Some(s) = self.user.stride_m
            && !(s.is_finite() && s > 0.0 && s <= 3.0)
        {
            eyre::bail!("user.stride_m must be in (0.0, 3.0]");
        }
        if let Some(limit) = self.user.speed_limit_mps
            && !(limit.is_finite() && limit >= 0.0)
        {
            eyre::bail!("user.speed_limit_mps must be >= 0.0");
        }

        // Timeouts
        if self.timeouts.sample_ms == 0 {
            eyre::bail!("timeouts.sample_ms must be >= 1");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let cfg = load_toml("[filter]\nsample_rate_hz = 50\n").expect("parse");
        assert!((cfg.filter.gravity_alpha - 0.8).abs() < f32::EPSILON);
        assert!((cfg.detector.threshold_mps2 - 1.8).abs() < f32::EPSILON);
        assert_eq!(cfg.speed.min_step_interval_ms, 200);
        assert_eq!(cfg.speed.stop_timeout_ms, 2_500);
        assert_eq!(cfg.timeouts.sample_ms, 100);
        assert_eq!(cfg.runner.mode, RunMode::Sampler);
        assert!(cfg.user.height_cm.is_none());
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn sensor_ms_alias_is_accepted() {
        let cfg = load_toml("[filter]\nsample_rate_hz = 50\n[timeouts]\nsensor_ms = 40\n")
            .expect("parse");
        assert_eq!(cfg.timeouts.sample_ms, 40);
    }

    #[test]
    fn runner_mode_parses_lowercase() {
        let cfg = load_toml("[filter]\nsample_rate_hz = 50\n[runner]\nmode = \"direct\"\n")
            .expect("parse");
        assert_eq!(cfg.runner.mode, RunMode::Direct);
    }
}
