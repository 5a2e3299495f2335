//! `From` implementations bridging `stride_config` types to `stride_core` types.

use stride_traits::AccelSample;

use crate::config::{DetectorCfg, FilterCfg, SpeedCfg};
use crate::runner::{RunParams, SamplingMode};
use crate::settings::{DEFAULT_STRIDE_M, SharedSettings, stride_from_height_cm};

// ── FilterCfg ────────────────────────────────────────────────────────────────

impl From<&stride_config::FilterCfg> for FilterCfg {
    fn from(c: &stride_config::FilterCfg) -> Self {
        Self {
            gravity_alpha: c.gravity_alpha,
            sample_rate_hz: c.sample_rate_hz,
        }
    }
}

// ── DetectorCfg ──────────────────────────────────────────────────────────────

impl From<&stride_config::DetectorCfg> for DetectorCfg {
    fn from(c: &stride_config::DetectorCfg) -> Self {
        Self {
            threshold_mps2: c.threshold_mps2,
        }
    }
}

// ── SpeedCfg ─────────────────────────────────────────────────────────────────

impl From<&stride_config::SpeedCfg> for SpeedCfg {
    fn from(c: &stride_config::SpeedCfg) -> Self {
        Self {
            min_step_interval_ms: c.min_step_interval_ms,
            stop_timeout_ms: c.stop_timeout_ms,
        }
    }
}

// ── Settings ─────────────────────────────────────────────────────────────────

/// Explicit stride wins over height; neither means the default stride.
impl From<&stride_config::UserCfg> for SharedSettings {
    fn from(c: &stride_config::UserCfg) -> Self {
        let stride = c
            .stride_m
            .or(c.height_cm.map(stride_from_height_cm))
            .unwrap_or(DEFAULT_STRIDE_M);
        SharedSettings::new(stride, c.speed_limit_mps.unwrap_or(0.0))
    }
}

// ── RunParams ────────────────────────────────────────────────────────────────

impl From<&stride_config::Config> for RunParams {
    fn from(c: &stride_config::Config) -> Self {
        let mode = match c.runner.mode {
            stride_config::RunMode::Sampler => SamplingMode::Paced(c.filter.sample_rate_hz),
            stride_config::RunMode::Direct => SamplingMode::Direct,
        };
        Self {
            mode,
            sample_rate_hz: c.filter.sample_rate_hz,
            sensor_timeout_ms: c.timeouts.sample_ms,
            max_run_ms: None,
        }
    }
}

// ── Recording rows ───────────────────────────────────────────────────────────

/// One recorded CSV row as an engine sample.
#[inline]
pub fn sample_from_row(row: &stride_config::RecordingRow) -> AccelSample {
    AccelSample::new(row.timestamp_ns, row.x, row.y, row.z)
}
