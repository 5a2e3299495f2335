//! Configuration types for the speed engine.
//!
//! These are the runtime configuration structs used by `SpeedEngine`.
//! They are separate from the TOML-deserialized config in `stride_config`.

/// Gravity filter and sampling configuration.
#[derive(Debug, Clone)]
pub struct FilterCfg {
    /// Weight of the previous gravity estimate, in (0.0, 1.0). Default: 0.8.
    pub gravity_alpha: f32,
    /// Sampling rate in Hz (drives sampler pacing only).
    pub sample_rate_hz: u32,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            gravity_alpha: 0.8,
            sample_rate_hz: 50,
        }
    }
}

/// Peak detector configuration.
#[derive(Debug, Clone)]
pub struct DetectorCfg {
    /// Linear-acceleration magnitude (m/s²) that arms the detector. Default: 1.8.
    pub threshold_mps2: f32,
}

impl Default for DetectorCfg {
    fn default() -> Self {
        Self {
            threshold_mps2: 1.8,
        }
    }
}

/// Speed estimation and stop-timeout configuration.
#[derive(Debug, Clone)]
pub struct SpeedCfg {
    /// Step intervals at or below this many ms are discarded as noise. Default: 200.
    pub min_step_interval_ms: u64,
    /// Speed is forced to zero after this many ms without a step. Default: 2500.
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
