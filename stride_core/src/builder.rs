//! Type-state builder for `Engine` and generic `build_engine` constructor.
//!
//! The builder enforces at compile time that a sink is provided before `build()`
//! is available. `try_build()` is always available for dynamic checks.

use std::marker::PhantomData;

use stride_traits::SpeedSink;

use crate::config::*;
use crate::engine::SpeedEngine;
use crate::error::{BuildError, Result};
use crate::gravity::GravityFilter;
use crate::peak::PeakDetector;
use crate::settings::{SharedSettings, stride_from_height_cm};
use crate::speed::SpeedEstimator;
use crate::timer::StopTimer;

/// Dynamically dispatched engine as produced by `EngineBuilder`.
pub type Engine = SpeedEngine<Box<dyn SpeedSink + Send>>;

impl Engine {
    /// Start building an Engine.
    pub fn builder() -> EngineBuilder<Missing> {
        EngineBuilder::default()
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Engine`. All fields are validated on `build()`.
pub struct EngineBuilder<K> {
    sink: Option<Box<dyn SpeedSink + Send>>,
    filter: Option<FilterCfg>,
    detector: Option<DetectorCfg>,
    speed: Option<SpeedCfg>,
    settings: Option<SharedSettings>,
    stride_m: Option<f32>,
    height_cm: Option<f32>,
    speed_limit_mps: Option<f32>,
    _k: PhantomData<K>,
}

impl Default for EngineBuilder<Missing> {
    fn default() -> Self {
        Self {
            sink: None,
            filter: None,
            detector: None,
            speed: None,
            settings: None,
            stride_m: None,
            height_cm: None,
            speed_limit_mps: None,
            _k: PhantomData,
        }
    }
}

/// Validate configuration and construct a `SpeedEngine`.
///
/// Shared by `EngineBuilder::try_build()` and `build_engine()`.
fn validate_and_build<K: SpeedSink>(
    sink: K,
    filter: FilterCfg,
    detector: DetectorCfg,
    speed: SpeedCfg,
    settings: SharedSettings,
) -> Result<SpeedEngine<K>> {
    if !(filter.gravity_alpha > 0.0 && filter.gravity_alpha < 1.0) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "gravity_alpha must be in (0.0, 1.0)",
        )));
    }
    if filter.sample_rate_hz == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "sample_rate_hz must be > 0",
        )));
    }
    if !(detector.threshold_mps2.is_finite() && detector.threshold_mps2 > 0.0) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "threshold_mps2 must be > 0",
        )));
    }
    if speed.stop_timeout_ms == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "stop_timeout_ms must be >= 1",
        )));
    }
    if speed.min_step_interval_ms >= speed.stop_timeout_ms {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "min_step_interval_ms must be < stop_timeout_ms",
        )));
    }

    Ok(SpeedEngine::from_parts(
        sink,
        settings,
        GravityFilter::new(filter.gravity_alpha),
        PeakDetector::new(detector.threshold_mps2),
        SpeedEstimator::new(speed.min_step_interval_ms),
        StopTimer::new(speed.stop_timeout_ms),
    ))
}

impl<K> EngineBuilder<K> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Engine> {
        let settings = self.resolve_settings()?;
        let sink = self
            .sink
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSink))?;
        validate_and_build(
            sink,
            self.filter.unwrap_or_default(),
            self.detector.unwrap_or_default(),
            self.speed.unwrap_or_default(),
            settings,
        )
    }

    /// Apply stride/height/limit overrides on top of the provided (or default) handle.
    ///
    /// An explicit stride wins over a height-derived one.
    fn resolve_settings(&self) -> Result<SharedSettings> {
        let settings = self.settings.clone().unwrap_or_default();
        if let Some(h) = self.height_cm {
            if !(h.is_finite() && h > 0.0) {
                return Err(eyre::Report::new(BuildError::InvalidConfig(
                    "height_cm must be > 0",
                )));
            }
            settings.set_stride_length(stride_from_height_cm(h))?;
        }
        if let Some(s) = self.stride_m {
            if !(s.is_finite() && s > 0.0) {
                return Err(eyre::Report::new(BuildError::InvalidConfig(
                    "stride_m must be > 0",
                )));
            }
            settings.set_stride_length(s)?;
        }
        if let Some(limit) = self.speed_limit_mps {
            settings.set_speed_limit(limit);
        }
        Ok(settings)
    }
}

/// Chainable setters that do not affect type-state.
impl<K> EngineBuilder<K> {
    pub fn with_filter(mut self, filter: FilterCfg) -> Self {
        self.filter = Some(filter);
        self
    }
    pub fn with_detector(mut self, detector: DetectorCfg) -> Self {
        self.detector = Some(detector);
        self
    }
    pub fn with_speed(mut self, speed: SpeedCfg) -> Self {
        self.speed = Some(speed);
        self
    }
    /// Share an existing settings handle (e.g. one also held by a UI thread).
    pub fn with_settings(mut self, settings: SharedSettings) -> Self {
        self.settings = Some(settings);
        self
    }
    pub fn with_stride(mut self, stride_m: f32) -> Self {
        self.stride_m = Some(stride_m);
        self
    }
    pub fn with_height_cm(mut self, height_cm: f32) -> Self {
        self.height_cm = Some(height_cm);
        self
    }
    /// `0.0` disables the overspeed alert.
    pub fn with_speed_limit(mut self, speed_limit_mps: f32) -> Self {
        self.speed_limit_mps = Some(speed_limit_mps);
        self
    }
}

// Setter that advances type-state
impl EngineBuilder<Missing> {
    pub fn with_sink(self, sink: impl SpeedSink + Send + 'static) -> EngineBuilder<Set> {
        EngineBuilder {
            sink: Some(Box::new(sink)),
            filter: self.filter,
            detector: self.detector,
            speed: self.speed,
            settings: self.settings,
            stride_m: self.stride_m,
            height_cm: self.height_cm,
            speed_limit_mps: self.speed_limit_mps,
            _k: PhantomData,
        }
    }
}

impl EngineBuilder<Set> {
    /// Validate and build the Engine. Only available once a sink is set.
    pub fn build(self) -> Result<Engine> {
        self.try_build()
    }
}

/// Build a statically dispatched `SpeedEngine` from a concrete sink.
///
/// Delegates to the shared `validate_and_build`.
pub fn build_engine<K>(
    sink: K,
    filter: FilterCfg,
    detector: DetectorCfg,
    speed: SpeedCfg,
    settings: Option<SharedSettings>,
) -> Result<SpeedEngine<K>>
where
    K: SpeedSink,
{
    validate_and_build(sink, filter, detector, speed, settings.unwrap_or_default())
}
