#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core step-to-speed logic (sensor-agnostic).
//!
//! This crate turns a stream of tri-axial accelerometer samples into walking
//! speed estimates. All sensor interaction goes through
//! `stride_traits::AccelSource`; all output goes through `stride_traits::SpeedSink`.
//!
//! ## Architecture
//!
//! - **Gravity removal**: first-order low-pass subtracted from raw (`gravity` module)
//! - **Step detection**: armed peak detector on |linear| (`peak` module)
//! - **Speed**: stride / step interval with a noise floor (`speed` module)
//! - **Stop timeout**: re-armable deadline in sample time (`timer` module)
//! - **Settings**: stride and speed limit shared across threads (`settings` module)
//! - **Engine**: the per-sample pipeline (`SpeedEngine`)
//! - **Runtime**: background sampling and the live loop (`sampler`, `runner`)
//!
//! ## Time
//!
//! All timing decisions use the samples' own nanosecond timestamps. The live
//! runner maps wall-clock waits onto that domain; `runner::replay` needs no
//! clock at all.

// Module declarations
pub mod builder;
pub mod config;
pub mod conversions;
pub mod engine;
pub mod error;
pub mod gravity;
pub mod mocks;
pub mod peak;
pub mod runner;
pub mod sampler;
pub mod session;
pub mod settings;
pub mod source_error;
pub mod speed;
pub mod status;
pub mod timer;
pub mod util;

// ── Re-exports ───────────────────────────────────────────────────────────────

pub use builder::{Engine, EngineBuilder, Missing, Set, build_engine};
pub use config::{DetectorCfg, FilterCfg, SpeedCfg};
pub use engine::SpeedEngine;
pub use error::{BuildError, Report, Result, StrideError};
pub use gravity::{GravityFilter, LinearAccel};
pub use peak::{PeakDetector, StepEvent};
pub use runner::{RunParams, SamplingMode};
pub use session::{SessionStats, SessionSummary};
pub use settings::{
    DEFAULT_STRIDE_M, STRIDE_HEIGHT_RATIO, SettingsSnapshot, SharedSettings,
    stride_from_height_cm,
};
pub use speed::{SpeedEstimator, StepOutcome};
pub use status::{SampleStatus, SessionState};
pub use stride_traits::{AccelSample, OverspeedAlert, SpeedUpdate};
pub use timer::StopTimer;
