//! Step timing → speed.

use stride_traits::{OverspeedAlert, SpeedUpdate};

use crate::peak::StepEvent;
use crate::settings::SettingsSnapshot;
use crate::util::NANOS_PER_SEC;

/// What a single step did to the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// No previous step in this session; the step only becomes the timing reference.
    First,
    /// Interval at or below the noise floor; the step becomes the new timing
    /// reference but no speed is produced.
    Rejected { interval_ns: u64 },
    /// A speed was computed.
    Accepted {
        update: SpeedUpdate,
        alert: Option<OverspeedAlert>,
    },
}

#[derive(Debug, Clone)]
pub struct SpeedEstimator {
    min_interval_ns: u64,
    last_step_ns: Option<u64>,
    current_speed: f32,
}

impl SpeedEstimator {
    pub fn new(min_step_interval_ms: u64) -> Self {
        Self {
            min_interval_ns: min_step_interval_ms.saturating_mul(1_000_000),
            last_step_ns: None,
            current_speed: 0.0,
        }
    }

    pub fn current_speed(&self) -> f32 {
        self.current_speed
    }

    pub fn last_step_ns(&self) -> Option<u64> {
        self.last_step_ns
    }

    pub fn reset(&mut self) {
        self.last_step_ns = None;
        self.current_speed = 0.0;
    }

    pub fn on_step(&mut self, event: StepEvent, settings: SettingsSnapshot) -> StepOutcome {
        let Some(prev) = self.last_step_ns.replace(event.timestamp_ns) else {
            return StepOutcome::First;
        };

        // Backwards timestamps saturate to 0 and fall under the noise floor.
        let interval_ns = event.timestamp_ns.saturating_sub(prev);
        if interval_ns <= self.min_interval_ns {
            return StepOutcome::Rejected { interval_ns };
        }

        let dt_s = interval_ns as f64 / NANOS_PER_SEC as f64;
        let speed = speed_for(settings.stride_m, dt_s);
        self.current_speed = speed;

        let update = SpeedUpdate {
            timestamp_ns: event.timestamp_ns,
            speed_mps: speed,
            stopped: false,
        };
        let alert = settings
            .speed_limit_mps
            .filter(|&limit| speed > limit)
            .map(|limit_mps| OverspeedAlert {
                timestamp_ns: event.timestamp_ns,
                speed_mps: speed,
                limit_mps,
            });
        StepOutcome::Accepted { update, alert }
    }

    /// Force the session to "stopped": speed 0 and no timing reference, so the
    /// next step starts a fresh interval.
    pub fn on_stop_timeout(&mut self, at_ns: u64) -> SpeedUpdate {
        self.current_speed = 0.0;
        self.last_step_ns = None;
        SpeedUpdate {
            timestamp_ns: at_ns,
            speed_mps: 0.0,
            stopped: true,
        }
    }
}

/// `stride / dt`, guarded so the result is always finite and non-negative.
#[inline]
fn speed_for(stride_m: f32, dt_s: f64) -> f32 {
    if !(stride_m.is_finite() && stride_m > 0.0) || !(dt_s.is_finite() && dt_s > 0.0) {
        return 0.0;
    }
    let v = (f64::from(stride_m) / dt_s) as f32;
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}
