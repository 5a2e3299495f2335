//! Hysteresis peak detector over the linear-acceleration magnitude.
//!
//! The detector arms when the magnitude crosses the threshold from below and
//! fires on the first strictly lower sample after that, which lands on (or one
//! sample after) the footfall peak without a windowed local-maximum search.
//! After firing it stays disarmed until the magnitude has dropped back to the
//! threshold, so the descending flank of one peak cannot produce a second step.

use crate::gravity::LinearAccel;

/// A detected footfall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepEvent {
    pub timestamp_ns: u64,
}

#[derive(Debug, Clone)]
pub struct PeakDetector {
    threshold: f32,
    last_magnitude: f32,
    armed: bool,
}

impl PeakDetector {
    pub fn new(threshold_mps2: f32) -> Self {
        Self {
            threshold: threshold_mps2,
            last_magnitude: 0.0,
            armed: false,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn last_magnitude(&self) -> f32 {
        self.last_magnitude
    }

    pub fn reset(&mut self) {
        self.last_magnitude = 0.0;
        self.armed = false;
    }

    /// Feed one linear-acceleration vector; returns at most one step.
    pub fn update(&mut self, linear: LinearAccel, timestamp_ns: u64) -> Option<StepEvent> {
        self.update_magnitude(linear.magnitude(), timestamp_ns)
    }

    /// Same as `update` for a precomputed magnitude.
    pub fn update_magnitude(&mut self, magnitude: f32, timestamp_ns: u64) -> Option<StepEvent> {
        let magnitude = if magnitude.is_finite() { magnitude } else { 0.0 };
        let mut event = None;
        let crossed_up = magnitude > self.threshold && self.last_magnitude <= self.threshold;
        if crossed_up && !self.armed {
            self.armed = true;
        } else if magnitude < self.last_magnitude && self.armed {
            self.armed = false;
            event = Some(StepEvent { timestamp_ns });
        }
        self.last_magnitude = magnitude;
        event
    }
}

impl Default for PeakDetector {
    fn default() -> Self {
        Self::new(1.8)
    }
}
