//! Session bookkeeping: step counts, distance and average speed since `start()`.

use crate::speed::StepOutcome;
use crate::util::ns_to_secs;

/// Running counters for the current session.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    samples: u64,
    last_sample_ns: Option<u64>,
    first_step_ns: Option<u64>,
    steps_detected: u64,
    steps_rejected: u64,
    speed_updates: u64,
    overspeed_alerts: u64,
    stop_timeouts: u64,
    distance_m: f64,
    max_speed_mps: f32,
}

/// Immutable view of a session, produced by `SessionStats::summary`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    pub samples: u64,
    pub steps_detected: u64,
    pub steps_rejected: u64,
    pub speed_updates: u64,
    pub overspeed_alerts: u64,
    pub stop_timeouts: u64,
    pub distance_m: f64,
    /// Seconds from the first step to the last processed sample.
    pub elapsed_s: f64,
    /// `distance_m / elapsed_s`, or 0 before any time has elapsed.
    pub average_speed_mps: f64,
    pub max_speed_mps: f32,
}

impl SessionStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn on_sample(&mut self, timestamp_ns: u64) {
        self.samples = self.samples.saturating_add(1);
        self.last_sample_ns = Some(
            self.last_sample_ns
                .map_or(timestamp_ns, |prev| prev.max(timestamp_ns)),
        );
    }

    pub(crate) fn on_step(&mut self, timestamp_ns: u64, outcome: &StepOutcome, stride_m: f32) {
        self.steps_detected = self.steps_detected.saturating_add(1);
        self.first_step_ns.get_or_insert(timestamp_ns);
        match outcome {
            StepOutcome::Rejected { .. } => {
                self.steps_rejected = self.steps_rejected.saturating_add(1);
                return;
            }
            StepOutcome::Accepted { update, alert } => {
                self.speed_updates = self.speed_updates.saturating_add(1);
                if alert.is_some() {
                    self.overspeed_alerts = self.overspeed_alerts.saturating_add(1);
                }
                self.max_speed_mps = self.max_speed_mps.max(update.speed_mps);
            }
            StepOutcome::First => {}
        }
        if stride_m.is_finite() && stride_m > 0.0 {
            self.distance_m += f64::from(stride_m);
        }
    }

    pub(crate) fn on_stop_timeout(&mut self) {
        self.stop_timeouts = self.stop_timeouts.saturating_add(1);
        self.speed_updates = self.speed_updates.saturating_add(1);
    }

    pub fn steps_detected(&self) -> u64 {
        self.steps_detected
    }

    pub fn summary(&self) -> SessionSummary {
        let elapsed_ns = match (self.first_step_ns, self.last_sample_ns) {
            (Some(first), Some(last)) => last.saturating_sub(first),
            _ => 0,
        };
        let elapsed_s = ns_to_secs(elapsed_ns);
        let average_speed_mps = if elapsed_s > 0.0 {
            self.distance_m / elapsed_s
        } else {
            0.0
        };
        SessionSummary {
            samples: self.samples,
            steps_detected: self.steps_detected,
            steps_rejected: self.steps_rejected,
            speed_updates: self.speed_updates,
            overspeed_alerts: self.overspeed_alerts,
            stop_timeouts: self.stop_timeouts,
            distance_m: self.distance_m,
            elapsed_s,
            average_speed_mps,
            max_speed_mps: self.max_speed_mps,
        }
    }
}
