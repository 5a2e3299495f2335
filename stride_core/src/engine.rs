//! The step/speed pipeline (`SpeedEngine`).
//!
//! One sample flows through gravity removal, peak detection and the speed
//! estimator; the stop timer is evaluated against sample timestamps so that
//! steps and timeouts are strictly serialized on the caller's thread.

use eyre::WrapErr;
use stride_traits::{AccelSample, SpeedSink, SpeedUpdate};

use crate::error::{Result, StrideError};
use crate::gravity::GravityFilter;
use crate::peak::{PeakDetector, StepEvent};
use crate::session::{SessionStats, SessionSummary};
use crate::settings::SharedSettings;
use crate::source_error::map_sink_error;
use crate::speed::{SpeedEstimator, StepOutcome};
use crate::status::{SampleStatus, SessionState};
use crate::timer::StopTimer;

pub struct SpeedEngine<K: SpeedSink> {
    pub(crate) sink: K,
    pub(crate) settings: SharedSettings,
    pub(crate) filter: GravityFilter,
    pub(crate) detector: PeakDetector,
    pub(crate) estimator: SpeedEstimator,
    pub(crate) timer: StopTimer,
    pub(crate) state: SessionState,
    pub(crate) stats: SessionStats,
    pub(crate) running: bool,
}

impl<K: SpeedSink> core::fmt::Debug for SpeedEngine<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpeedEngine")
            .field("state", &self.state)
            .field("running", &self.running)
            .field("speed_mps", &self.estimator.current_speed())
            .field("stop_deadline_ns", &self.timer.deadline_ns())
            .finish()
    }
}

impl<K: SpeedSink> SpeedEngine<K> {
    pub(crate) fn from_parts(
        sink: K,
        settings: SharedSettings,
        filter: GravityFilter,
        detector: PeakDetector,
        estimator: SpeedEstimator,
        timer: StopTimer,
    ) -> Self {
        Self {
            sink,
            settings,
            filter,
            detector,
            estimator,
            timer,
            state: SessionState::Idle,
            stats: SessionStats::default(),
            running: true,
        }
    }

    /// Reset all per-session state and begin accepting samples.
    ///
    /// Calling `start()` on a running engine simply starts a fresh session.
    pub fn start(&mut self) {
        self.filter.reset();
        self.detector.reset();
        self.estimator.reset();
        self.timer.cancel();
        self.stats.reset();
        self.state = SessionState::Idle;
        self.running = true;
        tracing::info!(
            stride_m = self.settings.stride_length(),
            speed_limit_mps = self.settings.speed_limit().unwrap_or(0.0),
            "session started"
        );
    }

    /// Cancel the pending stop timeout and stop accepting samples.
    ///
    /// No final update is emitted. Counters stay readable through `summary()`
    /// until the next `start()`.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.timer.cancel();
        self.running = false;
        tracing::info!(steps = self.stats.steps_detected(), "session stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Feed one accelerometer sample through the pipeline.
    ///
    /// A stop timeout whose deadline lies at or before this sample's timestamp
    /// is delivered first, so timeouts and steps reach the sink in time order.
    pub fn process_sample(&mut self, sample: &AccelSample) -> Result<SampleStatus> {
        if !self.running {
            return Err(eyre::Report::new(StrideError::State(
                "engine is stopped; call start() first".into(),
            )));
        }
        self.poll_stop(sample.timestamp_ns)?;

        self.stats.on_sample(sample.timestamp_ns);
        let linear = self.filter.update(sample);
        match self.detector.update(linear, sample.timestamp_ns) {
            Some(event) => self.handle_step(event),
            None => Ok(SampleStatus::NoStep),
        }
    }

    /// Fire the stop timeout if its deadline is at or before `now_ns`.
    ///
    /// Returns the emitted update, if any.
    pub fn poll_stop(&mut self, now_ns: u64) -> Result<Option<SpeedUpdate>> {
        if !self.running {
            return Ok(None);
        }
        match self.timer.poll(now_ns) {
            Some(deadline) => self.emit_stop(deadline).map(Some),
            None => Ok(None),
        }
    }

    /// Deliver a pending stop timeout at its own deadline, regardless of "now".
    ///
    /// Used when a finite stream ends while a timeout is still outstanding.
    pub fn flush_stop(&mut self) -> Result<Option<SpeedUpdate>> {
        match self.timer.deadline_ns() {
            Some(deadline) => self.poll_stop(deadline),
            None => Ok(None),
        }
    }

    /// Force the stopped state now: speed 0, timing reference cleared.
    ///
    /// The update is stamped with the pending deadline, or the last step time
    /// when no deadline is armed.
    pub fn on_stop_timeout(&mut self) -> Result<SpeedUpdate> {
        let at = self
            .timer
            .deadline_ns()
            .or(self.estimator.last_step_ns())
            .unwrap_or(0);
        self.timer.cancel();
        self.emit_stop(at)
    }

    pub fn current_speed(&self) -> f32 {
        self.estimator.current_speed()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stop_deadline_ns(&self) -> Option<u64> {
        self.timer.deadline_ns()
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    pub fn summary(&self) -> SessionSummary {
        self.stats.summary()
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    // ── Private ──────────────────────────────────────────────────────────────

    fn handle_step(&mut self, event: StepEvent) -> Result<SampleStatus> {
        self.state = SessionState::Tracking;
        self.timer.rearm(event.timestamp_ns);

        let snapshot = self.settings.snapshot();
        let outcome = self.estimator.on_step(event, snapshot);
        self.stats
            .on_step(event.timestamp_ns, &outcome, snapshot.stride_m);

        match outcome {
            StepOutcome::First => {
                tracing::debug!(ts_ns = event.timestamp_ns, "first step");
                Ok(SampleStatus::FirstStep)
            }
            StepOutcome::Rejected { interval_ns } => {
                tracing::debug!(
                    ts_ns = event.timestamp_ns,
                    interval_ns,
                    "step rejected below noise floor"
                );
                Ok(SampleStatus::RejectedStep { interval_ns })
            }
            StepOutcome::Accepted { update, alert } => {
                tracing::debug!(
                    ts_ns = update.timestamp_ns,
                    speed_mps = update.speed_mps,
                    "speed update"
                );
                self.sink
                    .on_speed_update(&update)
                    .map_err(|e| eyre::Report::new(map_sink_error(&*e)))
                    .wrap_err("delivering speed update")?;
                if let Some(alert) = alert {
                    tracing::warn!(
                        speed_mps = alert.speed_mps,
                        limit_mps = alert.limit_mps,
                        "overspeed"
                    );
                    self.sink
                        .on_overspeed_alert(&alert)
                        .map_err(|e| eyre::Report::new(map_sink_error(&*e)))
                        .wrap_err("delivering overspeed alert")?;
                }
                Ok(SampleStatus::Speed(update))
            }
        }
    }

    fn emit_stop(&mut self, at_ns: u64) -> Result<SpeedUpdate> {
        let update = self.estimator.on_stop_timeout(at_ns);
        self.stats.on_stop_timeout();
        tracing::info!(ts_ns = at_ns, "no step within stop timeout; speed 0");
        self.sink
            .on_speed_update(&update)
            .map_err(|e| eyre::Report::new(map_sink_error(&*e)))
            .wrap_err("delivering stop update")?;
        Ok(update)
    }
}
