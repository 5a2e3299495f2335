//! Test and helper mocks for stride_core

use std::sync::{Arc, Mutex};

use stride_traits::{AccelSample, AccelSource, OverspeedAlert, SpeedSink, SpeedUpdate};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A source whose stream has already ended.
pub struct NoopSource;

impl AccelSource for NoopSource {
    fn read(&mut self, _timeout: std::time::Duration) -> Result<Option<AccelSample>, BoxError> {
        Ok(None)
    }
}

/// Replays a fixed list of samples, then ends the stream.
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    samples: std::collections::VecDeque<AccelSample>,
}

impl VecSource {
    pub fn new(samples: impl IntoIterator<Item = AccelSample>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
        }
    }
}

impl AccelSource for VecSource {
    fn read(&mut self, _timeout: std::time::Duration) -> Result<Option<AccelSample>, BoxError> {
        Ok(self.samples.pop_front())
    }
}

/// Everything a sink was handed, in delivery order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SinkEvent {
    Speed(SpeedUpdate),
    Alert(OverspeedAlert),
}

/// Sink that records events into a shared log; clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn updates(&self) -> Vec<SpeedUpdate> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Speed(u) => Some(u),
                SinkEvent::Alert(_) => None,
            })
            .collect()
    }

    pub fn alerts(&self) -> Vec<OverspeedAlert> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Alert(a) => Some(a),
                SinkEvent::Speed(_) => None,
            })
            .collect()
    }

    fn push(&self, event: SinkEvent) {
        if let Ok(mut g) = self.events.lock() {
            g.push(event);
        }
    }
}

impl SpeedSink for RecordingSink {
    fn on_speed_update(&mut self, update: &SpeedUpdate) -> Result<(), BoxError> {
        self.push(SinkEvent::Speed(*update));
        Ok(())
    }

    fn on_overspeed_alert(&mut self, alert: &OverspeedAlert) -> Result<(), BoxError> {
        self.push(SinkEvent::Alert(*alert));
        Ok(())
    }
}

/// Sink whose every call fails.
pub struct FailingSink;

impl SpeedSink for FailingSink {
    fn on_speed_update(&mut self, _update: &SpeedUpdate) -> Result<(), BoxError> {
        Err(Box::new(std::io::Error::other("sink unavailable")))
    }

    fn on_overspeed_alert(&mut self, _alert: &OverspeedAlert) -> Result<(), BoxError> {
        Err(Box::new(std::io::Error::other("sink unavailable")))
    }
}

/// Synthetic gravity-free stream sampled every `period_ms` until `end_ms`,
/// with a single-sample spike one period before each entry of `step_times_ms`.
///
/// Through the default gravity filter and detector every spike yields exactly
/// one step, stamped at the listed time. Step times must be multiples of
/// `period_ms`, at least one period apart from 0 and at least 50 ms apart.
pub fn step_train(step_times_ms: &[u64], period_ms: u64, end_ms: u64) -> Vec<AccelSample> {
    let period_ms = period_ms.max(1);
    let spikes: std::collections::BTreeSet<u64> = step_times_ms
        .iter()
        .filter_map(|t| t.checked_sub(period_ms))
        .collect();
    (0..=end_ms / period_ms)
        .map(|k| {
            let t_ms = k * period_ms;
            let z = if spikes.contains(&t_ms) { 10.0 } else { 0.0 };
            AccelSample::new(t_ms * 1_000_000, 0.0, 0.0, z)
        })
        .collect()
}
