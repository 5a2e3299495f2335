pub mod error;
pub mod util;

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use stride_traits::{AccelSample, AccelSource};

use crate::error::SensorError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Standard gravity (m/s²) as reported by an accelerometer at rest.
pub const GRAVITY_MPS2: f32 = 9.81;

/// Shape of the synthetic walk produced by `SimulatedWalker`.
#[derive(Debug, Clone)]
pub struct WalkerCfg {
    pub sample_rate_hz: u32,
    /// Steps per second while walking.
    pub cadence_hz: f32,
    /// Peak vertical acceleration swing (m/s²) on top of gravity.
    pub amplitude_mps2: f32,
    /// Standing still before the walk, letting the gravity estimate settle.
    pub settle_ms: u64,
    pub walk_ms: u64,
    /// Standing still after the walk, before the stream ends.
    pub idle_ms: u64,
    /// Deliver each sample no earlier than its timestamp on the wall clock.
    pub realtime: bool,
}

impl Default for WalkerCfg {
    fn default() -> Self {
        Self {
            sample_rate_hz: 50,
            cadence_hz: 2.0,
            amplitude_mps2: 6.0,
            settle_ms: 1_000,
            walk_ms: 10_000,
            idle_ms: 3_000,
            realtime: false,
        }
    }
}

/// Simulated body-worn accelerometer: rest, a steady walk, rest, end of stream.
///
/// Vertical axis carries gravity plus a sine at half the cadence; each half
/// cycle is one step. Timestamps are `index × period`, starting at 0.
pub struct SimulatedWalker {
    cfg: WalkerCfg,
    period_ns: u64,
    total: u64,
    index: u64,
    origin: Option<Instant>,
    forced_timeout: bool,
}

impl SimulatedWalker {
    pub fn new(cfg: WalkerCfg) -> Self {
        let hz = u64::from(cfg.sample_rate_hz.max(1));
        let period_ns = (1_000_000_000 / hz).max(1);
        let total_ms = cfg
            .settle_ms
            .saturating_add(cfg.walk_ms)
            .saturating_add(cfg.idle_ms);
        let total = total_ms.saturating_mul(hz) / 1_000;
        Self {
            cfg,
            period_ns,
            total,
            index: 0,
            origin: None,
            forced_timeout: false,
        }
    }

    /// Make every read time out, as an unplugged sensor would.
    pub fn with_forced_timeout(mut self, on: bool) -> Self {
        self.forced_timeout = on;
        self
    }

    pub fn cfg(&self) -> &WalkerCfg {
        &self.cfg
    }

    /// Number of samples the stream will deliver.
    pub fn len(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// The sample at `index`, independent of read state.
    pub fn sample_at(&self, index: u64) -> AccelSample {
        let ts = index.saturating_mul(self.period_ns);
        let settle_end = self.cfg.settle_ms.saturating_mul(1_000_000);
        let walk_end = settle_end.saturating_add(self.cfg.walk_ms.saturating_mul(1_000_000));
        let z = if ts >= settle_end && ts < walk_end {
            let t = (ts - settle_end) as f64 / 1e9;
            let f = f64::from(self.cfg.cadence_hz) / 2.0;
            let swing = (2.0 * std::f64::consts::PI * f * t).sin() as f32;
            GRAVITY_MPS2 + self.cfg.amplitude_mps2 * swing
        } else {
            GRAVITY_MPS2
        };
        AccelSample::new(ts, 0.0, 0.0, z)
    }
}

impl AccelSource for SimulatedWalker {
    fn read(&mut self, timeout: Duration) -> Result<Option<AccelSample>, BoxError> {
        if self.forced_timeout {
            std::thread::sleep(timeout);
            return Err(Box::new(SensorError::Timeout));
        }
        if self.index >= self.total {
            return Ok(None);
        }
        let sample = self.sample_at(self.index);
        if self.cfg.realtime {
            let origin = *self.origin.get_or_insert_with(Instant::now);
            util::wait_until_due(origin + Duration::from_nanos(sample.timestamp_ns), timeout)?;
        }
        self.index += 1;
        tracing::trace!(ts_ns = sample.timestamp_ns, z = sample.z, "simulated sample");
        Ok(Some(sample))
    }
}

/// Plays back a captured sample sequence.
pub struct RecordedSource {
    samples: VecDeque<AccelSample>,
    realtime: bool,
    origin: Option<(Instant, u64)>,
}

impl RecordedSource {
    pub fn new(samples: impl IntoIterator<Item = AccelSample>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
            realtime: false,
            origin: None,
        }
    }

    /// Pace playback at the recording's own rate.
    pub fn realtime(mut self, on: bool) -> Self {
        self.realtime = on;
        self
    }

    pub fn remaining(&self) -> usize {
        self.samples.len()
    }
}

impl AccelSource for RecordedSource {
    fn read(&mut self, timeout: Duration) -> Result<Option<AccelSample>, BoxError> {
        let Some(&next) = self.samples.front() else {
            return Ok(None);
        };
        if self.realtime {
            let (origin, first_ts) = *self
                .origin
                .get_or_insert_with(|| (Instant::now(), next.timestamp_ns));
            let offset = Duration::from_nanos(next.timestamp_ns.saturating_sub(first_ts));
            util::wait_until_due(origin + offset, timeout)?;
        }
        self.samples.pop_front();
        Ok(Some(next))
    }
}
