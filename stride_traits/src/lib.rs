pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// One tri-axial accelerometer reading in m/s², stamped with a monotonic
/// nanosecond timestamp from the sensor's own clock domain.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AccelSample {
    pub timestamp_ns: u64,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl AccelSample {
    #[inline]
    pub const fn new(timestamp_ns: u64, x: f32, y: f32, z: f32) -> Self {
        Self {
            timestamp_ns,
            x,
            y,
            z,
        }
    }
}

/// Speed estimate emitted on every accepted step and on stop-timeout.
///
/// `stopped` is set only for the zero update produced by the stop-timeout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedUpdate {
    pub timestamp_ns: u64,
    pub speed_mps: f32,
    pub stopped: bool,
}

/// Raised alongside a `SpeedUpdate` whose speed exceeds the configured limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverspeedAlert {
    pub timestamp_ns: u64,
    pub speed_mps: f32,
    pub limit_mps: f32,
}

pub trait AccelSource {
    /// Block for the next sample, up to `timeout`.
    ///
    /// `Ok(None)` means the stream has ended and no further samples will come.
    fn read(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<Option<AccelSample>, Box<dyn std::error::Error + Send + Sync>>;
}

pub trait SpeedSink {
    fn on_speed_update(
        &mut self,
        update: &SpeedUpdate,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn on_overspeed_alert(
        &mut self,
        alert: &OverspeedAlert,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<K: SpeedSink + ?Sized> SpeedSink for Box<K> {
    fn on_speed_update(
        &mut self,
        update: &SpeedUpdate,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).on_speed_update(update)
    }
    fn on_overspeed_alert(
        &mut self,
        alert: &OverspeedAlert,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).on_overspeed_alert(alert)
    }
}

impl<A: AccelSource + ?Sized> AccelSource for Box<A> {
    fn read(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<Option<AccelSample>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read(timeout)
    }
}
