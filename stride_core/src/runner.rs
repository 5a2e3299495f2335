use crate::engine::SpeedEngine;
use crate::error::{Result as CoreResult, StrideError};
use crate::sampler::Sampler;
use crate::session::SessionSummary;
use crate::source_error::map_source_error;
use crossbeam_channel::RecvTimeoutError;
use eyre::WrapErr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use stride_traits::clock::{Clock, MonotonicClock};
use stride_traits::{AccelSample, AccelSource, SpeedSink};

/// Upper bound on a single blocking wait, so shutdown and watchdogs stay responsive.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How sampling should be orchestrated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// Read on the engine thread using AccelSource::read(timeout)
    Direct,
    /// Event-driven: a sampler thread blocks on the sensor's data-ready
    Event,
    /// Rate-paced sampling at given Hz
    Paced(u32),
}

/// Parameters for one live session.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub mode: SamplingMode,
    pub sample_rate_hz: u32,
    /// Max wait per sensor read (ms).
    pub sensor_timeout_ms: u64,
    /// End the session after this long; `None` runs until the stream ends or shutdown.
    pub max_run_ms: Option<u64>,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            mode: SamplingMode::Paced(50),
            sample_rate_hz: 50,
            sensor_timeout_ms: 100,
            max_run_ms: None,
        }
    }
}

/// Maps wall-clock time onto the sensor's timestamp domain.
///
/// "Now" is the last sample's timestamp plus the time elapsed since that sample
/// arrived, so a stop deadline expressed in sample time can be waited on with a
/// real timeout.
#[derive(Debug, Clone, Copy)]
pub struct LogicalTime {
    last_ts_ns: Option<u64>,
    arrived: Instant,
}

impl LogicalTime {
    pub fn new(now: Instant) -> Self {
        Self {
            last_ts_ns: None,
            arrived: now,
        }
    }

    /// Record that a sample stamped `timestamp_ns` arrived at `at`.
    pub fn observe(&mut self, timestamp_ns: u64, at: Instant) {
        self.last_ts_ns = Some(timestamp_ns);
        self.arrived = at;
    }

    /// Current logical time, or `None` before the first sample.
    pub fn now_ns<C: Clock + ?Sized>(&self, clock: &C) -> Option<u64> {
        self.last_ts_ns
            .map(|ts| ts.saturating_add(clock.ns_since(self.arrived)))
    }

    /// Real time left until `deadline_ns`, zero if already due.
    pub fn until<C: Clock + ?Sized>(&self, deadline_ns: u64, clock: &C) -> Duration {
        match self.now_ns(clock) {
            Some(now) => Duration::from_nanos(deadline_ns.saturating_sub(now)),
            None => Duration::ZERO,
        }
    }
}

/// Compute the stall watchdog threshold in milliseconds.
///
/// Parameters:
/// - `sensor_timeout_ms`: the per-read sensor timeout in milliseconds. Expected ≥ 1.
///   Used to derive a "fast" stall threshold (4x timeout) for quick detection.
/// - `period_ms`: the sampling period in milliseconds derived from `sample_rate_hz`.
///   Expected in [1, 1000]; the threshold spans at least two periods so that a
///   single missed sample doesn't immediately trip the watchdog.
/// - `max_run_ms`: configured session cap. The stall threshold is kept strictly
///   below it so the watchdog can still fire before the cap.
#[inline]
fn compute_stall_threshold_ms(sensor_timeout_ms: u64, period_ms: u64, max_run_ms: u64) -> u64 {
    debug_assert!((1..=crate::util::MILLIS_PER_SEC).contains(&period_ms));

    let fast = fast_threshold_ms(sensor_timeout_ms);
    let two_p = two_periods_ms(period_ms);

    if max_run_ms < two_p {
        return cap_below_max_run(fast, max_run_ms);
    }

    let safe = std::cmp::max(fast, two_p);
    cap_below_max_run(safe, max_run_ms)
}

/// Derive a quick stall threshold from per-read sensor timeout.
#[inline]
fn fast_threshold_ms(sensor_timeout_ms: u64) -> u64 {
    sensor_timeout_ms.saturating_mul(4)
}

/// Ensure the stall threshold spans at least two periods to tolerate one miss.
#[inline]
fn two_periods_ms(period_ms: u64) -> u64 {
    period_ms.saturating_mul(2)
}

/// Cap a threshold to be strictly below `max_run_ms` and at least 1ms.
#[inline]
fn cap_below_max_run(threshold: u64, max_run_ms: u64) -> u64 {
    threshold.min(max_run_ms.saturating_sub(1)).max(1)
}

#[inline]
fn stalled_now(elapsed_ms: u64, stalled_ms: u64, threshold_ms: u64) -> bool {
    elapsed_ms >= threshold_ms && stalled_ms > threshold_ms
}

/// Why a live loop ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    EndOfStream,
    Shutdown,
    MaxRun,
}

/// Run a live session until the stream ends, `shutdown` is set, or `max_run_ms` elapses.
///
/// Starts `engine` fresh. A stop timeout still pending when the stream ends is
/// delivered at its deadline; shutdown and the run cap stop without it.
pub fn run<A, K>(
    source: A,
    engine: &mut SpeedEngine<K>,
    params: &RunParams,
    shutdown: &AtomicBool,
) -> CoreResult<SessionSummary>
where
    A: AccelSource + Send + 'static,
    K: SpeedSink,
{
    let clock = Arc::new(MonotonicClock::new());
    engine.start();
    tracing::info!(mode = ?params.mode, "speed session start");

    let result = match params.mode {
        SamplingMode::Direct => run_direct(source, engine, params, shutdown, clock.as_ref()),
        SamplingMode::Event | SamplingMode::Paced(_) => {
            run_with_sampler(source, engine, params, shutdown, clock)
        }
    };

    let exit = match result {
        Ok(exit) => exit,
        Err(e) => {
            engine.stop();
            tracing::error!(error = %e, "speed session failed");
            return Err(e);
        }
    };
    if exit == Exit::EndOfStream {
        engine.flush_stop()?;
    }
    engine.stop();
    let summary = engine.summary();
    tracing::info!(
        ?exit,
        steps = summary.steps_detected,
        distance_m = summary.distance_m,
        "speed session end"
    );
    Ok(summary)
}

/// Process a finite, already-captured sample sequence on its own timestamps.
pub fn replay<K, I>(samples: I, engine: &mut SpeedEngine<K>) -> CoreResult<SessionSummary>
where
    K: SpeedSink,
    I: IntoIterator<Item = AccelSample>,
{
    engine.start();
    for sample in samples {
        engine.process_sample(&sample)?;
    }
    engine.flush_stop()?;
    engine.stop();
    Ok(engine.summary())
}

fn stall_threshold(params: &RunParams) -> u64 {
    let period_ms = crate::util::period_ms(params.sample_rate_hz);
    compute_stall_threshold_ms(
        params.sensor_timeout_ms,
        period_ms,
        params.max_run_ms.unwrap_or(u64::MAX),
    )
}

fn run_direct<A, K, C>(
    mut source: A,
    engine: &mut SpeedEngine<K>,
    params: &RunParams,
    shutdown: &AtomicBool,
    clock: &C,
) -> CoreResult<Exit>
where
    A: AccelSource,
    K: SpeedSink,
    C: Clock + ?Sized,
{
    let stall_threshold_ms = stall_threshold(params);
    let sensor_timeout = Duration::from_millis(params.sensor_timeout_ms);
    let start = clock.now();
    let mut last_ok = start;
    let mut time = LogicalTime::new(start);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            return Ok(Exit::Shutdown);
        }
        let elapsed_ms = clock.ms_since(start);
        if params.max_run_ms.is_some_and(|cap| elapsed_ms >= cap) {
            return Ok(Exit::MaxRun);
        }
        if stalled_now(elapsed_ms, clock.ms_since(last_ok), stall_threshold_ms) {
            return Err(crate::error::Report::new(StrideError::Timeout));
        }

        if let Some(now_ns) = time.now_ns(clock) {
            engine.poll_stop(now_ns)?;
        }
        // Don't block past a pending stop deadline.
        let timeout = match engine.stop_deadline_ns() {
            Some(deadline) => sensor_timeout.min(time.until(deadline, clock)).max(Duration::from_millis(1)),
            None => sensor_timeout,
        };

        match source.read(timeout) {
            Ok(Some(sample)) => {
                last_ok = clock.now();
                time.observe(sample.timestamp_ns, last_ok);
                engine.process_sample(&sample)?;
            }
            Ok(None) => return Ok(Exit::EndOfStream),
            Err(e) => match map_source_error(&*e) {
                StrideError::Timeout => {
                    tracing::trace!("sensor read timed out");
                }
                other => {
                    return Err(crate::error::Report::new(other)).wrap_err("reading accelerometer");
                }
            },
        }
    }
}

fn run_with_sampler<A, K, C>(
    source: A,
    engine: &mut SpeedEngine<K>,
    params: &RunParams,
    shutdown: &AtomicBool,
    clock: Arc<C>,
) -> CoreResult<Exit>
where
    A: AccelSource + Send + 'static,
    K: SpeedSink,
    C: Clock + Send + Sync + 'static,
{
    let stall_threshold_ms = stall_threshold(params);
    let sampler_timeout = Duration::from_millis(params.sensor_timeout_ms);
    let sampler = match params.mode {
        SamplingMode::Event => Sampler::spawn_event(source, sampler_timeout, clock.clone()),
        SamplingMode::Paced(hz) => Sampler::spawn(source, hz, sampler_timeout, clock.clone()),
        SamplingMode::Direct => {
            return Err(crate::error::Report::new(StrideError::State(
                "direct mode does not use a sampler".into(),
            )));
        }
    };

    let start = clock.now();
    let mut time = LogicalTime::new(start);
    loop {
        if shutdown.load(Ordering::Relaxed) {
            return Ok(Exit::Shutdown);
        }
        let elapsed_ms = clock.ms_since(start);
        if params.max_run_ms.is_some_and(|cap| elapsed_ms >= cap) {
            return Ok(Exit::MaxRun);
        }
        let stalled_ms = sampler.stalled_for(clock.ms_since(sampler.epoch()));
        if stalled_now(elapsed_ms, stalled_ms, stall_threshold_ms) {
            return Err(crate::error::Report::new(StrideError::Timeout));
        }

        let wait = match engine.stop_deadline_ns() {
            Some(deadline) => POLL_INTERVAL.min(time.until(deadline, clock.as_ref())),
            None => POLL_INTERVAL,
        };
        match sampler.recv_timeout(wait) {
            Ok(sample) => {
                time.observe(sample.timestamp_ns, clock.now());
                engine.process_sample(&sample)?;
            }
            Err(RecvTimeoutError::Timeout) => {
                if let Some(now_ns) = time.now_ns(clock.as_ref()) {
                    engine.poll_stop(now_ns)?;
                }
            }
            Err(RecvTimeoutError::Disconnected) => return Ok(Exit::EndOfStream),
        }
    }
}
