//! Background sensor sampling utilities.
//!
//! Spawns a thread that owns the `AccelSource`, forwards every sample in order
//! through a bounded channel, and tracks the last-ok timestamp for watchdog
//! logic. Event-driven and paced variants are provided.
//!
//! Each `Sampler` spawns exactly one thread that is shut down and joined when
//! the `Sampler` is dropped.
use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use stride_traits::clock::Clock;
use stride_traits::{AccelSample, AccelSource};

/// Samples buffered between the sensor thread and the engine.
const CHANNEL_CAPACITY: usize = 64;
/// How long a blocked send waits before re-checking the shutdown flag.
const SEND_RETRY: Duration = Duration::from_millis(20);

pub struct Sampler {
    rx: xch::Receiver<AccelSample>,
    last_ok: Arc<AtomicU64>,
    epoch: Instant,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Sampler {
    /// Rate-paced sampler: sleep one period between reads.
    pub fn spawn<A, C>(source: A, hz: u32, timeout: Duration, clock: C) -> Self
    where
        A: AccelSource + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let period = Duration::from_micros(crate::util::period_us(hz));
        Self::spawn_inner(source, Some(period), timeout, clock)
    }

    /// Event-driven sampler: rely on the sensor's own data-ready timing.
    /// `source.read(timeout)` should block until data is ready or timeout expires.
    pub fn spawn_event<A, C>(source: A, timeout: Duration, clock: C) -> Self
    where
        A: AccelSource + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        Self::spawn_inner(source, None, timeout, clock)
    }

    fn spawn_inner<A, C>(mut source: A, pace: Option<Duration>, timeout: Duration, clock: C) -> Self
    where
        A: AccelSource + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let (tx, rx) = xch::bounded(CHANNEL_CAPACITY);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let last_ok = Arc::new(AtomicU64::new(0));
        let last_ok_clone = last_ok.clone();
        let epoch = clock.now();

        let join_handle = std::thread::spawn(move || {
            'outer: loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("sampler thread received shutdown signal");
                    break;
                }

                match source.read(timeout) {
                    Ok(Some(sample)) => {
                        last_ok_clone.store(clock.ms_since(epoch), Ordering::Relaxed);
                        let mut pending = sample;
                        loop {
                            match tx.send_timeout(pending, SEND_RETRY) {
                                Ok(()) => break,
                                Err(xch::SendTimeoutError::Timeout(s)) => {
                                    if shutdown_clone.load(Ordering::Relaxed) {
                                        break 'outer;
                                    }
                                    pending = s;
                                }
                                Err(xch::SendTimeoutError::Disconnected(_)) => {
                                    tracing::debug!("sampler consumer disconnected, exiting thread");
                                    break 'outer;
                                }
                            }
                        }
                    }
                    Ok(None) => {
                        tracing::debug!("sensor stream ended");
                        break;
                    }
                    Err(e) => {
                        // Runner's stall watchdog decides when missing data is fatal.
                        tracing::trace!(error = %e, "sensor read failed");
                    }
                }

                if let Some(period) = pace {
                    if shutdown_clone.load(Ordering::Relaxed) {
                        break;
                    }
                    clock.sleep(period);
                }
            }
            tracing::trace!("sampler thread exiting cleanly");
        });

        Self {
            rx,
            last_ok,
            epoch,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Wait up to `timeout` for the next sample.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<AccelSample, xch::RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    pub fn epoch(&self) -> Instant {
        self.epoch
    }

    /// Milliseconds between the last successful read and `now_ms` (both relative to `epoch`).
    pub fn stalled_for(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_ok.load(Ordering::Relaxed))
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // Exits between reads, or once the in-flight read returns (bounded by the sensor timeout).
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("sampler thread joined successfully");
                }
                Err(e) => {
                    tracing::warn!(?e, "sampler thread panicked during shutdown");
                }
            }
        }
    }
}
