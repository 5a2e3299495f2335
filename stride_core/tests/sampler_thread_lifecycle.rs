//! Sampler thread lifecycle and cleanup.
//!
//! Verifies that:
//! - Threads are cleaned up when a Sampler is dropped
//! - Samples arrive in order and the channel disconnects at end of stream
//! - A blocked producer still shuts down when nobody drains the channel

use crossbeam_channel::RecvTimeoutError;
use stride_core::mocks::{NoopSource, VecSource};
use stride_core::sampler::Sampler;
use stride_traits::AccelSample;
use stride_traits::clock::{Clock, MonotonicClock};
use std::time::Duration;

fn samples(n: u64) -> Vec<AccelSample> {
    (0..n)
        .map(|i| AccelSample::new(i * 20_000_000, 0.0, 0.0, 9.81))
        .collect()
}

#[test]
fn sampler_thread_exits_on_drop() {
    let clock = MonotonicClock::new();
    let sampler = Sampler::spawn(VecSource::new(samples(1_000)), 100, Duration::from_millis(100), clock);

    std::thread::sleep(Duration::from_millis(50));
    drop(sampler);
}

#[test]
fn event_sampler_thread_exits_on_drop() {
    let clock = MonotonicClock::new();
    let sampler = Sampler::spawn_event(NoopSource, Duration::from_millis(100), clock);
    std::thread::sleep(Duration::from_millis(20));
    drop(sampler);
}

#[test]
fn samples_arrive_in_order_then_disconnect() {
    let clock = MonotonicClock::new();
    let sampler = Sampler::spawn_event(VecSource::new(samples(200)), Duration::from_millis(10), clock);

    let mut expected = 0u64;
    loop {
        match sampler.recv_timeout(Duration::from_secs(2)) {
            Ok(s) => {
                assert_eq!(s.timestamp_ns, expected * 20_000_000);
                expected += 1;
            }
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => panic!("sampler stalled after {expected} samples"),
        }
    }
    assert_eq!(expected, 200);
}

#[test]
fn multiple_samplers_dont_leak_threads() {
    let clock = MonotonicClock::new();
    for _ in 0..10 {
        let sampler = Sampler::spawn(VecSource::new(samples(50)), 500, Duration::from_millis(50), clock);
        std::thread::sleep(Duration::from_millis(10));
        let _ = sampler.recv_timeout(Duration::from_millis(10));
        drop(sampler);
    }
}

#[test]
fn blocked_producer_shuts_down_promptly() {
    // More samples than the channel holds and nobody reading: the producer blocks on send.
    let clock = MonotonicClock::new();
    let sampler = Sampler::spawn_event(VecSource::new(samples(10_000)), Duration::from_millis(10), clock);
    std::thread::sleep(Duration::from_millis(100));

    let start = std::time::Instant::now();
    drop(sampler);
    let shutdown_time = start.elapsed();
    assert!(
        shutdown_time < Duration::from_millis(200),
        "Shutdown took {shutdown_time:?}, expected < 200ms"
    );
}

#[test]
fn stall_counter_grows_without_samples() {
    let clock = MonotonicClock::new();
    let sampler = Sampler::spawn_event(NoopSource, Duration::from_millis(10), clock);
    std::thread::sleep(Duration::from_millis(60));
    assert!(sampler.stalled_for(clock.ms_since(sampler.epoch())) >= 50);
    assert_eq!(sampler.stalled_for(10), 10);
}
