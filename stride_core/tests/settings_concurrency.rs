//! Stride updates from another thread while the engine is processing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use stride_core::mocks::{RecordingSink, step_train};
use stride_core::{Engine, SharedSettings};

const STRIDES: [f32; 2] = [0.5, 1.0];

#[test]
fn every_update_uses_one_whole_stride_value() {
    let settings = SharedSettings::new(STRIDES[0], 0.0);
    let sink = RecordingSink::new();
    let mut engine = Engine::builder()
        .with_sink(sink.clone())
        .with_settings(settings.clone())
        .build()
        .expect("valid engine");

    let done = Arc::new(AtomicBool::new(false));
    let writer = {
        let settings = settings.clone();
        let done = done.clone();
        thread::spawn(move || {
            let mut i = 0usize;
            while !done.load(Ordering::Relaxed) {
                settings
                    .set_stride_length(STRIDES[i % 2])
                    .expect("valid stride");
                i += 1;
                thread::yield_now();
            }
        })
    };

    // Steps every 500 ms: speed is 2 × stride.
    let times: Vec<u64> = (0..400).map(|k| 100 + k * 500).collect();
    let end = *times.last().expect("non-empty") + 100;
    for s in step_train(&times, 10, end) {
        engine.process_sample(&s).expect("process");
    }
    done.store(true, Ordering::Relaxed);
    writer.join().expect("writer thread");

    let updates = sink.updates();
    assert_eq!(updates.len(), times.len() - 1);
    for u in updates {
        let ok = STRIDES
            .iter()
            .any(|s| (u.speed_mps - 2.0 * s).abs() < 1e-4);
        assert!(ok, "speed {} does not match any whole stride", u.speed_mps);
    }
}

#[test]
fn limit_changes_are_visible_across_clones() {
    let a = SharedSettings::default();
    let b = a.clone();
    let t = thread::spawn(move || b.set_speed_limit(1.75));
    t.join().expect("join");
    assert_eq!(a.speed_limit(), Some(1.75));
    a.set_speed_limit(0.0);
    assert_eq!(a.snapshot().speed_limit_mps, None);
}
