#![no_main]
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;
use stride_core::mocks::RecordingSink;
use stride_core::{AccelSample, Engine, runner};

#[derive(Debug, Arbitrary)]
struct Input {
    stride_m: f32,
    limit_mps: f32,
    samples: Vec<(u32, f32, f32, f32)>,
}

fuzz_target!(|input: Input| {
    let sink = RecordingSink::new();
    let Ok(mut engine) = Engine::builder()
        .with_sink(sink.clone())
        .with_stride(input.stride_m)
        .with_speed_limit(input.limit_mps)
        .build()
    else {
        return;
    };

    // Non-decreasing timestamps built from arbitrary gaps.
    let mut ts = 0u64;
    let samples = input.samples.iter().map(|&(gap, x, y, z)| {
        ts = ts.saturating_add(u64::from(gap));
        AccelSample::new(ts, x, y, z)
    });
    let _ = runner::replay(samples, &mut engine);

    for u in sink.updates() {
        assert!(!u.speed_mps.is_nan() && u.speed_mps >= 0.0, "{u:?}");
    }
});
