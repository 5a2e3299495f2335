#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = stride_config::load_toml(data) {
        if cfg.validate().is_ok() {
            // A config that validates must also build an engine.
            let built = stride_core::Engine::builder()
                .with_filter((&cfg.filter).into())
                .with_detector((&cfg.detector).into())
                .with_speed((&cfg.speed).into())
                .with_settings((&cfg.user).into())
                .with_sink(stride_core::mocks::RecordingSink::new())
                .build();
            if let Err(e) = built {
                panic!("validated config rejected: {e:?}");
            }
        }
    }
});
