//! Session orchestration: config mapping, engine assembly, and output.

use std::io::Write;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use eyre::WrapErr;
use serde_json::json;
use stride_config::Config;
use stride_core::conversions::sample_from_row;
use stride_core::error::{Result as CoreResult, StrideError};
use stride_core::runner::{self, RunParams, SamplingMode};
use stride_core::source_error::map_source_error;
use stride_core::util::ns_to_secs;
use stride_core::{
    Engine, OverspeedAlert, SessionSummary, SharedSettings, SpeedUpdate,
    stride_from_height_cm,
};
use stride_sensors::{SimulatedWalker, WalkerCfg};
use stride_traits::{AccelSource, SpeedSink};

use crate::cli::{UserArgs, json_mode};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Set to `1` to make the simulated sensor time out on every read.
pub const SIM_TIMEOUT_ENV: &str = "STRIDE_TEST_SIM_TIMEOUT";

fn sim_timeout_forced() -> bool {
    std::env::var(SIM_TIMEOUT_ENV).is_ok_and(|v| v == "1")
}

/// Prints speed updates and alerts as they happen, one line each.
pub struct ConsoleSink<W: Write> {
    out: W,
    json: bool,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout(json: bool) -> Self {
        Self::new(std::io::stdout(), json)
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, json: bool) -> Self {
        Self { out, json }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SpeedSink for ConsoleSink<W> {
    fn on_speed_update(&mut self, update: &SpeedUpdate) -> Result<(), BoxError> {
        let t = ns_to_secs(update.timestamp_ns);
        if self.json {
            let line = json!({
                "event": "speed",
                "timestamp_ns": update.timestamp_ns,
                "speed_mps": update.speed_mps,
                "stopped": update.stopped,
            });
            writeln!(self.out, "{line}")?;
        } else if update.stopped {
            writeln!(self.out, "[{t:>8.3}s] stopped")?;
        } else {
            writeln!(self.out, "[{t:>8.3}s] speed {:.2} m/s", update.speed_mps)?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn on_overspeed_alert(&mut self, alert: &OverspeedAlert) -> Result<(), BoxError> {
        let t = ns_to_secs(alert.timestamp_ns);
        if self.json {
            let line = json!({
                "event": "overspeed",
                "timestamp_ns": alert.timestamp_ns,
                "speed_mps": alert.speed_mps,
                "limit_mps": alert.limit_mps,
            });
            writeln!(self.out, "{line}")?;
        } else {
            writeln!(
                self.out,
                "[{t:>8.3}s] OVERSPEED {:.2} m/s (limit {:.2} m/s)",
                alert.speed_mps, alert.limit_mps
            )?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Assemble an engine from the config, with CLI overrides on top.
pub fn build_engine(
    cfg: &Config,
    user: &UserArgs,
    sink: impl SpeedSink + Send + 'static,
) -> CoreResult<Engine> {
    let settings = SharedSettings::from(&cfg.user);
    let mut builder = Engine::builder()
        .with_filter((&cfg.filter).into())
        .with_detector((&cfg.detector).into())
        .with_speed((&cfg.speed).into())
        .with_settings(settings);
    if let Some(h) = user.height_cm {
        builder = builder.with_height_cm(h);
    }
    if let Some(s) = user.stride_m {
        builder = builder.with_stride(s);
    }
    if let Some(limit) = user.speed_limit {
        builder = builder.with_speed_limit(limit);
    }
    builder.with_sink(sink).build()
}

/// Knobs for `walk`.
#[derive(Debug, Clone)]
pub struct WalkOpts {
    pub cadence_hz: f32,
    pub walk_ms: u64,
    pub idle_ms: u64,
    pub direct: bool,
    pub max_run_ms: Option<u64>,
    pub fast: bool,
}

pub fn run_walk(
    cfg: &Config,
    user: &UserArgs,
    opts: &WalkOpts,
    shutdown: &AtomicBool,
) -> eyre::Result<()> {
    let json = json_mode();
    let mut engine = build_engine(cfg, user, ConsoleSink::stdout(json))?;

    let walker = SimulatedWalker::new(WalkerCfg {
        sample_rate_hz: cfg.filter.sample_rate_hz,
        cadence_hz: opts.cadence_hz,
        walk_ms: opts.walk_ms,
        idle_ms: opts.idle_ms,
        realtime: !opts.fast,
        ..WalkerCfg::default()
    })
    .with_forced_timeout(sim_timeout_forced());

    let mut params = RunParams::from(cfg);
    if opts.direct || opts.fast {
        params.mode = SamplingMode::Direct;
    }
    params.max_run_ms = opts.max_run_ms;
    tracing::info!(
        mode = ?params.mode,
        stride_m = engine.settings().stride_length(),
        samples = walker.len(),
        "walk start"
    );

    let summary = runner::run(walker, &mut engine, &params, shutdown)?;
    print_summary(&summary, json)
}

pub fn run_replay(cfg: &Config, input: &Path, user: &UserArgs) -> eyre::Result<()> {
    let json = json_mode();
    let rows = stride_config::load_recording_csv(input)
        .wrap_err_with(|| format!("loading recording {}", input.display()))?;
    let mut engine = build_engine(cfg, user, ConsoleSink::stdout(json))?;
    tracing::info!(rows = rows.len(), path = %input.display(), "replay start");
    let summary = runner::replay(rows.iter().map(sample_from_row), &mut engine)?;
    print_summary(&summary, json)
}

pub fn print_stride(height_cm: f32) -> eyre::Result<()> {
    let stride_m = stride_from_height_cm(height_cm);
    let mut out = std::io::stdout().lock();
    if json_mode() {
        writeln!(
            out,
            "{}",
            json!({ "event": "stride", "height_cm": height_cm, "stride_m": stride_m })
        )
        .map_err(output_error)?;
    } else {
        writeln!(out, "Stride for {height_cm:.1} cm: {stride_m:.3} m").map_err(output_error)?;
    }
    Ok(())
}

/// Read one sample from the simulated sensor and report the settings in effect.
pub fn self_check(cfg: &Config) -> eyre::Result<()> {
    let timeout = Duration::from_millis(cfg.timeouts.sample_ms.max(1));
    let mut source = SimulatedWalker::new(WalkerCfg {
        sample_rate_hz: cfg.filter.sample_rate_hz,
        ..WalkerCfg::default()
    })
    .with_forced_timeout(sim_timeout_forced());

    let sample = match source.read(timeout) {
        Ok(Some(s)) => s,
        Ok(None) => {
            return Err(eyre::Report::new(StrideError::SensorFault(
                "sensor stream ended before the first sample".into(),
            )));
        }
        Err(e) => {
            return Err(eyre::Report::new(map_source_error(&*e)).wrap_err("sensor self-check"));
        }
    };

    let settings = SharedSettings::from(&cfg.user);
    let limit = settings.speed_limit().unwrap_or(0.0);
    if json_mode() {
        println!(
            "{}",
            json!({
                "event": "self_check",
                "status": "ok",
                "sample": { "x": sample.x, "y": sample.y, "z": sample.z },
                "stride_m": settings.stride_length(),
                "speed_limit_mps": limit,
                "sample_rate_hz": cfg.filter.sample_rate_hz,
                "sample_timeout_ms": cfg.timeouts.sample_ms,
                "stop_timeout_ms": cfg.speed.stop_timeout_ms,
            })
        );
    } else {
        println!(
            "OK: sensor responded (x={:.2}, y={:.2}, z={:.2} m/s²)",
            sample.x, sample.y, sample.z
        );
        println!(
            "stride {:.3} m, speed limit {}, {} Hz, sample timeout {} ms, stop timeout {} ms",
            settings.stride_length(),
            if limit > 0.0 {
                format!("{limit:.2} m/s")
            } else {
                "off".to_string()
            },
            cfg.filter.sample_rate_hz,
            cfg.timeouts.sample_ms,
            cfg.speed.stop_timeout_ms
        );
    }
    Ok(())
}

fn print_summary(summary: &SessionSummary, json: bool) -> eyre::Result<()> {
    write_summary(&mut std::io::stdout().lock(), summary, json)
}

fn output_error(e: std::io::Error) -> eyre::Report {
    eyre::Report::new(StrideError::Io(format!("writing to stdout: {e}")))
}

fn write_summary(out: &mut impl Write, summary: &SessionSummary, json: bool) -> eyre::Result<()> {
    let text = if json {
        json!({
            "event": "summary",
            "samples": summary.samples,
            "steps_detected": summary.steps_detected,
            "steps_rejected": summary.steps_rejected,
            "speed_updates": summary.speed_updates,
            "overspeed_alerts": summary.overspeed_alerts,
            "stop_timeouts": summary.stop_timeouts,
            "distance_m": summary.distance_m,
            "elapsed_s": summary.elapsed_s,
            "average_speed_mps": summary.average_speed_mps,
            "max_speed_mps": summary.max_speed_mps,
        })
        .to_string()
    } else {
        format!(
            "Session summary\n  steps: {} ({} rejected as noise)\n  distance: {:.2} m in {:.1} s\n  average speed: {:.2} m/s (max {:.2} m/s)\n  stops: {}, overspeed alerts: {}",
            summary.steps_detected,
            summary.steps_rejected,
            summary.distance_m,
            summary.elapsed_s,
            summary.average_speed_mps,
            summary.max_speed_mps,
            summary.stop_timeouts,
            summary.overspeed_alerts
        )
    };
    writeln!(out, "{text}").map_err(output_error)?;
    out.flush().map_err(output_error)
}
