//! CLI argument definitions and shared statics.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[inline]
pub fn json_mode() -> bool {
    JSON_MODE.get().copied().unwrap_or(false)
}

#[derive(Parser, Debug)]
#[command(name = "stride", version, about = "Walking speed from a body-worn accelerometer")]
pub struct Cli {
    /// Path to config TOML (typed); built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit one JSON object per line instead of human-readable text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Per-run overrides of the `[user]` config section.
#[derive(Args, Debug, Clone, Default)]
pub struct UserArgs {
    /// Body height in centimetres; the stride is derived from it
    #[arg(long, value_name = "CM", value_parser = parse_height_cm, allow_negative_numbers = true)]
    pub height_cm: Option<f32>,
    /// Explicit stride length in metres (wins over --height-cm)
    #[arg(long, value_name = "M", value_parser = parse_stride_m, allow_negative_numbers = true)]
    pub stride_m: Option<f32>,
    /// Alert when speed exceeds this many m/s; 0 disables
    #[arg(long, value_name = "MPS", value_parser = parse_speed_limit, allow_negative_numbers = true)]
    pub speed_limit: Option<f32>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Live session against the simulated walker
    Walk {
        #[command(flatten)]
        user: UserArgs,
        /// Steps per second while walking
        #[arg(long, value_name = "HZ", default_value_t = 2.0)]
        cadence_hz: f32,
        /// Duration of the walking phase
        #[arg(long, value_name = "MS", default_value_t = 10_000)]
        walk_ms: u64,
        /// Standing still after the walk, before the stream ends
        #[arg(long, value_name = "MS", default_value_t = 3_000)]
        idle_ms: u64,
        /// Read the sensor on the engine thread (no sampler)
        #[arg(long, action = ArgAction::SetTrue)]
        direct: bool,
        /// End the session after this many ms
        #[arg(long, value_name = "MS")]
        max_run_ms: Option<u64>,
        /// Deliver simulated samples as fast as they are read (implies --direct)
        #[arg(long, action = ArgAction::SetTrue)]
        fast: bool,
    },
    /// Offline session over a recorded CSV (timestamp_ns,x,y,z)
    Replay {
        /// Recording to process
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
        #[command(flatten)]
        user: UserArgs,
    },
    /// Print the stride length derived from a height
    Stride {
        #[arg(long, value_name = "CM", value_parser = parse_height_cm, allow_negative_numbers = true)]
        height_cm: f32,
    },
    /// Quick sensor presence check
    SelfCheck,
}

fn parse_positive(s: &str, what: &str, max: f32) -> Result<f32, String> {
    let v: f32 = s
        .trim()
        .parse()
        .map_err(|_| format!("{what} must be a positive number, got '{s}'"))?;
    if !v.is_finite() || v <= 0.0 {
        return Err(format!("{what} must be a positive number, got '{s}'"));
    }
    if v > max {
        return Err(format!("{what} must be at most {max}, got '{s}'"));
    }
    Ok(v)
}

pub fn parse_height_cm(s: &str) -> Result<f32, String> {
    parse_positive(s, "height in cm", 300.0)
}

pub fn parse_stride_m(s: &str) -> Result<f32, String> {
    parse_positive(s, "stride in metres", 3.0)
}

pub fn parse_speed_limit(s: &str) -> Result<f32, String> {
    let v: f32 = s
        .trim()
        .parse()
        .map_err(|_| format!("speed limit must be a number of m/s, got '{s}'"))?;
    if !v.is_finite() || v < 0.0 {
        return Err(format!("speed limit must be >= 0 m/s, got '{s}'"));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_parser_rejects_non_positive_and_garbage() {
        assert_eq!(parse_height_cm("170"), Ok(170.0));
        assert!(parse_height_cm("0").is_err());
        assert!(parse_height_cm("-5").is_err());
        assert!(parse_height_cm("tall").is_err());
        assert!(parse_height_cm("NaN").is_err());
        assert!(parse_height_cm("301").is_err());
    }

    #[test]
    fn speed_limit_allows_zero() {
        assert_eq!(parse_speed_limit("0"), Ok(0.0));
        assert!(parse_speed_limit("-1").is_err());
    }

    #[test]
    fn negative_values_reach_the_value_parsers() {
        let cases: [&[&str]; 4] = [
            &["stride", "stride", "--height-cm", "-5"],
            &["stride", "walk", "--height-cm", "-170"],
            &["stride", "walk", "--stride-m", "-1"],
            &["stride", "replay", "--input", "walk.csv", "--speed-limit", "-1"],
        ];
        for args in cases {
            let err = Cli::try_parse_from(args).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation, "{args:?}");
            let text = err.to_string();
            assert!(
                text.contains("positive number") || text.contains(">= 0 m/s"),
                "{args:?}: {text}"
            );
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
