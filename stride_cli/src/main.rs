#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Walking speed CLI: live sessions against the simulated walker, offline
//! replay of recordings, and small helpers.

mod cli;
mod error_fmt;
mod session;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use stride_config::Config;
use stride_core::error::StrideError;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE, json_mode};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::session::WalkOpts;

/// Used when `--config` is not given.
const DEFAULT_CONFIG: &str = r#"
[filter]
gravity_alpha = 0.8
sample_rate_hz = 50
"#;

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("warning: could not install error report handler: {e}");
    }

    let code = match real_main(cli) {
        Ok(()) => 0,
        Err(e) => {
            if json_mode() {
                println!("{}", format_error_json(&e));
            } else {
                eprintln!("{}", humanize(&e));
            }
            tracing::debug!(error = ?e, "command failed");
            exit_code_for_error(&e)
        }
    };
    std::process::exit(code);
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(cli.config.as_deref())?;
    let level = cli
        .log_level
        .as_deref()
        .or(cfg.logging.level.as_deref())
        .unwrap_or("info");
    init_tracing(level, &cfg.logging, cli.json)?;

    match cli.cmd {
        Commands::Walk {
            user,
            cadence_hz,
            walk_ms,
            idle_ms,
            direct,
            max_run_ms,
            fast,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
                tracing::warn!(error = %e, "Ctrl-C handler not installed");
            }
            let opts = WalkOpts {
                cadence_hz,
                walk_ms,
                idle_ms,
                direct,
                max_run_ms,
                fast,
            };
            session::run_walk(&cfg, &user, &opts, &shutdown)
        }
        Commands::Replay { input, user } => session::run_replay(&cfg, &input, &user),
        Commands::Stride { height_cm } => session::print_stride(height_cm),
        Commands::SelfCheck => session::self_check(&cfg),
    }
}

fn config_error(msg: String) -> eyre::Report {
    eyre::Report::new(StrideError::Config(msg))
}

/// Read, parse and validate the typed config; every failure is a config error.
fn load_config(path: Option<&Path>) -> eyre::Result<Config> {
    let (text, origin) = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .map_err(|e| config_error(format!("cannot read {}: {e}", p.display())))?;
            (text, p.display().to_string())
        }
        None => (DEFAULT_CONFIG.to_string(), "built-in defaults".to_string()),
    };
    let cfg = stride_config::load_toml(&text).map_err(|e: toml::de::Error| {
        config_error(format!("{origin}: {}", e.message().trim()))
    })?;
    cfg.validate()
        .map_err(|e| config_error(format!("{origin}: {e:#}")))?;
    Ok(cfg)
}

/// Console logs go to stderr so stdout stays reserved for speed output.
fn init_tracing(level: &str, logging: &stride_config::Logging, json: bool) -> eyre::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| config_error(format!("invalid log level '{level}': {e}")))?,
    };

    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file = match logging.file.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| config_error(format!("logging.file has no file name: {}", path.display())))?;
            let rotation = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::Rotation::DAILY,
                Some("hourly") => tracing_appender::rolling::Rotation::HOURLY,
                _ => tracing_appender::rolling::Rotation::NEVER,
            };
            let appender = tracing_appender::rolling::RollingFileAppender::new(rotation, dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .wrap_err("installing tracing subscriber")?;
    Ok(())
}
