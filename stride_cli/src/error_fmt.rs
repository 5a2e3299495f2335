//! Human-readable error descriptions and structured JSON error formatting.

use stride_core::error::{BuildError, StrideError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSink => {
                "What happened: No output sink was provided to the speed engine.\nLikely causes: The engine was assembled without with_sink(...).\nHow to fix: Pass a sink to the builder before calling build().".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML or on the command line.\nHow to fix: Edit the config file or the flags, then rerun."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<StrideError>() {
        return match se {
            StrideError::Timeout => {
                "What happened: Accelerometer read timed out.\nLikely causes: Sensor disconnected, not streaming, or timeouts.sample_ms set too low.\nHow to fix: Check the sensor connection and consider increasing timeouts.sample_ms in the config.".to_string()
            }
            StrideError::SensorFault(msg) => format!(
                "What happened: The accelerometer reported a fault ({msg}).\nLikely causes: Sensor unplugged or delivering invalid samples.\nHow to fix: Reconnect the sensor and run `self-check`."
            ),
            StrideError::Sensor(msg) => format!(
                "What happened: Reading the accelerometer failed ({msg}).\nLikely causes: Sensor driver error.\nHow to fix: Run `self-check` and re-run with --log-level=debug for detail."
            ),
            StrideError::Config(msg) => format!(
                "What happened: Configuration is invalid ({msg}).\nLikely causes: Missing [filter] section, a typo, or an out-of-range value.\nHow to fix: Edit the TOML config and try again."
            ),
            StrideError::Sink(msg) => format!(
                "What happened: Speed output could not be delivered ({msg}).\nLikely causes: Output stream closed early (e.g. a broken pipe).\nHow to fix: Keep the consumer of stdout running for the whole session."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors that carry no typed payload
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("recording csv must have headers") {
        return "Invalid headers in recording CSV. Expected 'timestamp_ns,x,y,z'.".to_string();
    }

    if lower.contains("recording") && (lower.contains("row") || lower.contains("no samples")) {
        return format!(
            "What happened: The recording could not be used ({msg}).\nLikely causes: A malformed row or out-of-order timestamps.\nHow to fix: Fix the named row in the CSV and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable reason name for JSON output.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSink => "MissingSink",
            BuildError::InvalidConfig(_) => "ConfigError",
        };
    }
    match err.downcast_ref::<StrideError>() {
        Some(StrideError::Timeout) => "SensorTimeout",
        Some(StrideError::SensorFault(_) | StrideError::Sensor(_)) => "SensorFault",
        Some(StrideError::Config(_)) => "ConfigError",
        Some(StrideError::Sink(_)) => "SinkError",
        Some(StrideError::State(_)) => "StateError",
        Some(StrideError::Io(_)) => "IoError",
        None => "Error",
    }
}

/// Stable exit codes: config 2, sensor timeout 3, sensor fault 4, anything else 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match reason_name(err) {
        "ConfigError" => 2,
        "SensorTimeout" => 3,
        "SensorFault" => 4,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    json!({
        "event": "error",
        "reason": reason_name(err),
        "message": humanize(err),
    })
    .to_string()
}
