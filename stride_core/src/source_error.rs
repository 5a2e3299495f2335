//! Maps `Box<dyn Error>` from trait boundaries to typed `StrideError`.
//!
//! The traits in `stride_traits` use `Box<dyn Error + Send + Sync>` so sensor
//! and sink implementations stay free of this crate; this module converts those
//! to our typed error enum, with an optional feature-gated path for
//! `stride_sensors::SensorError` downcasting.

use crate::error::StrideError;

/// Map a sensor-side error to a typed `StrideError`.
///
/// Attempts to downcast known sensor error types first, then falls back
/// to string-based heuristics.
pub fn map_source_error(e: &(dyn std::error::Error + 'static)) -> StrideError {
    #[cfg(feature = "sensor-errors")]
    {
        if let Some(se) = e.downcast_ref::<stride_sensors::error::SensorError>() {
            return match se {
                stride_sensors::error::SensorError::Timeout
                | stride_sensors::error::SensorError::DataReadyTimeout => StrideError::Timeout,
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") || s.to_lowercase().contains("timed out") {
        StrideError::Timeout
    } else {
        StrideError::Sensor(s)
    }
}

/// Map an output-side error to `StrideError::Sink`.
pub fn map_sink_error(e: &(dyn std::error::Error + 'static)) -> StrideError {
    StrideError::Sink(e.to_string())
}
