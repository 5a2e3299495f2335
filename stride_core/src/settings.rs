//! User-facing settings shared between the input path and the sensor path.
//!
//! Each value lives in its own `AtomicU32` holding `f32` bits, so a writer on
//! any thread replaces it in one store and the engine reads it once per sample.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{Result, StrideError};

/// Stride used until a height or explicit stride is configured.
pub const DEFAULT_STRIDE_M: f32 = 0.762;
/// Stride as a fraction of body height.
pub const STRIDE_HEIGHT_RATIO: f32 = 0.45;

/// Derive a stride length in metres from a height in centimetres.
#[inline]
pub fn stride_from_height_cm(height_cm: f32) -> f32 {
    height_cm / 100.0 * STRIDE_HEIGHT_RATIO
}

/// Values read together for one estimation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettingsSnapshot {
    pub stride_m: f32,
    /// `None` when the limit is disabled.
    pub speed_limit_mps: Option<f32>,
}

#[derive(Debug)]
struct Cells {
    stride_bits: AtomicU32,
    limit_bits: AtomicU32,
}

/// Cheaply clonable handle; all clones observe the same values.
#[derive(Debug, Clone)]
pub struct SharedSettings {
    cells: Arc<Cells>,
}

impl Default for SharedSettings {
    fn default() -> Self {
        Self::new(DEFAULT_STRIDE_M, 0.0)
    }
}

impl SharedSettings {
    /// Invalid inputs fall back to the default stride / a disabled limit.
    pub fn new(stride_m: f32, speed_limit_mps: f32) -> Self {
        let stride = if valid_stride(stride_m) {
            stride_m
        } else {
            DEFAULT_STRIDE_M
        };
        Self {
            cells: Arc::new(Cells {
                stride_bits: AtomicU32::new(stride.to_bits()),
                limit_bits: AtomicU32::new(sanitize_limit(speed_limit_mps).to_bits()),
            }),
        }
    }

    pub fn stride_length(&self) -> f32 {
        f32::from_bits(self.cells.stride_bits.load(Ordering::Acquire))
    }

    /// Configured limit, or `None` when disabled.
    pub fn speed_limit(&self) -> Option<f32> {
        let v = f32::from_bits(self.cells.limit_bits.load(Ordering::Acquire));
        (v > 0.0).then_some(v)
    }

    pub fn snapshot(&self) -> SettingsSnapshot {
        SettingsSnapshot {
            stride_m: self.stride_length(),
            speed_limit_mps: self.speed_limit(),
        }
    }

    /// Replace the stride. Non-positive or non-finite values are rejected and
    /// the previous stride stays in effect.
    pub fn set_stride_length(&self, meters: f32) -> Result<()> {
        if !valid_stride(meters) {
            tracing::warn!(meters, "rejected stride length update");
            return Err(eyre::Report::new(StrideError::Config(format!(
                "stride length must be a finite value > 0, got {meters}"
            ))));
        }
        self.cells
            .stride_bits
            .store(meters.to_bits(), Ordering::Release);
        tracing::debug!(meters, "stride length updated");
        Ok(())
    }

    /// Replace the stride with one derived from `height_cm`.
    pub fn set_height_cm(&self, height_cm: f32) -> Result<()> {
        if !(height_cm.is_finite() && height_cm > 0.0) {
            return Err(eyre::Report::new(StrideError::Config(format!(
                "height must be a finite value > 0 cm, got {height_cm}"
            ))));
        }
        self.set_stride_length(stride_from_height_cm(height_cm))
    }

    /// Replace the speed limit. 0, negative or NaN disables the check.
    pub fn set_speed_limit(&self, meters_per_second: f32) {
        let v = sanitize_limit(meters_per_second);
        self.cells.limit_bits.store(v.to_bits(), Ordering::Release);
        tracing::debug!(limit_mps = v, "speed limit updated");
    }
}

#[inline]
fn valid_stride(m: f32) -> bool {
    m.is_finite() && m > 0.0
}

#[inline]
fn sanitize_limit(v: f32) -> f32 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_to_stride() {
        assert!((stride_from_height_cm(170.0) - 0.765).abs() < 1e-6);
        assert!((stride_from_height_cm(100.0) - 0.45).abs() < 1e-6);
    }

    #[test]
    fn defaults_to_safe_stride_and_no_limit() {
        let s = SharedSettings::default();
        assert_eq!(s.stride_length(), DEFAULT_STRIDE_M);
        assert_eq!(s.speed_limit(), None);
    }

    #[test]
    fn invalid_constructor_inputs_fall_back() {
        let s = SharedSettings::new(0.0, f32::NAN);
        assert_eq!(s.stride_length(), DEFAULT_STRIDE_M);
        assert_eq!(s.speed_limit(), None);
    }

    #[test]
    fn rejected_stride_keeps_previous_value() {
        let s = SharedSettings::new(0.7, 0.0);
        assert!(s.set_stride_length(-1.0).is_err());
        assert!(s.set_stride_length(f32::INFINITY).is_err());
        assert!(s.set_stride_length(0.0).is_err());
        assert_eq!(s.stride_length(), 0.7);
    }

    #[test]
    fn limit_zero_or_negative_disables() {
        let s = SharedSettings::default();
        s.set_speed_limit(1.5);
        assert_eq!(s.speed_limit(), Some(1.5));
        s.set_speed_limit(0.0);
        assert_eq!(s.speed_limit(), None);
        s.set_speed_limit(-3.0);
        assert_eq!(s.speed_limit(), None);
    }

    #[test]
    fn clones_share_values() {
        let a = SharedSettings::default();
        let b = a.clone();
        b.set_height_cm(180.0).unwrap();
        assert!((a.stride_length() - 0.81).abs() < 1e-6);
        assert!(a.set_height_cm(0.0).is_err());
    }
}
