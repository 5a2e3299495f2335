//! Gravity removal: a single-pole low-pass estimate of gravity per axis,
//! subtracted from the raw reading to leave linear acceleration.

use stride_traits::AccelSample;

/// Gravity-removed acceleration in m/s².
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinearAccel {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl LinearAccel {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm, accumulated in f64 so large finite vectors cannot
    /// overflow to 0. Saturates at `f32::MAX`; non-finite components yield 0.
    #[inline]
    pub fn magnitude(&self) -> f32 {
        let (x, y, z) = (f64::from(self.x), f64::from(self.y), f64::from(self.z));
        let m = (x * x + y * y + z * z).sqrt();
        if m.is_finite() {
            (m as f32).min(f32::MAX)
        } else {
            0.0
        }
    }
}

/// Replace NaN/±Inf sensor components with 0 so they cannot poison the estimate.
#[inline]
fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

#[derive(Debug, Clone)]
pub struct GravityFilter {
    alpha: f32,
    estimate: [f32; 3],
}

impl GravityFilter {
    /// `alpha` is clamped into [0, 1].
    pub fn new(alpha: f32) -> Self {
        let alpha = if alpha.is_finite() {
            alpha.clamp(0.0, 1.0)
        } else {
            0.8
        };
        Self {
            alpha,
            estimate: [0.0; 3],
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Current gravity estimate per axis.
    pub fn gravity(&self) -> [f32; 3] {
        self.estimate
    }

    pub fn reset(&mut self) {
        self.estimate = [0.0; 3];
    }

    /// Fold one sample into the gravity estimate and return the linear part.
    pub fn update(&mut self, sample: &AccelSample) -> LinearAccel {
        let raw = [
            finite_or_zero(sample.x),
            finite_or_zero(sample.y),
            finite_or_zero(sample.z),
        ];
        let a = self.alpha;
        let one_m_a = 1.0 - a;
        let mut linear = [0.0f32; 3];
        for i in 0..3 {
            self.estimate[i] = a * self.estimate[i] + one_m_a * raw[i];
            linear[i] = raw[i] - self.estimate[i];
        }
        LinearAccel::new(linear[0], linear[1], linear[2])
    }
}

impl Default for GravityFilter {
    fn default() -> Self {
        Self::new(0.8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_passes_one_minus_alpha_of_input() {
        let mut f = GravityFilter::new(0.8);
        let out = f.update(&AccelSample::new(0, 0.0, 0.0, 10.0));
        assert!((out.z - 8.0).abs() < 1e-5);
        assert!((f.gravity()[2] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn constant_input_converges_to_zero() {
        let mut f = GravityFilter::new(0.8);
        let s = AccelSample::new(0, 1.0, -2.0, 9.81);
        let input_mag = LinearAccel::new(s.x, s.y, s.z).magnitude();
        let mut out = LinearAccel::default();
        for _ in 0..25 {
            out = f.update(&s);
        }
        assert!(out.magnitude() < 0.01 * input_mag, "residual {out:?}");
    }

    #[test]
    fn zero_vector_magnitude_is_zero() {
        assert_eq!(LinearAccel::default().magnitude(), 0.0);
    }

    #[test]
    fn large_finite_vectors_keep_their_magnitude() {
        let m = LinearAccel::new(3e19, 0.0, 0.0).magnitude();
        assert!((m - 3e19).abs() / 3e19 < 1e-6, "magnitude {m}");
        assert_eq!(LinearAccel::new(f32::MAX, f32::MAX, 0.0).magnitude(), f32::MAX);
        assert!((LinearAccel::new(3.0, 4.0, 0.0).magnitude() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn non_finite_components_are_ignored() {
        let mut f = GravityFilter::new(0.8);
        let out = f.update(&AccelSample::new(0, f32::NAN, f32::INFINITY, 1.0));
        assert_eq!(out.x, 0.0);
        assert_eq!(out.y, 0.0);
        assert!(out.magnitude().is_finite());
        assert!(f.gravity().iter().all(|g| g.is_finite()));
    }

    #[test]
    fn reset_clears_estimate() {
        let mut f = GravityFilter::default();
        f.update(&AccelSample::new(0, 3.0, 3.0, 3.0));
        f.reset();
        assert_eq!(f.gravity(), [0.0; 3]);
    }
}
