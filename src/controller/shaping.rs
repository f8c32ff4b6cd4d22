//! # Input Shaping Module
//!
//! Deadzone and response curve for normalized stick axes, plus the
//! exponential smoothing filter the pipeline runs afterwards.
//!
//! ## Deadzone
//!
//! Inputs with magnitude below the deadzone become exactly 0.0 so a resting
//! stick never drifts. The remaining travel is rescaled to use the full range.
//!
//! ## Response Curve
//!
//! `output = sign(x) * ((|x| - dz) / (1 - dz))^exponent`
//!
//! - `exponent = 1.0`: Linear response
//! - `exponent = 1.2`: Default, slightly softer around center
//! - `exponent > 2.0`: Very soft center
//!
//! ## Usage
//!
//! ```
//! use skynet_bridge::controller::shaping::Shaper;
//!
//! let shaper = Shaper::default(); // 5% deadzone, 1.2 exponent
//!
//! assert_eq!(shaper.apply(0.03), 0.0);
//! assert!((shaper.apply(1.0) - 1.0).abs() < 0.001);
//! assert!((shaper.apply(-1.0) + 1.0).abs() < 0.001);
//! ```

/// Default deadzone fraction
pub const DEFAULT_DEADZONE: f32 = 0.05;
/// Default curve exponent
pub const DEFAULT_EXPONENT: f32 = 1.2;

/// Smoothing factor for stick axes
pub const STICK_SMOOTHING: f32 = 0.4;
/// Smoothing factor for triggers
pub const TRIGGER_SMOOTHING: f32 = 0.3;

/// Shaped values below this magnitude bypass smoothing
pub const SNAP_TO_ZERO: f32 = 0.01;

/// Applies deadzone and response curve to a normalized axis value.
///
/// Input and output are in the range -1.0 to 1.0, where 0.0 is center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shaper {
    /// Deadzone as a fraction (0.0 to 0.5).
    deadzone: f32,
    /// Curve exponent (0.1 to 5.0).
    exponent: f32,
}

impl Default for Shaper {
    fn default() -> Self {
        Self {
            deadzone: DEFAULT_DEADZONE,
            exponent: DEFAULT_EXPONENT,
        }
    }
}

impl Shaper {
    /// Creates a new shaper with specified deadzone and exponent.
    ///
    /// # Arguments
    ///
    /// * `deadzone` - Deadzone fraction (0.0 to 0.5). Values outside this range are clamped.
    /// * `exponent` - Curve exponent (0.1 to 5.0). 1.0 = linear.
    ///
    /// # Examples
    ///
    /// ```
    /// use skynet_bridge::controller::shaping::Shaper;
    ///
    /// let shaper = Shaper::new(0.1, 2.0);
    /// assert_eq!(shaper.apply(0.05), 0.0);
    /// ```
    #[must_use]
    pub fn new(deadzone: f32, exponent: f32) -> Self {
        Self {
            deadzone: deadzone.clamp(0.0, 0.5),
            exponent: exponent.clamp(0.1, 5.0),
        }
    }

    /// Creates a linear shaper (no deadzone, exponent 1.0).
    #[must_use]
    pub fn linear() -> Self {
        Self {
            deadzone: 0.0,
            exponent: 1.0,
        }
    }

    /// Returns the configured deadzone value.
    #[must_use]
    pub fn deadzone(&self) -> f32 {
        self.deadzone
    }

    /// Returns the configured exponent.
    #[must_use]
    pub fn exponent(&self) -> f32 {
        self.exponent
    }

    /// Applies deadzone and curve to a normalized input.
    ///
    /// Inputs outside -1.0..=1.0 are clamped first.
    ///
    /// # Arguments
    ///
    /// * `input` - Normalized input value (-1.0 to 1.0)
    ///
    /// # Returns
    ///
    /// Shaped output value (-1.0 to 1.0), sign preserved
    #[must_use]
    pub fn apply(&self, input: f32) -> f32 {
        let clamped = input.clamp(-1.0, 1.0);
        let magnitude = clamped.abs();

        if magnitude < self.deadzone {
            return 0.0;
        }

        let scaled = ((magnitude - self.deadzone) / (1.0 - self.deadzone)).clamp(0.0, 1.0);
        clamped.signum() * scaled.powf(self.exponent)
    }
}

/// Shape `x` with the default deadzone (0.05) and exponent (1.2)
///
/// # Examples
///
/// ```
/// use skynet_bridge::controller::shaping::shape;
///
/// assert_eq!(shape(0.04), 0.0);
/// assert!(shape(0.5) > 0.0 && shape(0.5) < 0.5);
/// ```
#[must_use]
pub fn shape(x: f32) -> f32 {
    Shaper::default().apply(x)
}

/// One exponential smoothing step: `old * (1 - k) + new * k`
///
/// A `new` value below [`SNAP_TO_ZERO`] in magnitude is returned unchanged so
/// a released stick settles at exactly zero.
///
/// # Examples
///
/// ```
/// use skynet_bridge::controller::shaping::smooth;
///
/// assert!((smooth(0.0, 1.0, 0.4) - 0.4).abs() < 1e-6);
/// assert_eq!(smooth(0.8, 0.0, 0.4), 0.0);
/// ```
#[must_use]
pub fn smooth(old: f32, new: f32, k: f32) -> f32 {
    if new.abs() < SNAP_TO_ZERO {
        return new;
    }
    old * (1.0 - k) + new * k
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Shaper Tests ====================

    #[test]
    fn test_shaper_default() {
        let shaper = Shaper::default();
        assert!((shaper.deadzone() - 0.05).abs() < 0.001);
        assert!((shaper.exponent() - 1.2).abs() < 0.001);
    }

    #[test]
    fn test_shaper_clamps_parameters() {
        let shaper = Shaper::new(0.9, 10.0);
        assert!((shaper.deadzone() - 0.5).abs() < 0.001);
        assert!((shaper.exponent() - 5.0).abs() < 0.001);

        let shaper = Shaper::new(-0.1, 0.0);
        assert_eq!(shaper.deadzone(), 0.0);
        assert!((shaper.exponent() - 0.1).abs() < 0.001);
    }

    #[test]
    fn test_linear_is_identity() {
        let shaper = Shaper::linear();
        assert!((shaper.apply(0.5) - 0.5).abs() < 0.001);
        assert!((shaper.apply(-0.25) + 0.25).abs() < 0.001);
    }

    // ==================== Deadzone Tests ====================

    #[test]
    fn test_inside_deadzone_is_zero() {
        for x in [0.0, 0.01, -0.01, 0.049, -0.049] {
            assert_eq!(shape(x), 0.0, "shape({}) should be zero", x);
        }
    }

    #[test]
    fn test_deadzone_edge_is_zero() {
        // (0.05 - 0.05) / 0.95 = 0
        assert_eq!(shape(0.05), 0.0);
    }

    #[test]
    fn test_just_outside_deadzone_is_small() {
        let v = shape(0.06);
        assert!(v > 0.0 && v < 0.01);
    }

    // ==================== Curve Tests ====================

    #[test]
    fn test_full_deflection_preserved() {
        assert!((shape(1.0) - 1.0).abs() < 1e-6);
        assert!((shape(-1.0) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_range_input_clamped() {
        assert!((shape(3.0) - 1.0).abs() < 1e-6);
        assert!((shape(-3.0) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_curve_softens_midrange() {
        // ((0.5 - 0.05) / 0.95)^1.2 ≈ 0.408
        let v = shape(0.5);
        assert!((v - 0.408).abs() < 0.005, "got {}", v);
    }

    #[test]
    fn test_shape_is_odd() {
        for x in [0.1, 0.3, 0.7, 0.95] {
            assert!((shape(x) + shape(-x)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_shape_is_monotonic() {
        let mut last = shape(-1.0);
        for i in -99..=100 {
            let v = shape(i as f32 / 100.0);
            assert!(v >= last, "not monotonic at {}", i);
            last = v;
        }
    }

    // ==================== Smoothing Tests ====================

    #[test]
    fn test_smooth_blends() {
        assert!((smooth(0.5, 1.0, 0.4) - 0.7).abs() < 1e-6);
        assert!((smooth(1.0, 0.5, 0.3) - 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_smooth_snaps_small_values() {
        assert_eq!(smooth(0.9, 0.005, 0.4), 0.005);
        assert_eq!(smooth(-0.9, 0.0, 0.3), 0.0);
    }

    #[test]
    fn test_smooth_converges() {
        let mut v = 0.0;
        for _ in 0..50 {
            v = smooth(v, 1.0, STICK_SMOOTHING);
        }
        assert!((v - 1.0).abs() < 1e-4);
    }
}
