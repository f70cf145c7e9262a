//! Angle arithmetic and small numeric helpers shared by every layer.

use std::f32::consts::{PI, TAU};

/// Wrap an angle into [-π, π].
///
/// # Example
/// ```
/// use gati_nav::core::math::normalize_angle;
/// use std::f32::consts::PI;
///
/// assert!((normalize_angle(1.5 * PI) + 0.5 * PI).abs() < 1e-6);
/// ```
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle % TAU;
    if a > PI {
        a -= TAU;
    } else if a < -PI {
        a += TAU;
    }
    a
}

/// Signed shortest rotation that takes `from` onto `to`.
#[inline]
pub fn angle_diff(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

/// Interpolate between two headings along the shorter arc.
///
/// `t = 0` yields `from`, `t = 1` yields `to`.
#[inline]
pub fn angle_lerp(from: f32, to: f32, t: f32) -> f32 {
    normalize_angle(from + angle_diff(from, to) * t)
}

/// Plain linear interpolation.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Convert a microsecond timestamp difference to seconds.
///
/// Negative spans (sample newer than the reference) come back as zero.
#[inline]
pub fn elapsed_secs(since_us: u64, now_us: u64) -> f32 {
    now_us.saturating_sub(since_us) as f32 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_normalize_keeps_range() {
        assert_relative_eq!(normalize_angle(0.0), 0.0);
        assert_relative_eq!(normalize_angle(PI), PI);
        assert_relative_eq!(normalize_angle(-PI), -PI);
        assert_relative_eq!(normalize_angle(TAU + 0.25), 0.25, epsilon = 1e-5);
        assert_relative_eq!(normalize_angle(-TAU - 0.25), -0.25, epsilon = 1e-5);
    }

    #[test]
    fn test_angle_diff_wraps_short_way() {
        assert_relative_eq!(angle_diff(PI - 0.1, -PI + 0.1), 0.2, epsilon = 1e-5);
        assert_relative_eq!(angle_diff(-PI + 0.1, PI - 0.1), -0.2, epsilon = 1e-5);
        assert_relative_eq!(angle_diff(0.0, FRAC_PI_2), FRAC_PI_2);
    }

    #[test]
    fn test_angle_lerp_endpoints_and_midpoint() {
        assert_relative_eq!(angle_lerp(0.0, FRAC_PI_2, 0.0), 0.0);
        assert_relative_eq!(angle_lerp(0.0, FRAC_PI_2, 1.0), FRAC_PI_2);
        assert_relative_eq!(angle_lerp(0.0, FRAC_PI_2, 0.5), FRAC_PI_2 / 2.0);
        // Crosses the ±π seam instead of sweeping through zero
        assert_relative_eq!(
            angle_lerp(PI - 0.1, -PI + 0.1, 0.5).abs(),
            PI,
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_elapsed_secs_saturates() {
        assert_relative_eq!(elapsed_secs(1_000_000, 1_500_000), 0.5);
        assert_eq!(elapsed_secs(2_000_000, 1_000_000), 0.0);
    }

    #[test]
    fn test_lerp() {
        assert_relative_eq!(lerp(2.0, 4.0, 0.25), 2.5);
    }
}
