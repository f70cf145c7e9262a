//! Field-frame points and poses.

use serde::{Deserialize, Serialize};

use crate::core::math::{angle_lerp, normalize_angle};

use super::Timestamped;

/// A translation on the field, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    /// X coordinate in meters
    pub x: f32,
    /// Y coordinate in meters
    pub y: f32,
}

impl Point2D {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point.
    #[inline]
    pub fn distance_squared(&self, other: &Point2D) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point2D) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Length of the vector from the origin.
    #[inline]
    pub fn norm(&self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Component-wise difference `self - other`.
    #[inline]
    pub fn sub(&self, other: &Point2D) -> Point2D {
        Point2D::new(self.x - other.x, self.y - other.y)
    }

    /// Scale both components.
    #[inline]
    pub fn scale(&self, factor: f32) -> Point2D {
        Point2D::new(self.x * factor, self.y * factor)
    }

    /// Linear interpolation towards `other`.
    #[inline]
    pub fn lerp(&self, other: &Point2D, t: f32) -> Point2D {
        Point2D::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// Rotate the vector counter-clockwise by `angle` radians.
    #[inline]
    pub fn rotate(&self, angle: f32) -> Point2D {
        let (sin_a, cos_a) = angle.sin_cos();
        Point2D::new(self.x * cos_a - self.y * sin_a, self.x * sin_a + self.y * cos_a)
    }
}

/// Robot pose on the field.
///
/// `theta` is the heading in radians, kept in [-π, π].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    /// X position in meters
    pub x: f32,
    /// Y position in meters
    pub y: f32,
    /// Heading in radians
    pub theta: f32,
}

impl Pose2D {
    /// Create a pose, normalizing the heading.
    #[inline]
    pub fn new(x: f32, y: f32, theta: f32) -> Self {
        Self {
            x,
            y,
            theta: normalize_angle(theta),
        }
    }

    /// Pose at the field origin facing +X.
    #[inline]
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
        }
    }

    /// Build a pose from a translation and a heading.
    #[inline]
    pub fn from_parts(translation: Point2D, theta: f32) -> Self {
        Self::new(translation.x, translation.y, theta)
    }

    /// Translation component.
    #[inline]
    pub fn translation(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// Apply `other`, expressed in this pose's frame: `self ⊕ other`.
    #[inline]
    pub fn compose(&self, other: &Pose2D) -> Pose2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Pose2D::new(
            self.x + other.x * cos_t - other.y * sin_t,
            self.y + other.x * sin_t + other.y * cos_t,
            self.theta + other.theta,
        )
    }

    /// The transform that undoes this pose.
    #[inline]
    pub fn inverse(&self) -> Pose2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Pose2D::new(
            -self.x * cos_t - self.y * sin_t,
            self.x * sin_t - self.y * cos_t,
            -self.theta,
        )
    }

    /// `other` expressed in this pose's frame: `self⁻¹ ⊕ other`.
    #[inline]
    pub fn relative(&self, other: &Pose2D) -> Pose2D {
        self.inverse().compose(other)
    }

    /// Map a point from this pose's frame into the field frame.
    #[inline]
    pub fn transform_point(&self, point: &Point2D) -> Point2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Point2D::new(
            self.x + point.x * cos_t - point.y * sin_t,
            self.y + point.x * sin_t + point.y * cos_t,
        )
    }

    /// Interpolate between two timestamped poses.
    ///
    /// Returns `None` when `target_us` lies outside `[start, end]`.
    pub fn interpolate(
        start: &Timestamped<Pose2D>,
        end: &Timestamped<Pose2D>,
        target_us: u64,
    ) -> Option<Pose2D> {
        if target_us < start.timestamp_us || target_us > end.timestamp_us {
            return None;
        }
        if start.timestamp_us == end.timestamp_us {
            return Some(start.data);
        }

        let t = (target_us - start.timestamp_us) as f32
            / (end.timestamp_us - start.timestamp_us) as f32;

        Some(Pose2D {
            x: start.data.x + t * (end.data.x - start.data.x),
            y: start.data.y + t * (end.data.y - start.data.y),
            theta: angle_lerp(start.data.theta, end.data.theta, t),
        })
    }
}

impl Default for Pose2D {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_point_ops() {
        let a = Point2D::new(1.0, 1.0);
        let b = Point2D::new(4.0, 5.0);
        assert_relative_eq!(a.distance(&b), 5.0);
        assert_relative_eq!(b.sub(&a).norm(), 5.0);
        let mid = a.lerp(&b, 0.5);
        assert_relative_eq!(mid.x, 2.5);
        assert_relative_eq!(mid.y, 3.0);

        let r = Point2D::new(1.0, 0.0).rotate(FRAC_PI_2);
        assert_relative_eq!(r.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(r.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_compose_then_relative_recovers_delta() {
        let base = Pose2D::new(2.0, -1.0, 0.7);
        let delta = Pose2D::new(0.4, 0.1, -0.2);
        let moved = base.compose(&delta);
        let back = base.relative(&moved);
        assert_relative_eq!(back.x, delta.x, epsilon = 1e-5);
        assert_relative_eq!(back.y, delta.y, epsilon = 1e-5);
        assert_relative_eq!(back.theta, delta.theta, epsilon = 1e-5);
    }

    #[test]
    fn test_inverse_cancels() {
        let p = Pose2D::new(1.0, 2.0, 0.5);
        let r = p.compose(&p.inverse());
        assert_relative_eq!(r.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(r.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(r.theta, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_transform_point() {
        let pose = Pose2D::new(1.0, 0.0, FRAC_PI_2);
        let p = pose.transform_point(&Point2D::new(1.0, 0.0));
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_interpolate() {
        let start = Timestamped::new(Pose2D::new(0.0, 0.0, 0.0), 1_000);
        let end = Timestamped::new(Pose2D::new(2.0, 4.0, PI / 2.0), 2_000);

        let mid = Pose2D::interpolate(&start, &end, 1_500).unwrap();
        assert_relative_eq!(mid.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(mid.y, 2.0, epsilon = 1e-6);
        assert_relative_eq!(mid.theta, PI / 4.0, epsilon = 1e-6);

        assert!(Pose2D::interpolate(&start, &end, 999).is_none());
        assert!(Pose2D::interpolate(&start, &end, 2_001).is_none());
    }
}
