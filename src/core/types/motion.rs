//! Velocity and incremental motion types.

use serde::{Deserialize, Serialize};

use super::{Point2D, Pose2D};

/// Incremental motion in the robot frame over one integration step.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Twist2D {
    /// Forward displacement (m)
    pub dx: f32,
    /// Leftward displacement (m)
    pub dy: f32,
    /// Heading change (rad)
    pub dtheta: f32,
}

impl Twist2D {
    /// Create a new twist.
    #[inline]
    pub fn new(dx: f32, dy: f32, dtheta: f32) -> Self {
        Self { dx, dy, dtheta }
    }

    /// Integrate the twist along a constant-curvature arc.
    ///
    /// Returns the resulting pose delta in the frame the motion started in.
    pub fn exp(&self) -> Pose2D {
        let (sin_t, cos_t) = self.dtheta.sin_cos();

        // Series expansion near zero rotation keeps the arc well conditioned
        let (s, c) = if self.dtheta.abs() < 1e-6 {
            (
                1.0 - self.dtheta * self.dtheta / 6.0,
                0.5 * self.dtheta,
            )
        } else {
            (sin_t / self.dtheta, (1.0 - cos_t) / self.dtheta)
        };

        Pose2D::new(
            self.dx * s - self.dy * c,
            self.dx * c + self.dy * s,
            self.dtheta,
        )
    }
}

/// Chassis velocity.
///
/// Whether the linear part is robot-relative or field-relative depends on
/// where the value came from; conversion helpers make the frame explicit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChassisSpeeds {
    /// Velocity along X (m/s)
    pub vx: f32,
    /// Velocity along Y (m/s)
    pub vy: f32,
    /// Angular velocity (rad/s), counter-clockwise positive
    pub omega: f32,
}

impl ChassisSpeeds {
    /// Create a new velocity triple.
    #[inline]
    pub fn new(vx: f32, vy: f32, omega: f32) -> Self {
        Self { vx, vy, omega }
    }

    /// Zero velocity.
    #[inline]
    pub fn stopped() -> Self {
        Self::default()
    }

    /// Convert field-relative speeds into the robot frame at `heading`.
    pub fn field_to_robot(&self, heading: f32) -> ChassisSpeeds {
        let v = Point2D::new(self.vx, self.vy).rotate(-heading);
        ChassisSpeeds::new(v.x, v.y, self.omega)
    }

    /// Convert robot-relative speeds into the field frame at `heading`.
    pub fn robot_to_field(&self, heading: f32) -> ChassisSpeeds {
        let v = Point2D::new(self.vx, self.vy).rotate(heading);
        ChassisSpeeds::new(v.x, v.y, self.omega)
    }

    /// Magnitude of the linear part.
    #[inline]
    pub fn linear_speed(&self) -> f32 {
        self.vx.hypot(self.vy)
    }
}
