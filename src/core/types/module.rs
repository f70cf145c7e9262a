//! Per-wheel swerve module state.

use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

use crate::core::math::{angle_diff, normalize_angle};

/// Number of swerve modules on the drivetrain.
pub const MODULE_COUNT: usize = 4;

/// Commanded (or measured) module velocity: wheel speed and steer angle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleState {
    /// Wheel surface speed (m/s), signed
    pub speed: f32,
    /// Steer angle in the robot frame (rad)
    pub angle: f32,
}

impl ModuleState {
    /// Create a new module state.
    #[inline]
    pub fn new(speed: f32, angle: f32) -> Self {
        Self {
            speed,
            angle: normalize_angle(angle),
        }
    }

    /// Minimize steering travel from `current_angle`.
    ///
    /// If the target is more than 90° away, steer to the opposite
    /// direction and reverse the wheel instead.
    pub fn optimize(&self, current_angle: f32) -> ModuleState {
        let delta = angle_diff(current_angle, self.angle);
        if delta.abs() > FRAC_PI_2 {
            ModuleState::new(-self.speed, self.angle + PI)
        } else {
            *self
        }
    }
}

/// Accumulated wheel travel and steer angle for one module.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModulePosition {
    /// Total distance driven by the wheel (m)
    pub distance: f32,
    /// Steer angle in the robot frame (rad)
    pub angle: f32,
}

impl ModulePosition {
    /// Create a new module position.
    #[inline]
    pub fn new(distance: f32, angle: f32) -> Self {
        Self { distance, angle }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_optimize_keeps_small_moves() {
        let target = ModuleState::new(2.0, 0.3);
        let opt = target.optimize(0.0);
        assert_relative_eq!(opt.speed, 2.0);
        assert_relative_eq!(opt.angle, 0.3);
    }

    #[test]
    fn test_optimize_flips_large_moves() {
        let target = ModuleState::new(2.0, PI - 0.2);
        let opt = target.optimize(0.0);
        assert_relative_eq!(opt.speed, -2.0);
        assert_relative_eq!(opt.angle, -0.2, epsilon = 1e-5);
    }
}
