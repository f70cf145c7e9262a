//! Swerve wheel odometry.
//!
//! Integrates module travel into a field pose. Translation comes from the
//! least-squares module twist; heading comes from the gyro, which drifts far
//! less than wheel-derived rotation.

use crate::core::kinematics::SwerveKinematics;
use crate::core::math::{angle_diff, normalize_angle};
use crate::core::types::{MODULE_COUNT, ModulePosition, Pose2D, Twist2D};

/// Dead-reckoning pose from module positions and gyro yaw.
#[derive(Debug, Clone)]
pub struct SwerveOdometry {
    kinematics: SwerveKinematics,
    pose: Pose2D,
    previous_positions: [ModulePosition; MODULE_COUNT],
    /// Field heading minus gyro yaw
    gyro_offset: f32,
    previous_heading: f32,
}

impl SwerveOdometry {
    /// Start at `initial_pose` given the current gyro yaw and module positions.
    pub fn new(
        kinematics: SwerveKinematics,
        gyro_yaw: f32,
        positions: [ModulePosition; MODULE_COUNT],
        initial_pose: Pose2D,
    ) -> Self {
        Self {
            kinematics,
            pose: initial_pose,
            previous_positions: positions,
            gyro_offset: angle_diff(gyro_yaw, initial_pose.theta),
            previous_heading: initial_pose.theta,
        }
    }

    /// Re-anchor the pose without touching the gyro or encoders.
    pub fn reset(
        &mut self,
        gyro_yaw: f32,
        positions: [ModulePosition; MODULE_COUNT],
        pose: Pose2D,
    ) {
        self.pose = pose;
        self.previous_positions = positions;
        self.gyro_offset = angle_diff(gyro_yaw, pose.theta);
        self.previous_heading = pose.theta;
    }

    /// Integrate one sample and return the new field pose.
    pub fn update(&mut self, gyro_yaw: f32, positions: [ModulePosition; MODULE_COUNT]) -> Pose2D {
        let heading = normalize_angle(gyro_yaw + self.gyro_offset);
        let twist = self.kinematics.to_twist(&self.previous_positions, &positions);
        let twist = Twist2D::new(
            twist.dx,
            twist.dy,
            angle_diff(self.previous_heading, heading),
        );

        let moved = self.pose.compose(&twist.exp());
        self.pose = Pose2D::new(moved.x, moved.y, heading);
        self.previous_positions = positions;
        self.previous_heading = heading;
        self.pose
    }

    /// Current odometry pose.
    pub fn pose(&self) -> Pose2D {
        self.pose
    }

    pub fn kinematics(&self) -> &SwerveKinematics {
        &self.kinematics
    }
}
