//! Thread-safe shared state.
//!
//! Written by the control thread, read by anyone:
//! - [`SharedPose`]: latest fused pose
//! - [`SharedStatus`]: what the drive is currently doing

use parking_lot::RwLock;
use std::sync::Arc;

use crate::core::types::Pose2D;

/// Fused pose published once per control cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedPose {
    /// Field pose
    pub pose: Pose2D,
    /// Time the pose refers to (microseconds); never decreases
    pub timestamp_us: u64,
    /// IMU roll (rad)
    pub roll: f32,
    /// IMU pitch (rad)
    pub pitch: f32,
    /// Set when the last cycle got no fresh signals and the pose was held
    pub stale: bool,
}

impl FusedPose {
    pub fn at(pose: Pose2D, timestamp_us: u64) -> Self {
        Self {
            pose,
            timestamp_us,
            roll: 0.0,
            pitch: 0.0,
            stale: false,
        }
    }
}

impl Default for FusedPose {
    fn default() -> Self {
        Self::at(Pose2D::identity(), 0)
    }
}

/// Latest fused pose, readable from any thread.
#[derive(Debug, Clone, Default)]
pub struct SharedPose {
    inner: Arc<RwLock<FusedPose>>,
}

impl SharedPose {
    pub fn new(initial: FusedPose) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Snapshot of the latest pose.
    pub fn get(&self) -> FusedPose {
        *self.inner.read()
    }

    /// Replace the latest pose.
    ///
    /// A pose older than the one already published is ignored; returns
    /// whether the value was stored.
    pub fn publish(&self, pose: FusedPose) -> bool {
        let mut current = self.inner.write();
        if pose.timestamp_us < current.timestamp_us {
            return false;
        }
        *current = pose;
        true
    }
}

/// Drive activity as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriveStatus {
    /// Modules stopped, no goal.
    #[default]
    Idle,
    /// Waiting for the path worker to publish.
    AwaitingPath,
    /// Tracking a path or waypoint.
    Tracking,
    /// Goal reached within tolerance.
    Arrived,
    /// Path synthesis failed; modules stopped.
    PathFailed,
}

impl DriveStatus {
    /// True once the current goal has ended, successfully or not.
    pub fn is_finished(&self) -> bool {
        matches!(self, DriveStatus::Arrived | DriveStatus::PathFailed)
    }
}

/// Latest [`DriveStatus`] plus the goal generation it refers to.
#[derive(Debug, Clone, Default)]
pub struct SharedStatus {
    inner: Arc<RwLock<(DriveStatus, u64)>>,
}

impl SharedStatus {
    pub fn get(&self) -> DriveStatus {
        self.inner.read().0
    }

    /// Status together with the goal generation it belongs to.
    pub fn get_with_generation(&self) -> (DriveStatus, u64) {
        *self.inner.read()
    }

    pub fn set(&self, status: DriveStatus, generation: u64) {
        *self.inner.write() = (status, generation);
    }
}
