//! Commands for the control thread.
//!
//! Sent over a crossbeam channel and drained at the start of every control
//! cycle.

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::core::types::Pose2D;
use crate::planning::Waypoint;

/// Requests handled by the control thread.
#[derive(Debug, Clone)]
pub enum DriveCommand {
    /// Follow whatever path the path worker publishes for `generation`.
    FollowPath { generation: u64 },
    /// Drive straight at a single waypoint.
    DriveTo { target: Waypoint },
    /// Re-anchor the pose estimate.
    ResetPose { pose: Pose2D },
    /// Stop all modules and drop the goal.
    Stop,
}

/// Sender end of the command channel.
pub type CommandSender = Sender<DriveCommand>;

/// Receiver end of the command channel (held by the control thread).
pub type CommandReceiver = Receiver<DriveCommand>;

/// Create a new command channel pair.
pub fn create_command_channel() -> (CommandSender, CommandReceiver) {
    unbounded()
}
