//! State shared between the control thread and its callers.
//!
//! - [`SharedPose`]/[`SharedStatus`]: latest fused pose and drive status
//! - [`DriveCommand`]: requests sent to the control thread

mod commands;
mod shared;

pub use commands::{CommandReceiver, CommandSender, DriveCommand, create_command_channel};
pub use shared::{DriveStatus, FusedPose, SharedPose, SharedStatus};
