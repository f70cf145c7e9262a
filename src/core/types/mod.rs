//! Core data types.
//!
//! - [`Point2D`], [`Pose2D`]: field-frame translation and pose
//! - [`Timestamped<T>`]: value plus acquisition time
//! - [`Twist2D`], [`ChassisSpeeds`]: incremental motion and velocity
//! - [`ModuleState`], [`ModulePosition`]: per-wheel swerve state

mod module;
mod motion;
mod pose;
mod timestamped;

pub use module::{MODULE_COUNT, ModulePosition, ModuleState};
pub use motion::{ChassisSpeeds, Twist2D};
pub use pose::{Point2D, Pose2D};
pub use timestamped::Timestamped;
