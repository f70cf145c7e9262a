//! Foundation layer.
//!
//! This is the bottom layer with no internal dependencies.
//!
//! - [`types`]: poses, timestamps, velocities, module states
//! - [`math`]: angle normalization and interpolation
//! - [`kinematics`]: swerve inverse/forward kinematics and desaturation

pub mod kinematics;
pub mod math;
pub mod types;
