//! GatiNav - pose fusion, zone-graph path synthesis and swerve pursuit
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   main.rs / io/                     │  ← Node binary, drivetrain
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                 threads/ + state/                   │  ← Orchestration
//! │        (control loop, path workers, handles)        │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌──────────────────┬──────────────────┬───────────────┐
//! │  localization/   │    planning/     │   control/    │  ← Algorithms
//! │ (estimator,      │ (zones, segments │ (pursuit,     │
//! │  vision, fusion) │  profile, path)  │  follower)    │
//! └──────────────────┴──────────────────┴───────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                   sensors/                          │  ← Signal processing
//! │      (latency compensation, batches, odometry)      │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │             (types, math, kinematics)               │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Conventions: field frame in meters with +X forward and +Y left, angles in
//! radians normalized to [-π, π], timestamps in microseconds on one
//! monotonic clock.

pub mod config;
pub mod control;
pub mod core;
pub mod error;
pub mod io;
pub mod localization;
pub mod planning;
pub mod sensors;
pub mod state;
pub mod threads;
pub mod utils;

pub use crate::config::GatiConfig;
pub use crate::core::kinematics::SwerveKinematics;
pub use crate::core::types::{ChassisSpeeds, ModuleState, Point2D, Pose2D, Timestamped};
pub use error::{AssetError, Error, PathError, Result};
pub use localization::{FusionConfig, PoseEstimator, PoseFusionEngine};
pub use planning::{Path, PathSynthesizer, SegmentTable, ZoneMap};
pub use state::{DriveStatus, FusedPose};
pub use threads::{ControlLoop, ControlThread, DriveHandle, PathRequester};
