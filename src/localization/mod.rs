//! Pose estimation.
//!
//! - [`estimator`]: odometry history with delayed vision corrections
//! - [`vision`]: camera frame resolution (single-tag and multi-tag)
//! - [`fusion`]: per-cycle fusion engine publishing the pose

pub mod estimator;
pub mod fusion;
pub mod vision;

pub use estimator::{EstimatorConfig, PoseEstimator, VisionOutcome};
pub use fusion::{
    FrameOutcome, FusionConfig, FusionStats, PoseFusionEngine, PoseObserver,
};
pub use vision::{
    CameraFrame, Rejection, SolveMethod, TagCorner, TagObservation, resolve_frame,
    solve_multi_point,
};
