//! Odometry/vision pose estimator.
//!
//! Odometry is integrated every cycle and kept in a short history. A vision
//! pose arrives late, stamped with its exposure time. The estimator looks up
//! what it believed at that instant, blends toward the vision pose with a
//! fixed per-axis gain, and stores the result as a correction anchored to
//! the odometry pose at that time. The current estimate is always
//!
//! ```text
//! estimate(t) = correction.pose ⊕ (correction.odometry⁻¹ ⊕ odometry(t))
//! ```
//!
//! so odometry motion since the exposure is replayed on top of the
//! corrected pose. Without any vision the estimate is pure odometry.
//!
//! Raw vision poses are kept alongside the corrections. When a frame
//! arrives out of order, every correction from its timestamp onward is
//! recomputed in timestamp order, so the result does not depend on
//! arrival order.

use std::collections::{BTreeMap, VecDeque};

use crate::core::kinematics::SwerveKinematics;
use crate::core::types::{MODULE_COUNT, ModulePosition, Pose2D, Timestamped};
use crate::sensors::SwerveOdometry;

/// Estimator tuning.
#[derive(Debug, Clone, Copy)]
pub struct EstimatorConfig {
    /// Odometry trust [x m, y m, heading rad]
    pub state_std_devs: [f32; 3],
    /// Vision trust [x m, y m, heading rad]
    pub vision_std_devs: [f32; 3],
    /// How long odometry history is kept for late measurements
    pub history_window_us: u64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            state_std_devs: [0.1; 3],
            vision_std_devs: [0.9; 3],
            history_window_us: 1_500_000,
        }
    }
}

/// Outcome of offering a vision pose to the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisionOutcome {
    Applied,
    /// Older than the retained odometry history
    TooOld,
}

/// A vision correction anchored to the odometry pose at the same instant.
#[derive(Debug, Clone, Copy)]
struct Correction {
    pose: Pose2D,
    odometry: Pose2D,
}

impl Correction {
    /// Replay odometry motion since the correction onto the corrected pose.
    fn apply(&self, odometry: &Pose2D) -> Pose2D {
        self.pose.compose(&self.odometry.relative(odometry))
    }
}

/// Fuses swerve odometry with delayed vision poses.
#[derive(Debug, Clone)]
pub struct PoseEstimator {
    odometry: SwerveOdometry,
    history: VecDeque<Timestamped<Pose2D>>,
    corrections: BTreeMap<u64, Correction>,
    /// Raw vision poses inside the history window, keyed by exposure time
    measurements: BTreeMap<u64, Pose2D>,
    gain: [f32; 3],
    window_us: u64,
    estimate: Pose2D,
}

impl PoseEstimator {
    pub fn new(
        config: EstimatorConfig,
        kinematics: SwerveKinematics,
        gyro_yaw: f32,
        positions: [ModulePosition; MODULE_COUNT],
        initial_pose: Pose2D,
    ) -> Self {
        Self {
            odometry: SwerveOdometry::new(kinematics, gyro_yaw, positions, initial_pose),
            history: VecDeque::new(),
            corrections: BTreeMap::new(),
            measurements: BTreeMap::new(),
            gain: vision_gain(&config.state_std_devs, &config.vision_std_devs),
            window_us: config.history_window_us,
            estimate: initial_pose,
        }
    }

    /// Integrate one odometry sample taken at `timestamp_us`.
    pub fn update(
        &mut self,
        timestamp_us: u64,
        gyro_yaw: f32,
        positions: [ModulePosition; MODULE_COUNT],
    ) -> Pose2D {
        let odometry = self.odometry.update(gyro_yaw, positions);

        // History must stay time ordered for interpolation
        match self.history.back() {
            Some(last) if timestamp_us < last.timestamp_us => {
                log::debug!(
                    "Odometry sample at {} older than history head {}, not recorded",
                    timestamp_us,
                    last.timestamp_us
                );
            }
            Some(last) if timestamp_us == last.timestamp_us => {
                if let Some(back) = self.history.back_mut() {
                    back.data = odometry;
                }
            }
            _ => self.history.push_back(Timestamped::new(odometry, timestamp_us)),
        }
        self.trim(timestamp_us);

        self.estimate = self.current_from(&odometry);
        self.estimate
    }

    /// Blend a vision pose measured at `timestamp_us` into the estimate.
    pub fn add_vision_measurement(&mut self, vision: Pose2D, timestamp_us: u64) -> VisionOutcome {
        let Some(oldest) = self.history.front() else {
            return VisionOutcome::TooOld;
        };
        if timestamp_us < oldest.timestamp_us {
            return VisionOutcome::TooOld;
        }

        if self.odometry_at(timestamp_us).is_none() {
            return VisionOutcome::TooOld;
        }

        self.measurements.insert(timestamp_us, vision);
        if self.measurements.range(timestamp_us + 1..).next().is_some() {
            log::trace!("Vision at {} us arrived out of order, replaying", timestamp_us);
        }
        self.replay_from(timestamp_us);

        self.estimate = self.current_from(&self.odometry.pose());
        VisionOutcome::Applied
    }

    /// Hard reset to `pose`, dropping history and corrections.
    pub fn reset_pose(
        &mut self,
        gyro_yaw: f32,
        positions: [ModulePosition; MODULE_COUNT],
        pose: Pose2D,
    ) {
        self.odometry.reset(gyro_yaw, positions, pose);
        self.history.clear();
        self.corrections.clear();
        self.measurements.clear();
        self.estimate = pose;
    }

    /// Fused pose as of the last update.
    pub fn estimate(&self) -> Pose2D {
        self.estimate
    }

    /// Pure odometry pose, ignoring every vision correction.
    pub fn odometry_pose(&self) -> Pose2D {
        self.odometry.pose()
    }

    /// Timestamp of the oldest retained odometry sample.
    pub fn oldest_history_us(&self) -> Option<u64> {
        self.history.front().map(|h| h.timestamp_us)
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Recompute every correction at or after `from_us` in timestamp order.
    fn replay_from(&mut self, from_us: u64) {
        let _ = self.corrections.split_off(&from_us);
        let pending: Vec<(u64, Pose2D)> = self
            .measurements
            .range(from_us..)
            .map(|(&t, &pose)| (t, pose))
            .collect();

        for (timestamp_us, vision) in pending {
            let Some(odometry_then) = self.odometry_at(timestamp_us) else {
                continue;
            };
            let estimate_then = self.estimate_at(timestamp_us, &odometry_then);

            let delta = estimate_then.relative(&vision);
            let scaled = Pose2D::new(
                delta.x * self.gain[0],
                delta.y * self.gain[1],
                delta.theta * self.gain[2],
            );
            self.corrections.insert(
                timestamp_us,
                Correction {
                    pose: estimate_then.compose(&scaled),
                    odometry: odometry_then,
                },
            );
        }
    }

    fn current_from(&self, odometry: &Pose2D) -> Pose2D {
        match self.corrections.last_key_value() {
            Some((_, correction)) => correction.apply(odometry),
            None => *odometry,
        }
    }

    fn estimate_at(&self, timestamp_us: u64, odometry: &Pose2D) -> Pose2D {
        match self.corrections.range(..=timestamp_us).next_back() {
            Some((_, correction)) => correction.apply(odometry),
            None => *odometry,
        }
    }

    /// Odometry pose at an arbitrary time inside the history window.
    fn odometry_at(&self, timestamp_us: u64) -> Option<Pose2D> {
        let newest = self.history.back()?;
        if timestamp_us >= newest.timestamp_us {
            return Some(newest.data);
        }
        let idx = self
            .history
            .partition_point(|h| h.timestamp_us <= timestamp_us);
        if idx == 0 {
            return None;
        }
        Pose2D::interpolate(&self.history[idx - 1], &self.history[idx], timestamp_us)
    }

    fn trim(&mut self, now_us: u64) {
        let cutoff = now_us.saturating_sub(self.window_us);
        while self
            .history
            .front()
            .is_some_and(|h| h.timestamp_us < cutoff)
        {
            self.history.pop_front();
        }

        // Keep the newest correction at or before the window start; it still
        // anchors every estimate inside the window
        let Some(oldest) = self.history.front().map(|h| h.timestamp_us) else {
            return;
        };
        let anchor = self.corrections.range(..=oldest).next_back().map(|(&k, _)| k);
        if let Some(anchor) = anchor {
            self.corrections = self.corrections.split_off(&anchor);
        }
        // Frames before the window can no longer be replayed
        self.measurements = self.measurements.split_off(&oldest);
    }
}

/// Per-axis steady-state gain for blending vision into the state.
///
/// With q the odometry variance and r the vision variance,
/// `K = q / (q + sqrt(q·r))`. Zero odometry variance ignores vision.
fn vision_gain(state_std: &[f32; 3], vision_std: &[f32; 3]) -> [f32; 3] {
    let mut gain = [0.0f32; 3];
    for (k, (s, v)) in gain.iter_mut().zip(state_std.iter().zip(vision_std.iter())) {
        let q = s * s;
        let r = v * v;
        *k = if q == 0.0 { 0.0 } else { q / (q + (q * r).sqrt()) };
    }
    gain
}
