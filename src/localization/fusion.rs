//! Pose fusion engine.
//!
//! One call to [`PoseFusionEngine::step`] is one fusion cycle:
//!
//! 1. Wait (bounded) for a synchronized signal batch
//! 2. Latency-compensate every signal to the batch refresh time
//! 3. Update the estimator with module positions and gyro yaw
//! 4. Resolve and apply any queued camera frames
//! 5. Publish the fused pose to [`SharedPose`] and observers
//!
//! If no batch arrives in time the previous pose is republished marked
//! stale, and the estimator is not advanced.

use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::time::Duration;

use super::estimator::{EstimatorConfig, PoseEstimator, VisionOutcome};
use super::vision::{CameraFrame, Rejection, SolveMethod, resolve_frame};
use crate::config::LocalizationConfig;
use crate::core::kinematics::SwerveKinematics;
use crate::core::types::Pose2D;
use crate::sensors::{SignalBatch, SignalSource};
use crate::state::{FusedPose, SharedPose};

/// Receives every published pose.
pub trait PoseObserver: Send + Sync {
    fn on_pose(&self, pose: &FusedPose);
}

impl<F> PoseObserver for F
where
    F: Fn(&FusedPose) + Send + Sync,
{
    fn on_pose(&self, pose: &FusedPose) {
        self(pose)
    }
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FusionStats {
    pub cycles: u64,
    /// Cycles where the signal wait timed out
    pub stale_cycles: u64,
    pub vision_single_tag: u64,
    pub vision_multi_tag: u64,
    pub vision_ambiguous: u64,
    pub vision_too_old: u64,
    /// Frames with no tags or degenerate geometry
    pub vision_unusable: u64,
}

/// What happened to one camera frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    Applied(SolveMethod),
    Rejected(Rejection),
    TooOld,
}

/// Fusion engine settings.
#[derive(Debug, Clone, Copy)]
pub struct FusionConfig {
    pub estimator: EstimatorConfig,
    pub signal_timeout: Duration,
    pub ambiguity_threshold: f32,
}

impl FusionConfig {
    pub fn from_localization(config: &LocalizationConfig) -> Self {
        Self {
            estimator: EstimatorConfig {
                state_std_devs: config.state_std_devs,
                vision_std_devs: config.vision_std_devs,
                history_window_us: (config.history_window_s * 1_000_000.0) as u64,
            },
            signal_timeout: Duration::from_millis(config.signal_timeout_ms),
            ambiguity_threshold: config.ambiguity_threshold,
        }
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self::from_localization(&LocalizationConfig::default())
    }
}

/// Drives the estimator from a signal source and camera frames.
pub struct PoseFusionEngine<S: SignalSource> {
    source: S,
    vision: Option<Receiver<CameraFrame>>,
    config: FusionConfig,
    kinematics: SwerveKinematics,
    /// Created from the first batch so the gyro and encoders can be zeroed
    estimator: Option<PoseEstimator>,
    initial_pose: Pose2D,
    last_batch: Option<SignalBatch>,
    latest: FusedPose,
    shared: SharedPose,
    observers: Vec<Arc<dyn PoseObserver>>,
    stats: FusionStats,
}

impl<S: SignalSource> PoseFusionEngine<S> {
    pub fn new(
        source: S,
        kinematics: SwerveKinematics,
        config: FusionConfig,
        initial_pose: Pose2D,
    ) -> Self {
        let latest = FusedPose {
            stale: true,
            ..FusedPose::at(initial_pose, 0)
        };
        Self {
            source,
            vision: None,
            config,
            kinematics,
            estimator: None,
            initial_pose,
            last_batch: None,
            latest,
            shared: SharedPose::new(latest),
            observers: Vec::new(),
            stats: FusionStats::default(),
        }
    }

    /// Consume camera frames from `rx` each cycle.
    pub fn with_vision(mut self, rx: Receiver<CameraFrame>) -> Self {
        self.vision = Some(rx);
        self
    }

    /// Publish into an existing shared pose instead of a private one.
    pub fn with_shared_pose(mut self, shared: SharedPose) -> Self {
        shared.publish(self.latest);
        self.shared = shared;
        self
    }

    pub fn add_observer(&mut self, observer: Arc<dyn PoseObserver>) {
        self.observers.push(observer);
    }

    /// Handle for reading the latest pose from other threads.
    pub fn shared_pose(&self) -> SharedPose {
        self.shared.clone()
    }

    pub fn latest(&self) -> FusedPose {
        self.latest
    }

    pub fn stats(&self) -> FusionStats {
        self.stats
    }

    /// Run one fusion cycle and return the published pose.
    pub fn step(&mut self) -> FusedPose {
        self.stats.cycles += 1;
        match self.source.wait_for_batch(self.config.signal_timeout) {
            Some(batch) => {
                self.ingest(&batch);
                self.drain_vision();
            }
            None => {
                if !self.latest.stale {
                    log::warn!(
                        "No signal batch within {:?}, holding pose",
                        self.config.signal_timeout
                    );
                }
                self.stats.stale_cycles += 1;
                self.latest.stale = true;
            }
        }
        self.publish();
        self.latest
    }

    /// Resolve one camera frame and blend it into the estimate.
    pub fn process_frame(&mut self, frame: &CameraFrame) -> FrameOutcome {
        let (pose, method) = match resolve_frame(frame, self.config.ambiguity_threshold) {
            Ok(resolved) => resolved,
            Err(rejection) => {
                match rejection {
                    Rejection::Ambiguous { ambiguity } => {
                        log::debug!(
                            "Camera {}: single tag ambiguity {:.2} above threshold",
                            frame.camera_id,
                            ambiguity
                        );
                        self.stats.vision_ambiguous += 1;
                    }
                    Rejection::NoTags | Rejection::Degenerate => self.stats.vision_unusable += 1,
                }
                return FrameOutcome::Rejected(rejection);
            }
        };

        let Some(estimator) = self.estimator.as_mut() else {
            self.stats.vision_too_old += 1;
            return FrameOutcome::TooOld;
        };
        match estimator.add_vision_measurement(pose, frame.timestamp_us) {
            VisionOutcome::Applied => {
                match method {
                    SolveMethod::SingleTag => self.stats.vision_single_tag += 1,
                    SolveMethod::MultiTag => self.stats.vision_multi_tag += 1,
                }
                self.latest.pose = estimator.estimate();
                FrameOutcome::Applied(method)
            }
            VisionOutcome::TooOld => {
                log::debug!(
                    "Camera {}: frame at {} us older than odometry history",
                    frame.camera_id,
                    frame.timestamp_us
                );
                self.stats.vision_too_old += 1;
                FrameOutcome::TooOld
            }
        }
    }

    /// Re-anchor the estimate at `pose`.
    pub fn reset_pose(&mut self, pose: Pose2D) {
        match (self.estimator.as_mut(), self.last_batch.as_ref()) {
            (Some(estimator), Some(batch)) => {
                estimator.reset_pose(batch.yaw(), batch.module_positions(), pose);
            }
            _ => self.initial_pose = pose,
        }
        log::info!(
            "Pose reset to ({:.3}, {:.3}, {:.1}°)",
            pose.x,
            pose.y,
            pose.theta.to_degrees()
        );
        self.latest.pose = pose;
        self.publish();
    }

    fn ingest(&mut self, batch: &SignalBatch) {
        let positions = batch.module_positions();
        let yaw = batch.yaw();
        let (roll, pitch) = batch.attitude();
        let timestamp_us = batch.refreshed_us.max(self.latest.timestamp_us);

        let pose = match self.estimator.as_mut() {
            Some(estimator) => estimator.update(timestamp_us, yaw, positions),
            None => {
                let mut estimator = PoseEstimator::new(
                    self.config.estimator,
                    self.kinematics.clone(),
                    yaw,
                    positions,
                    self.initial_pose,
                );
                let pose = estimator.update(timestamp_us, yaw, positions);
                self.estimator = Some(estimator);
                log::debug!("Estimator initialized at {} us", timestamp_us);
                pose
            }
        };

        if self.latest.stale && self.last_batch.is_some() {
            log::info!("Signal batches resumed");
        }
        self.last_batch = Some(*batch);
        self.latest = FusedPose {
            pose,
            timestamp_us,
            roll,
            pitch,
            stale: false,
        };
    }

    fn drain_vision(&mut self) {
        let Some(rx) = self.vision.clone() else {
            return;
        };
        for frame in rx.try_iter() {
            self.process_frame(&frame);
        }
    }

    fn publish(&self) {
        self.shared.publish(self.latest);
        for observer in &self.observers {
            observer.on_pose(&self.latest);
        }
    }
}
