//! Pose fusion scenarios
//!
//! Feeds synthetic swerve signal batches and camera frames through the
//! fusion engine and compares against plain wheel odometry.
//!
//! Run with: `cargo test --test pose_fusion`

mod common;

use approx::assert_relative_eq;
use crossbeam_channel::{Sender, unbounded};
use std::time::Duration;

use gati_nav::core::types::MODULE_COUNT;
use gati_nav::localization::{
    CameraFrame, FrameOutcome, FusionConfig, PoseFusionEngine, Rejection, SolveMethod, TagCorner,
    TagObservation,
};
use gati_nav::sensors::{ChannelSignalSource, SignalBatch, SwerveOdometry, batch_at};
use gati_nav::{Point2D, Pose2D};

const PERIOD_US: u64 = 20_000;

struct Rig {
    signals: Sender<SignalBatch>,
    frames: Sender<CameraFrame>,
    engine: PoseFusionEngine<ChannelSignalSource>,
}

fn rig(initial: Pose2D) -> Rig {
    let (signals, signal_rx) = unbounded();
    let (frames, frame_rx) = unbounded();
    let config = FusionConfig {
        signal_timeout: Duration::from_millis(5),
        ..FusionConfig::default()
    };
    let engine = PoseFusionEngine::new(
        ChannelSignalSource::new(signal_rx),
        common::kinematics(),
        config,
        initial,
    )
    .with_vision(frame_rx);
    Rig {
        signals,
        frames,
        engine,
    }
}

/// Crab along a shallow curve: every module at the same steer angle while
/// the gyro turns slowly.
fn curve_batch(k: u64) -> SignalBatch {
    let distance = 0.03 * k as f32;
    let angle = 0.3 + 0.002 * k as f32;
    let yaw = 0.004 * k as f32;
    batch_at(
        [(distance, 1.5, angle); MODULE_COUNT],
        yaw,
        0.2,
        1_000 + k * PERIOD_US,
    )
}

fn single_tag(pose: Pose2D, ambiguity: f32, timestamp_us: u64) -> CameraFrame {
    CameraFrame {
        camera_id: 0,
        timestamp_us,
        tags: vec![TagObservation {
            tag_id: 4,
            robot_pose: pose,
            ambiguity,
            corners: vec![],
        }],
    }
}

/// Two tags seen from `robot`, corners expressed in the robot frame.
fn two_tags(robot: Pose2D, timestamp_us: u64) -> CameraFrame {
    let to_robot = robot.inverse();
    let tag = |tag_id: u16, cx: f32, cy: f32| {
        let corners = [(-0.1, -0.1), (0.1, -0.1), (0.1, 0.1), (-0.1, 0.1)]
            .iter()
            .map(|(dx, dy)| {
                let field = Point2D::new(cx + dx, cy + dy);
                TagCorner {
                    field,
                    observed: to_robot.transform_point(&field),
                }
            })
            .collect();
        TagObservation {
            tag_id,
            robot_pose: robot,
            ambiguity: 0.9,
            corners,
        }
    };
    CameraFrame {
        camera_id: 1,
        timestamp_us,
        tags: vec![tag(1, 6.0, 2.0), tag(2, 6.0, 4.0)],
    }
}

#[test]
fn test_without_vision_matches_odometry() {
    let initial = Pose2D::new(0.5, 0.5, 0.1);
    let mut rig = rig(initial);

    let first = curve_batch(0);
    let mut odometry = SwerveOdometry::new(
        common::kinematics(),
        first.yaw(),
        first.module_positions(),
        initial,
    );

    for k in 0..100 {
        let batch = curve_batch(k);
        rig.signals.send(batch).unwrap();
        let fused = rig.engine.step();
        let expected = odometry.update(batch.yaw(), batch.module_positions());

        assert!(!fused.stale);
        assert_relative_eq!(fused.pose.x, expected.x, epsilon = 1e-5);
        assert_relative_eq!(fused.pose.y, expected.y, epsilon = 1e-5);
        assert_relative_eq!(fused.pose.theta, expected.theta, epsilon = 1e-6);
    }

    // The robot actually went somewhere
    let end = rig.engine.latest().pose;
    assert!(end.translation().distance(&initial.translation()) > 2.0);
    assert_eq!(rig.engine.stats().cycles, 100);
    assert_eq!(rig.engine.stats().stale_cycles, 0);
}

#[test]
fn test_single_tag_pulls_estimate() {
    let mut plain = rig(Pose2D::identity());
    let mut rig = rig(Pose2D::identity());
    for k in 0..10 {
        rig.signals.send(curve_batch(k)).unwrap();
        plain.signals.send(curve_batch(k)).unwrap();
        rig.engine.step();
        plain.engine.step();
    }
    let before = rig.engine.latest();
    let seen = Pose2D::new(before.pose.x + 0.5, before.pose.y, before.pose.theta);

    rig.frames
        .send(single_tag(seen, 0.05, before.timestamp_us))
        .unwrap();
    rig.signals.send(curve_batch(10)).unwrap();
    plain.signals.send(curve_batch(10)).unwrap();
    let fused = rig.engine.step();
    let odometry_only = plain.engine.step();

    assert_eq!(rig.engine.stats().vision_single_tag, 1);
    // Part of the way toward the camera, not all of it
    let shift = fused.pose.x - odometry_only.pose.x;
    assert!(shift > 0.01, "shift = {}", shift);
    assert!(shift < 0.5, "shift = {}", shift);
}

#[test]
fn test_ambiguous_single_tag_ignored() {
    let mut rig = rig(Pose2D::identity());
    rig.signals.send(curve_batch(0)).unwrap();
    let before = rig.engine.step();

    let frame = single_tag(Pose2D::new(3.0, 3.0, 1.0), 0.5, before.timestamp_us);
    assert!(matches!(
        rig.engine.process_frame(&frame),
        FrameOutcome::Rejected(Rejection::Ambiguous { .. })
    ));
    assert_eq!(rig.engine.latest().pose, before.pose);
    assert_eq!(rig.engine.stats().vision_ambiguous, 1);
}

#[test]
fn test_multi_tag_ignores_per_tag_ambiguity() {
    let mut rig = rig(Pose2D::identity());
    rig.signals.send(curve_batch(0)).unwrap();
    let before = rig.engine.step();

    let truth = Pose2D::new(0.3, -0.2, 0.15);
    let outcome = rig
        .engine
        .process_frame(&two_tags(truth, before.timestamp_us));
    assert_eq!(outcome, FrameOutcome::Applied(SolveMethod::MultiTag));

    let after = rig.engine.latest().pose;
    assert!(after.x > 0.0 && after.x < truth.x);
    assert!(after.y < 0.0 && after.y > truth.y);
    assert_eq!(rig.engine.stats().vision_multi_tag, 1);
}

#[test]
fn test_frame_older_than_history_rejected() {
    let mut rig = rig(Pose2D::identity());
    // 2 s of driving; history keeps 1.5 s
    for k in 0..100 {
        rig.signals.send(curve_batch(k)).unwrap();
        rig.engine.step();
    }
    let before = rig.engine.latest().pose;
    let outcome = rig
        .engine
        .process_frame(&single_tag(Pose2D::new(9.0, 9.0, 0.0), 0.0, 1_000));
    assert_eq!(outcome, FrameOutcome::TooOld);
    assert_eq!(rig.engine.latest().pose, before);
    assert_eq!(rig.engine.stats().vision_too_old, 1);
}

#[test]
fn test_signal_timeout_holds_pose() {
    let mut rig = rig(Pose2D::identity());
    for k in 0..5 {
        rig.signals.send(curve_batch(k)).unwrap();
        rig.engine.step();
    }
    let held = rig.engine.latest();

    let stale = rig.engine.step();
    assert!(stale.stale);
    assert_eq!(stale.pose, held.pose);
    assert_eq!(stale.timestamp_us, held.timestamp_us);

    rig.signals.send(curve_batch(5)).unwrap();
    let resumed = rig.engine.step();
    assert!(!resumed.stale);
    assert!(resumed.timestamp_us > held.timestamp_us);
    assert_eq!(rig.engine.stats().stale_cycles, 1);
}
