//! Swerve pursuit controller.
//!
//! Drives the chassis toward a target waypoint with a clamped proportional
//! law on translation and a one-period heading correction on rotation.
//! [`PathFollower`] picks the target waypoint along a [`Path`] each cycle.

use serde::Deserialize;
use std::sync::Arc;

use crate::config::GatiConfig;
use crate::core::kinematics::{SwerveKinematics, desaturate};
use crate::core::math::angle_diff;
use crate::core::types::{ChassisSpeeds, MODULE_COUNT, ModuleState, Point2D, Pose2D};
use crate::planning::{Path, Waypoint};

/// How path progress is measured when choosing the target waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupMode {
    /// Path distance of the waypoint nearest the robot
    #[default]
    DistanceFromStart,
    /// Accumulated translation since the path was adopted
    DistanceTravelled,
}

/// Controller tuning.
#[derive(Debug, Clone, Copy)]
pub struct PursuitConfig {
    pub max_linear_velocity: f32,
    pub max_angular_velocity: f32,
    pub max_wheel_speed: f32,
    pub position_tolerance: f32,
    /// Radians
    pub heading_tolerance: f32,
    /// Control period in seconds
    pub period_s: f32,
    pub lookahead: f32,
    pub min_speed_fraction: f32,
    pub lookup_mode: LookupMode,
}

impl PursuitConfig {
    pub fn from_config(config: &GatiConfig) -> Self {
        Self {
            max_linear_velocity: config.motion.max_linear_velocity,
            max_angular_velocity: config.motion.max_angular_velocity,
            max_wheel_speed: config.drivetrain.max_wheel_speed,
            position_tolerance: config.motion.position_tolerance,
            heading_tolerance: config.heading_tolerance(),
            period_s: config.control_period_s(),
            lookahead: config.motion.lookahead_distance,
            min_speed_fraction: config.motion.min_speed_fraction,
            lookup_mode: config.motion.lookup_mode,
        }
    }
}

impl Default for PursuitConfig {
    fn default() -> Self {
        Self::from_config(&GatiConfig::default())
    }
}

/// One controller output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PursuitOutput {
    /// Commanded field-relative chassis velocity
    pub speeds: ChassisSpeeds,
    pub states: [ModuleState; MODULE_COUNT],
    pub done: bool,
}

/// Waypoint pursuit and module command generation.
#[derive(Debug, Clone)]
pub struct PursuitController {
    config: PursuitConfig,
    kinematics: SwerveKinematics,
    last_states: [ModuleState; MODULE_COUNT],
}

impl PursuitController {
    pub fn new(config: PursuitConfig, kinematics: SwerveKinematics) -> Self {
        Self {
            config,
            kinematics,
            last_states: [ModuleState::default(); MODULE_COUNT],
        }
    }

    pub fn config(&self) -> &PursuitConfig {
        &self.config
    }

    /// Drive toward a single waypoint.
    pub fn drive_to(&mut self, pose: &Pose2D, target: &Waypoint) -> PursuitOutput {
        if self.is_at(pose, &target.pose()) {
            return self.stopped(true);
        }
        let speeds = self.field_velocity(pose, target);
        PursuitOutput {
            speeds,
            states: self.module_states(&speeds, pose.theta),
            done: false,
        }
    }

    /// Field-relative velocity toward `target`.
    pub fn field_velocity(&self, pose: &Pose2D, target: &Waypoint) -> ChassisSpeeds {
        let max_v = self.config.max_linear_velocity;
        let mut direction = target.translation.sub(&pose.translation()).scale(max_v);
        let magnitude = direction.norm();
        if magnitude > 1.0 {
            direction = direction.scale(1.0 / magnitude);
        }

        let fraction = (target.speed / max_v).clamp(self.config.min_speed_fraction, 1.0);
        let linear = direction.scale(fraction * max_v);

        let max_w = self.config.max_angular_velocity;
        let omega = (angle_diff(pose.theta, target.rotation) / self.config.period_s)
            .clamp(-max_w, max_w);

        ChassisSpeeds::new(linear.x, linear.y, omega)
    }

    /// Convert a field-relative velocity to desaturated module states.
    ///
    /// Modules with nothing to do keep their previous steer angle, and every
    /// module takes the shorter way round to its new angle.
    pub fn module_states(
        &mut self,
        field_speeds: &ChassisSpeeds,
        heading: f32,
    ) -> [ModuleState; MODULE_COUNT] {
        let robot_speeds = field_speeds.field_to_robot(heading);
        let mut states = self.kinematics.to_module_states(&robot_speeds);
        desaturate(&mut states, self.config.max_wheel_speed);

        for (state, last) in states.iter_mut().zip(self.last_states.iter()) {
            *state = if state.speed == 0.0 {
                ModuleState::new(0.0, last.angle)
            } else {
                state.optimize(last.angle)
            };
        }
        self.last_states = states;
        states
    }

    /// Zero speed on every module, steer angles held.
    pub fn stop(&mut self) -> [ModuleState; MODULE_COUNT] {
        let states = self.last_states.map(|s| ModuleState::new(0.0, s.angle));
        self.last_states = states;
        states
    }

    fn stopped(&mut self, done: bool) -> PursuitOutput {
        PursuitOutput {
            speeds: ChassisSpeeds::stopped(),
            states: self.stop(),
            done,
        }
    }

    /// Whether `pose` is within tolerance of `target`.
    pub fn is_at(&self, pose: &Pose2D, target: &Pose2D) -> bool {
        pose.translation().distance(&target.translation()) < self.config.position_tolerance
            && angle_diff(pose.theta, target.theta).abs() < self.config.heading_tolerance
    }

    /// Output for a path whose synthesis failed: stopped and done.
    pub fn abort(&mut self) -> PursuitOutput {
        self.stopped(true)
    }
}

/// Follow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowState {
    Following,
    Complete,
}

/// Tracks progress along one path and picks the target waypoint.
#[derive(Debug, Clone)]
pub struct PathFollower {
    path: Arc<Path>,
    mode: LookupMode,
    lookahead: f32,
    /// Path distance already reached; never decreases
    progress: f32,
    /// Waypoint index matching `progress`
    index: usize,
    travelled: f32,
    last_translation: Option<Point2D>,
    state: FollowState,
}

impl PathFollower {
    /// How far past the current progress the nearest-point search looks.
    const SEARCH_WINDOW: f32 = 1.0;

    pub fn new(path: Arc<Path>, mode: LookupMode, lookahead: f32) -> Self {
        log::info!(
            "Following path: {} waypoints, {:.2} m",
            path.len(),
            path.total_distance()
        );
        Self {
            path,
            mode,
            lookahead,
            progress: 0.0,
            index: 0,
            travelled: 0.0,
            last_translation: None,
            state: FollowState::Following,
        }
    }

    pub fn path(&self) -> &Arc<Path> {
        &self.path
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_complete(&self) -> bool {
        self.state == FollowState::Complete
    }

    /// Run one pursuit step along the path.
    pub fn update(&mut self, controller: &mut PursuitController, pose: &Pose2D) -> PursuitOutput {
        if self.state == FollowState::Complete {
            return controller.stopped(true);
        }
        if controller.is_at(pose, &self.path.end_pose()) {
            log::info!("Path complete after {:.2} m", self.travelled);
            self.state = FollowState::Complete;
            return controller.stopped(true);
        }

        let target = *self.target(pose);
        let speeds = controller.field_velocity(pose, &target);
        PursuitOutput {
            speeds,
            states: controller.module_states(&speeds, pose.theta),
            done: false,
        }
    }

    /// Waypoint to pursue from `pose`, advancing progress.
    pub fn target(&mut self, pose: &Pose2D) -> &Waypoint {
        let here = pose.translation();
        if let Some(last) = self.last_translation {
            self.travelled += last.distance(&here);
        }
        self.last_translation = Some(here);

        match self.mode {
            LookupMode::DistanceFromStart => {
                let nearest = self.nearest_ahead(&here);
                self.advance_to(nearest);
                self.path.waypoint_at_or_after(self.progress + self.lookahead)
            }
            LookupMode::DistanceTravelled => {
                let key = self.travelled + self.lookahead;
                let waypoints = self.path.waypoints();
                let mut i = self.index;
                while i + 1 < waypoints.len() && waypoints[i].distance < key {
                    i += 1;
                }
                self.advance_to(i);
                &self.path.waypoints()[i]
            }
        }
    }

    fn advance_to(&mut self, index: usize) {
        if index > self.index {
            self.index = index;
            self.progress = self.path.waypoints()[index].distance;
        }
    }

    /// Nearest waypoint at or after the current index within the search window.
    fn nearest_ahead(&self, here: &Point2D) -> usize {
        let limit = self.progress + self.lookahead + Self::SEARCH_WINDOW;
        let waypoints = self.path.waypoints();
        let mut best = self.index;
        let mut best_d2 = waypoints[self.index].translation.distance_squared(here);
        for (i, wp) in waypoints.iter().enumerate().skip(self.index + 1) {
            if wp.distance > limit {
                break;
            }
            let d2 = wp.translation.distance_squared(here);
            if d2 < best_d2 {
                best = i;
                best_d2 = d2;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::{MotionLimits, PathSegment, StraightSegment};
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn controller() -> PursuitController {
        PursuitController::new(
            PursuitConfig::default(),
            SwerveKinematics::rectangular(0.57, 0.57).unwrap(),
        )
    }

    fn waypoint(x: f32, y: f32, rotation: f32, speed: f32) -> Waypoint {
        Waypoint {
            speed,
            ..Waypoint::new(Point2D::new(x, y), rotation)
        }
    }

    fn straight_path(length: f32) -> Arc<Path> {
        let start = Pose2D::identity();
        let end = Pose2D::new(length, 0.0, 0.0);
        let seg = StraightSegment::between(start.translation(), end.translation(), 0.0, 0.15);
        Arc::new(Path::assemble(
            start,
            end,
            &[PathSegment::Straight(seg)],
            MotionLimits {
                max_velocity: 4.0,
                max_acceleration: 3.0,
            },
        ))
    }

    #[test]
    fn test_done_at_target() {
        let mut ctl = controller();
        let pose = Pose2D::new(1.0, 2.0, 0.5);
        let out = ctl.drive_to(&pose, &Waypoint::at_pose(&pose));
        assert!(out.done);
        assert!(out.states.iter().all(|s| s.speed == 0.0));
    }

    #[test]
    fn test_not_done_when_off() {
        let mut ctl = controller();
        let target = Waypoint::at_pose(&Pose2D::new(1.0, 2.0, 0.5));
        let off = Pose2D::new(1.1, 2.0, 0.5 + 10f32.to_radians());
        assert!(!ctl.drive_to(&off, &target).done);
        // Position alone, or heading alone, is not enough
        assert!(!ctl.is_at(&Pose2D::new(1.1, 2.0, 0.5), &target.pose()));
        assert!(!ctl.is_at(&Pose2D::new(1.0, 2.0, 0.7), &target.pose()));
    }

    #[test]
    fn test_far_target_full_speed() {
        let ctl = controller();
        let speeds = ctl.field_velocity(&Pose2D::identity(), &waypoint(10.0, 0.0, 0.0, 4.0));
        assert_relative_eq!(speeds.vx, 4.0, epsilon = 1e-5);
        assert_relative_eq!(speeds.vy, 0.0);
    }

    #[test]
    fn test_speed_fraction_scales() {
        let ctl = controller();
        let speeds = ctl.field_velocity(&Pose2D::identity(), &waypoint(0.0, 10.0, 0.0, 2.0));
        assert_relative_eq!(speeds.vy, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_close_target_proportional() {
        let ctl = controller();
        // 0.1 m error × 4 = 0.4 (unclamped), × 0.1 min fraction × 4 m/s
        let speeds = ctl.field_velocity(&Pose2D::identity(), &waypoint(0.1, 0.0, 0.0, 0.0));
        assert_relative_eq!(speeds.vx, 0.16, epsilon = 1e-5);
    }

    #[test]
    fn test_angular_clamped() {
        let ctl = controller();
        let speeds = ctl.field_velocity(&Pose2D::identity(), &waypoint(0.0, 0.0, FRAC_PI_2, 0.0));
        assert_relative_eq!(speeds.omega, std::f32::consts::TAU);

        let speeds = ctl.field_velocity(&Pose2D::identity(), &waypoint(0.0, 0.0, 0.02, 0.0));
        // One period to close the error
        assert_relative_eq!(speeds.omega, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_module_states_desaturated() {
        let mut ctl = controller();
        let states = ctl.module_states(&ChassisSpeeds::new(4.0, 0.0, 6.0), 0.0);
        let fastest = states.iter().map(|s| s.speed.abs()).fold(0.0, f32::max);
        assert_relative_eq!(fastest, 4.5, epsilon = 1e-4);
    }

    #[test]
    fn test_stop_holds_angles() {
        let mut ctl = controller();
        let moving = ctl.module_states(&ChassisSpeeds::new(0.0, 1.0, 0.0), 0.0);
        let stopped = ctl.stop();
        for (m, s) in moving.iter().zip(stopped.iter()) {
            assert_eq!(s.speed, 0.0);
            assert_eq!(s.angle, m.angle);
        }
    }

    #[test]
    fn test_field_to_robot_conversion() {
        let mut ctl = controller();
        // Robot faces +Y, field velocity +Y means drive forward
        let states = ctl.module_states(&ChassisSpeeds::new(0.0, 1.0, 0.0), FRAC_PI_2);
        for s in &states {
            assert_relative_eq!(s.speed, 1.0, epsilon = 1e-5);
            assert_relative_eq!(s.angle, 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_follower_lookahead_ahead_of_robot() {
        let path = straight_path(3.0);
        let mut follower = PathFollower::new(path, LookupMode::DistanceFromStart, 0.25);
        let target = *follower.target(&Pose2D::new(1.0, 0.05, 0.0));
        assert!(target.distance >= 1.25 - 1e-4);
        assert!(target.distance < 1.5);
    }

    #[test]
    fn test_follower_never_moves_back() {
        let path = straight_path(3.0);
        let mut follower = PathFollower::new(path, LookupMode::DistanceFromStart, 0.25);
        follower.target(&Pose2D::new(1.5, 0.0, 0.0));
        let before = follower.progress();
        let target = *follower.target(&Pose2D::new(0.2, 0.0, 0.0));
        assert_eq!(follower.progress(), before);
        assert!(target.distance >= before);
    }

    #[test]
    fn test_follower_distance_travelled() {
        let path = straight_path(3.0);
        let mut follower = PathFollower::new(path, LookupMode::DistanceTravelled, 0.25);
        follower.target(&Pose2D::new(0.0, 0.0, 0.0));
        let target = *follower.target(&Pose2D::new(0.0, 0.6, 0.0));
        // Travelled 0.6 m sideways; key is 0.85
        assert!(target.distance >= 0.85 - 1e-4);
        assert_eq!(follower.progress(), target.distance);

        // Travelling past the end clamps to the final waypoint
        let last = *follower.target(&Pose2D::new(0.0, 6.0, 0.0));
        assert_relative_eq!(last.distance, 3.0, epsilon = 1e-4);
        assert_eq!(follower.progress(), last.distance);
    }

    #[test]
    fn test_follower_completes_at_end() {
        let path = straight_path(1.0);
        let mut ctl = controller();
        let mut follower = PathFollower::new(path, LookupMode::DistanceFromStart, 0.25);
        let out = follower.update(&mut ctl, &Pose2D::new(1.0, 0.0, 0.0));
        assert!(out.done);
        assert!(follower.is_complete());
    }

    #[test]
    fn test_abort_stops() {
        let mut ctl = controller();
        ctl.module_states(&ChassisSpeeds::new(1.0, 0.0, 0.0), 0.0);
        let out = ctl.abort();
        assert!(out.done);
        assert!(out.states.iter().all(|s| s.speed == 0.0));
    }
}
