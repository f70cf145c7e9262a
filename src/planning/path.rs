//! Assembled, speed-annotated path.
//!
//! A [`Path`] is the output of synthesis: the entry, zone and exit segments
//! concatenated into one waypoint list with distances measured from the
//! start, headings blended from the start pose to the goal pose, and
//! speeds taken from a trapezoidal profile.

use super::profile::TrapezoidProfile;
use super::segment::{PathSegment, Waypoint};
use crate::core::math::angle_lerp;
use crate::core::types::Pose2D;

/// Fraction of the path over which the start heading is held.
pub const HEADING_HOLD_FRACTION: f32 = 0.1;

/// Joins closer than this are treated as the same point.
const JOIN_EPSILON: f32 = 1e-6;

/// Linear motion limits used to annotate speeds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionLimits {
    pub max_velocity: f32,
    pub max_acceleration: f32,
}

/// A path ready for pursuit.
///
/// Invariants: at least one waypoint, distances strictly increasing from 0,
/// and `total_distance` equal to the sum of the segment lengths.
#[derive(Debug, Clone)]
pub struct Path {
    waypoints: Vec<Waypoint>,
    total_distance: f32,
    segment_lengths: Vec<f32>,
    start: Pose2D,
    end: Pose2D,
    profile: TrapezoidProfile,
}

impl Path {
    /// Concatenate `segments` into a path from `start` to `end`.
    pub fn assemble(
        start: Pose2D,
        end: Pose2D,
        segments: &[PathSegment],
        limits: MotionLimits,
    ) -> Self {
        let mut waypoints: Vec<Waypoint> = Vec::new();
        let mut travelled = 0.0f32;

        for segment in segments {
            for wp in segment.waypoints() {
                match waypoints.last() {
                    None => waypoints.push(Waypoint {
                        distance: 0.0,
                        ..*wp
                    }),
                    Some(prev) => {
                        let step = prev.translation.distance(&wp.translation);
                        if step <= JOIN_EPSILON {
                            continue;
                        }
                        travelled += step;
                        waypoints.push(Waypoint {
                            distance: travelled,
                            ..*wp
                        });
                    }
                }
            }
        }

        if waypoints.is_empty() {
            waypoints.push(Waypoint::at_pose(&end));
        }

        let segment_lengths: Vec<f32> = segments.iter().map(PathSegment::length).collect();
        let total_distance: f32 = segment_lengths.iter().sum();
        let profile = TrapezoidProfile::new(
            total_distance,
            limits.max_velocity,
            limits.max_acceleration,
        );

        let last = waypoints.len() - 1;
        for (i, wp) in waypoints.iter_mut().enumerate() {
            // Summation order can leave the final distance a hair short of
            // the total; the goal is always at full progress
            let progress = if i == last || total_distance <= 0.0 {
                1.0
            } else {
                (wp.distance / total_distance).min(1.0)
            };
            wp.rotation = blended_heading(&start, &end, progress);
            wp.speed = profile.speed_at(progress);
        }

        Self {
            waypoints,
            total_distance,
            segment_lengths,
            start,
            end,
            profile,
        }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always false; a path holds at least its goal.
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn total_distance(&self) -> f32 {
        self.total_distance
    }

    /// Lengths of the entry, zone and exit segments.
    pub fn segment_lengths(&self) -> &[f32] {
        &self.segment_lengths
    }

    pub fn start_pose(&self) -> Pose2D {
        self.start
    }

    /// Goal pose the path was synthesized for.
    pub fn end_pose(&self) -> Pose2D {
        self.end
    }

    pub fn profile(&self) -> &TrapezoidProfile {
        &self.profile
    }

    pub fn first(&self) -> &Waypoint {
        &self.waypoints[0]
    }

    pub fn last(&self) -> &Waypoint {
        &self.waypoints[self.waypoints.len() - 1]
    }

    /// Index of the first waypoint at or beyond `distance`, clamped to the
    /// final waypoint.
    pub fn index_at_or_after(&self, distance: f32) -> usize {
        self.waypoints
            .partition_point(|wp| wp.distance < distance)
            .min(self.waypoints.len() - 1)
    }

    /// First waypoint at or beyond `distance`, or the final one.
    pub fn waypoint_at_or_after(&self, distance: f32) -> &Waypoint {
        &self.waypoints[self.index_at_or_after(distance)]
    }

    /// Interpolated waypoint at exactly `distance` along the path.
    pub fn sample_at(&self, distance: f32) -> Waypoint {
        let idx = self.index_at_or_after(distance);
        let after = &self.waypoints[idx];
        if idx == 0 || after.distance <= distance {
            return *after;
        }
        let before = &self.waypoints[idx - 1];
        let t = (distance - before.distance) / (after.distance - before.distance);
        Waypoint {
            translation: before.translation.lerp(&after.translation, t),
            rotation: angle_lerp(before.rotation, after.rotation, t),
            speed: before.speed + (after.speed - before.speed) * t,
            distance,
        }
    }
}

/// Hold the start heading, then rotate toward the goal heading.
fn blended_heading(start: &Pose2D, end: &Pose2D, progress: f32) -> f32 {
    if progress <= HEADING_HOLD_FRACTION {
        start.theta
    } else {
        let t = (progress - HEADING_HOLD_FRACTION) / (1.0 - HEADING_HOLD_FRACTION);
        angle_lerp(start.theta, end.theta, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Point2D;
    use crate::planning::segment::{StraightSegment, ZoneSegment};
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;
    use std::sync::Arc;

    const LIMITS: MotionLimits = MotionLimits {
        max_velocity: 4.0,
        max_acceleration: 3.0,
    };

    fn three_segments() -> (Pose2D, Pose2D, Vec<PathSegment>) {
        let start = Pose2D::new(0.0, 0.0, 0.0);
        let end = Pose2D::new(4.0, 2.0, FRAC_PI_2);
        let zone = ZoneSegment::new(
            1,
            2,
            vec![
                (Point2D::new(1.0, 0.0), 0.0),
                (Point2D::new(3.0, 0.0), 0.0),
                (Point2D::new(4.0, 1.0), 0.0),
            ],
        );
        let entry = StraightSegment::between(start.translation(), Point2D::new(1.0, 0.0), 0.0, 0.15);
        let exit = StraightSegment::between(Point2D::new(4.0, 1.0), end.translation(), 0.0, 0.15);
        (
            start,
            end,
            vec![
                PathSegment::Straight(entry),
                PathSegment::Zone(Arc::new(zone)),
                PathSegment::Straight(exit),
            ],
        )
    }

    #[test]
    fn test_distances_strictly_increase() {
        let (start, end, segments) = three_segments();
        let path = Path::assemble(start, end, &segments, LIMITS);
        for pair in path.waypoints().windows(2) {
            assert!(pair[1].distance > pair[0].distance);
        }
        assert_eq!(path.first().distance, 0.0);
    }

    #[test]
    fn test_total_is_segment_sum() {
        let (start, end, segments) = three_segments();
        let path = Path::assemble(start, end, &segments, LIMITS);
        let sum: f32 = segments.iter().map(PathSegment::length).sum();
        assert_relative_eq!(path.total_distance(), sum);
        assert_relative_eq!(path.last().distance, sum, epsilon = 1e-4);
        assert_eq!(path.segment_lengths().len(), 3);
    }

    #[test]
    fn test_heading_schedule() {
        let (start, end, segments) = three_segments();
        let path = Path::assemble(start, end, &segments, LIMITS);
        let hold = path.total_distance() * HEADING_HOLD_FRACTION;
        for wp in path.waypoints().iter().filter(|wp| wp.distance <= hold) {
            assert_eq!(wp.rotation, 0.0);
        }
        assert_relative_eq!(path.last().rotation, FRAC_PI_2, epsilon = 1e-5);
        assert_eq!(path.first().speed, 0.0);
        assert_eq!(path.last().speed, 0.0);
    }

    #[test]
    fn test_waypoint_lookup() {
        let (start, end, segments) = three_segments();
        let path = Path::assemble(start, end, &segments, LIMITS);
        assert_eq!(path.waypoint_at_or_after(0.0).distance, 0.0);
        let wp = path.waypoint_at_or_after(1.01);
        assert!(wp.distance >= 1.01);
        assert_eq!(path.index_at_or_after(1000.0), path.len() - 1);

        let sample = path.sample_at(2.0);
        assert_relative_eq!(sample.translation.x, 2.0, epsilon = 1e-4);
        assert_relative_eq!(sample.translation.y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_degenerate_path() {
        let pose = Pose2D::new(1.0, 1.0, 0.5);
        let seg = StraightSegment::between(pose.translation(), pose.translation(), 0.0, 0.15);
        let path = Path::assemble(pose, pose, &[PathSegment::Straight(seg)], LIMITS);
        assert_eq!(path.len(), 1);
        assert_eq!(path.total_distance(), 0.0);
        assert_relative_eq!(path.last().rotation, 0.5);
    }
}
