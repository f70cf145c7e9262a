//! Path building blocks.
//!
//! A path is assembled from three [`PathSegment`]s: a generated straight
//! entry onto a precomputed zone-to-zone segment, the zone segment itself,
//! and a generated straight exit to the goal.

use std::sync::Arc;

use crate::core::types::{Point2D, Pose2D};

/// A point along a segment or path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub translation: Point2D,
    /// Heading (rad)
    pub rotation: f32,
    /// Target speed (m/s); zero until a velocity profile is applied
    pub speed: f32,
    /// Distance along the owning segment or path (m)
    pub distance: f32,
}

impl Waypoint {
    pub fn new(translation: Point2D, rotation: f32) -> Self {
        Self {
            translation,
            rotation,
            speed: 0.0,
            distance: 0.0,
        }
    }

    /// Stationary waypoint at `pose`.
    pub fn at_pose(pose: &Pose2D) -> Self {
        Self::new(pose.translation(), pose.theta)
    }

    pub fn pose(&self) -> Pose2D {
        Pose2D::from_parts(self.translation, self.rotation)
    }
}

/// Fill in cumulative distances from the first waypoint.
fn accumulate_distances(waypoints: &mut [Waypoint]) -> f32 {
    let mut total = 0.0f32;
    let mut previous: Option<Point2D> = None;
    for wp in waypoints.iter_mut() {
        if let Some(prev) = previous {
            total += prev.distance(&wp.translation);
        }
        wp.distance = total;
        previous = Some(wp.translation);
    }
    total
}

/// Precomputed route between two zones.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneSegment {
    start_zone: u8,
    end_zone: u8,
    waypoints: Vec<Waypoint>,
    length: f32,
}

impl ZoneSegment {
    /// Build from (translation, rotation) pairs in travel order.
    pub fn new(start_zone: u8, end_zone: u8, points: Vec<(Point2D, f32)>) -> Self {
        let mut waypoints: Vec<Waypoint> = points
            .into_iter()
            .map(|(translation, rotation)| Waypoint::new(translation, rotation))
            .collect();
        let length = accumulate_distances(&mut waypoints);
        Self {
            start_zone,
            end_zone,
            waypoints,
            length,
        }
    }

    /// The same route driven the other way.
    ///
    /// Waypoint order is reversed and distances are recomputed from the new
    /// start, so reversing twice reproduces the original exactly.
    pub fn reversed(&self) -> ZoneSegment {
        let points = self
            .waypoints
            .iter()
            .rev()
            .map(|wp| (wp.translation, wp.rotation))
            .collect();
        ZoneSegment::new(self.end_zone, self.start_zone, points)
    }

    pub fn start_zone(&self) -> u8 {
        self.start_zone
    }

    pub fn end_zone(&self) -> u8 {
        self.end_zone
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn length(&self) -> f32 {
        self.length
    }
}

/// Straight line between two points, sampled at a fixed step.
#[derive(Debug, Clone, PartialEq)]
pub struct StraightSegment {
    waypoints: Vec<Waypoint>,
    length: f32,
}

impl StraightSegment {
    /// Waypoints every `step` meters from `from`, always ending exactly at `to`.
    pub fn between(from: Point2D, to: Point2D, rotation: f32, step: f32) -> Self {
        let length = from.distance(&to);
        let mut waypoints = vec![Waypoint::new(from, rotation)];

        if length > 0.0 {
            // Non-positive step never reaches `to`; emit the endpoints only
            if step > 0.0 {
                let mut k = 1u32;
                loop {
                    let d = k as f32 * step;
                    if d >= length - 1e-6 {
                        break;
                    }
                    waypoints.push(Waypoint::new(from.lerp(&to, d / length), rotation));
                    k += 1;
                }
            } else {
                log::warn!("Straight segment step {} is not positive, endpoints only", step);
            }
            waypoints.push(Waypoint::new(to, rotation));
        }

        let length = accumulate_distances(&mut waypoints);
        Self { waypoints, length }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn length(&self) -> f32 {
        self.length
    }
}

/// One piece of an assembled path.
#[derive(Debug, Clone)]
pub enum PathSegment {
    /// Shared precomputed zone route
    Zone(Arc<ZoneSegment>),
    /// Generated entry or exit
    Straight(StraightSegment),
}

impl PathSegment {
    pub fn waypoints(&self) -> &[Waypoint] {
        match self {
            PathSegment::Zone(segment) => segment.waypoints(),
            PathSegment::Straight(segment) => segment.waypoints(),
        }
    }

    /// Length of this segment in meters.
    pub fn length(&self) -> f32 {
        match self {
            PathSegment::Zone(segment) => segment.length(),
            PathSegment::Straight(segment) => segment.length(),
        }
    }

    pub fn first(&self) -> Option<&Waypoint> {
        self.waypoints().first()
    }

    pub fn last(&self) -> Option<&Waypoint> {
        self.waypoints().last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_straight_step_spacing() {
        let seg = StraightSegment::between(Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.0), 0.0, 0.15);
        let wps = seg.waypoints();
        // 0, 0.15, ..., 0.90, then 1.0
        assert_eq!(wps.len(), 8);
        assert_relative_eq!(wps[1].distance, 0.15, epsilon = 1e-6);
        assert_eq!(wps.last().unwrap().translation, Point2D::new(1.0, 0.0));
        assert_relative_eq!(seg.length(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_straight_non_positive_step() {
        let from = Point2D::new(0.0, 0.0);
        let to = Point2D::new(1.0, 0.0);
        for step in [0.0, -0.1, f32::NAN] {
            let seg = StraightSegment::between(from, to, 0.0, step);
            assert_eq!(seg.waypoints().len(), 2);
            assert_eq!(seg.waypoints()[1].translation, to);
            assert_relative_eq!(seg.length(), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_straight_zero_length() {
        let p = Point2D::new(2.0, 3.0);
        let seg = StraightSegment::between(p, p, 0.5, 0.15);
        assert_eq!(seg.waypoints().len(), 1);
        assert_eq!(seg.length(), 0.0);
    }

    #[test]
    fn test_zone_segment_distances() {
        let seg = ZoneSegment::new(
            1,
            2,
            vec![
                (Point2D::new(0.0, 0.0), 0.0),
                (Point2D::new(3.0, 4.0), 0.0),
                (Point2D::new(3.0, 5.0), 0.0),
            ],
        );
        assert_relative_eq!(seg.length(), 6.0);
        assert_relative_eq!(seg.waypoints()[1].distance, 5.0);
    }

    #[test]
    fn test_reverse_twice_identical() {
        let seg = ZoneSegment::new(
            3,
            5,
            vec![
                (Point2D::new(0.1, 0.2), 0.0),
                (Point2D::new(1.3, 0.7), 0.4),
                (Point2D::new(2.9, 2.2), 1.1),
                (Point2D::new(3.0, 4.1), 1.5),
            ],
        );
        let rev = seg.reversed();
        assert_eq!(rev.start_zone(), 5);
        assert_eq!(rev.end_zone(), 3);
        assert_eq!(rev.waypoints()[0].translation, Point2D::new(3.0, 4.1));
        assert_eq!(rev.waypoints()[0].distance, 0.0);
        assert_eq!(rev.reversed(), seg);
    }
}
