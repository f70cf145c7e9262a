//! Path synthesis from zones and precomputed segments.
//!
//! 1. Locate the zones enclosing the start and goal translations
//! 2. Look up the zone-to-zone segment (explicit or reversed)
//! 3. Generate a straight entry from the start onto the segment and a
//!    straight exit from the segment to the goal
//! 4. Concatenate, then annotate headings and speeds

use std::sync::Arc;

use super::path::{MotionLimits, Path};
use super::segment::{PathSegment, StraightSegment};
use super::table::SegmentTable;
use super::zone::ZoneMap;
use crate::config::GatiConfig;
use crate::core::types::Pose2D;
use crate::error::PathError;

/// Anything that can turn a (start, goal) pair into a path.
pub trait PathSource: Send + Sync {
    /// Cheap synchronous validation done before any worker is started.
    fn precheck(&self, _start: &Pose2D, _end: &Pose2D) -> Result<(), PathError> {
        Ok(())
    }

    /// Build the full path. May be slow.
    fn synthesize(&self, start: &Pose2D, end: &Pose2D) -> Result<Path, PathError>;
}

/// Synthesis settings.
#[derive(Debug, Clone, Copy)]
pub struct SynthesizerConfig {
    /// Straight segment waypoint spacing (m)
    pub step_size: f32,
    pub limits: MotionLimits,
}

impl SynthesizerConfig {
    pub fn from_config(config: &GatiConfig) -> Self {
        Self {
            step_size: config.planning.step_size,
            limits: MotionLimits {
                max_velocity: config.motion.max_linear_velocity,
                max_acceleration: config.motion.max_linear_acceleration,
            },
        }
    }
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self::from_config(&GatiConfig::default())
    }
}

/// Zone-based path synthesizer. Immutable after construction and safe to
/// share between worker threads.
#[derive(Debug, Clone)]
pub struct PathSynthesizer {
    zones: Arc<ZoneMap>,
    segments: Arc<SegmentTable>,
    config: SynthesizerConfig,
}

impl PathSynthesizer {
    pub fn new(zones: Arc<ZoneMap>, segments: Arc<SegmentTable>, config: SynthesizerConfig) -> Self {
        Self {
            zones,
            segments,
            config,
        }
    }

    /// Zone ids enclosing the start and goal.
    pub fn locate(&self, start: &Pose2D, end: &Pose2D) -> Result<(u8, u8), PathError> {
        let find = |pose: &Pose2D| {
            let point = pose.translation();
            self.zones
                .locate(&point)
                .map(|z| z.id())
                .ok_or(PathError::NoEnclosingZone { point })
        };
        Ok((find(start)?, find(end)?))
    }

    pub fn zones(&self) -> &ZoneMap {
        &self.zones
    }

    pub fn segments(&self) -> &SegmentTable {
        &self.segments
    }
}

impl PathSource for PathSynthesizer {
    fn precheck(&self, start: &Pose2D, end: &Pose2D) -> Result<(), PathError> {
        self.locate(start, end).map(|_| ())
    }

    fn synthesize(&self, start: &Pose2D, end: &Pose2D) -> Result<Path, PathError> {
        let (start_zone, end_zone) = self.locate(start, end)?;
        let zone_segment = self
            .segments
            .lookup(start_zone, end_zone)
            .ok_or(PathError::NoKnownSegment {
                start: start_zone,
                end: end_zone,
            })?;

        // Segments always hold at least one waypoint
        let (Some(first), Some(last)) = (
            zone_segment.waypoints().first().copied(),
            zone_segment.waypoints().last().copied(),
        ) else {
            return Err(PathError::NoKnownSegment {
                start: start_zone,
                end: end_zone,
            });
        };

        let step = self.config.step_size;
        let entry =
            StraightSegment::between(start.translation(), first.translation, start.theta, step);
        let exit = StraightSegment::between(last.translation, end.translation(), end.theta, step);

        let segments = [
            PathSegment::Straight(entry),
            PathSegment::Zone(zone_segment),
            PathSegment::Straight(exit),
        ];
        let path = Path::assemble(*start, *end, &segments, self.config.limits);

        log::debug!(
            "Synthesized path zone {} -> {}: {} waypoints, {:.2} m",
            start_zone,
            end_zone,
            path.len(),
            path.total_distance()
        );
        Ok(path)
    }
}
