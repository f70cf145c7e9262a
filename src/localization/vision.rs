//! Camera tag observations and robot pose resolution.
//!
//! A camera frame carries every fiducial tag it saw. With a single tag the
//! per-tag pose solve is used, but only if its ambiguity (ratio of the best
//! to second-best reprojection error) is low. With two or more tags all tag
//! corners are solved jointly, which does not suffer from the single-tag
//! flip ambiguity.

use crate::core::types::{Point2D, Pose2D};

/// One tag corner: known field position and where the camera saw it,
/// expressed in the robot frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagCorner {
    pub field: Point2D,
    pub observed: Point2D,
}

/// A single detected tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TagObservation {
    pub tag_id: u16,
    /// Robot pose implied by this tag alone
    pub robot_pose: Pose2D,
    /// Reprojection error ratio in [0, 1]; higher is worse
    pub ambiguity: f32,
    pub corners: Vec<TagCorner>,
}

/// Everything one camera reported for one exposure.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraFrame {
    pub camera_id: u8,
    /// Exposure time on the control loop time base
    pub timestamp_us: u64,
    pub tags: Vec<TagObservation>,
}

/// Which solve produced a vision pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveMethod {
    SingleTag,
    MultiTag,
}

/// Why a frame produced no pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    NoTags,
    /// Single tag above the ambiguity threshold
    Ambiguous { ambiguity: f32 },
    /// All corners coincide, rotation is unobservable
    Degenerate,
}

/// Robot pose from one camera frame.
pub fn resolve_frame(
    frame: &CameraFrame,
    ambiguity_threshold: f32,
) -> Result<(Pose2D, SolveMethod), Rejection> {
    match frame.tags.as_slice() {
        [] => Err(Rejection::NoTags),
        [tag] => {
            if tag.ambiguity > ambiguity_threshold {
                Err(Rejection::Ambiguous {
                    ambiguity: tag.ambiguity,
                })
            } else {
                Ok((tag.robot_pose, SolveMethod::SingleTag))
            }
        }
        tags => {
            let corners: Vec<TagCorner> =
                tags.iter().flat_map(|t| t.corners.iter().copied()).collect();
            solve_multi_point(&corners)
                .map(|pose| (pose, SolveMethod::MultiTag))
                .ok_or(Rejection::Degenerate)
        }
    }
}

/// Closed-form rigid alignment of observed corners onto their field positions.
///
/// Finds the pose `P` minimizing Σ |P·observed − field|². Returns `None`
/// with fewer than two corners or when the observed corners coincide.
pub fn solve_multi_point(corners: &[TagCorner]) -> Option<Pose2D> {
    if corners.len() < 2 {
        return None;
    }

    let n = corners.len() as f32;
    let (mut sx, mut sy, mut fx, mut fy) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
    for c in corners {
        sx += c.observed.x;
        sy += c.observed.y;
        fx += c.field.x;
        fy += c.field.y;
    }
    let observed_mean = Point2D::new(sx / n, sy / n);
    let field_mean = Point2D::new(fx / n, fy / n);

    // Cross-covariance terms
    let (mut h00, mut h01, mut h10, mut h11) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
    let mut spread = 0.0f32;
    for c in corners {
        let s = c.observed.sub(&observed_mean);
        let f = c.field.sub(&field_mean);
        h00 += s.x * f.x;
        h01 += s.x * f.y;
        h10 += s.y * f.x;
        h11 += s.y * f.y;
        spread += s.x * s.x + s.y * s.y;
    }
    if spread < 1e-9 {
        return None;
    }

    let theta = (h01 - h10).atan2(h00 + h11);
    let rotated = observed_mean.rotate(theta);
    Some(Pose2D::new(
        field_mean.x - rotated.x,
        field_mean.y - rotated.y,
        theta,
    ))
}
