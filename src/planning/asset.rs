//! Binary zone-segment asset.
//!
//! The asset is a flat concatenation of records:
//!
//! ```text
//! [start zone u8][end zone u8][count u8][count × waypoint]
//! waypoint = [x u24 BE][y u24 BE][rotation u8][reserved u8]
//! ```
//!
//! Coordinates are unsigned fixed point in units of 10 µm, so the field
//! spans 0 to ~167 m on each axis. Rotation is `r × 2π / 256`, normalized
//! to (-π, π]. The reserved byte is written as zero and ignored on read.

use std::f32::consts::TAU;
use std::fs;
use std::path::Path;

use super::segment::ZoneSegment;
use super::table::SegmentTable;
use crate::core::math::normalize_angle;
use crate::core::types::Point2D;
use crate::error::{AssetError, Result};

/// Bytes in a record header.
pub const HEADER_LEN: usize = 3;
/// Bytes per encoded waypoint.
pub const WAYPOINT_LEN: usize = 8;

const METERS_PER_UNIT: f32 = 1e-5;
const MAX_COORDINATE: u32 = (1 << 24) - 1;

/// Decode every record in `bytes`.
///
/// Any truncation is an error; the asset is all-or-nothing.
pub fn parse_segments(bytes: &[u8]) -> std::result::Result<Vec<ZoneSegment>, AssetError> {
    let mut segments = Vec::new();
    let mut offset = 0usize;

    while offset < bytes.len() {
        let remaining = bytes.len() - offset;
        if remaining < HEADER_LEN {
            return Err(AssetError::TruncatedHeader { offset, remaining });
        }
        let start = bytes[offset];
        let end = bytes[offset + 1];
        let count = bytes[offset + 2];
        let body = offset + HEADER_LEN;

        if count == 0 {
            return Err(AssetError::EmptyRecord { start, end });
        }
        let needed = count as usize * WAYPOINT_LEN;
        let available = bytes.len() - body;
        if available < needed {
            return Err(AssetError::TruncatedWaypoints {
                offset,
                start,
                end,
                count,
                available,
            });
        }

        let points = bytes[body..body + needed]
            .chunks_exact(WAYPOINT_LEN)
            .map(decode_waypoint)
            .collect();
        segments.push(ZoneSegment::new(start, end, points));
        offset = body + needed;
    }

    Ok(segments)
}

/// Encode segments in asset format.
pub fn encode_segments(segments: &[ZoneSegment]) -> std::result::Result<Vec<u8>, AssetError> {
    let mut out = Vec::new();
    for segment in segments {
        let (start, end) = (segment.start_zone(), segment.end_zone());
        let waypoints = segment.waypoints();
        if waypoints.is_empty() {
            return Err(AssetError::EmptyRecord { start, end });
        }
        let count = u8::try_from(waypoints.len()).map_err(|_| AssetError::TooManyWaypoints {
            start,
            end,
            count: waypoints.len(),
        })?;

        out.extend_from_slice(&[start, end, count]);
        for wp in waypoints {
            out.extend_from_slice(&encode_coordinate(wp.translation.x)?);
            out.extend_from_slice(&encode_coordinate(wp.translation.y)?);
            out.push(encode_rotation(wp.rotation));
            out.push(0);
        }
    }
    Ok(out)
}

/// Read and index the asset at `path`.
pub fn load_segment_table(path: &Path) -> Result<SegmentTable> {
    let bytes = fs::read(path)?;
    let segments = parse_segments(&bytes)?;
    let table = SegmentTable::from_segments(segments)?;
    log::info!(
        "Loaded {} zone segments from {} ({} bytes)",
        table.len(),
        path.display(),
        bytes.len()
    );
    Ok(table)
}

fn decode_waypoint(chunk: &[u8]) -> (Point2D, f32) {
    let x = u24_be(&chunk[0..3]) as f32 * METERS_PER_UNIT;
    let y = u24_be(&chunk[3..6]) as f32 * METERS_PER_UNIT;
    let rotation = normalize_angle(chunk[6] as f32 * TAU / 256.0);
    // chunk[7] reserved
    (Point2D::new(x, y), rotation)
}

#[inline]
fn u24_be(b: &[u8]) -> u32 {
    (b[0] as u32) << 16 | (b[1] as u32) << 8 | b[2] as u32
}

fn encode_coordinate(meters: f32) -> std::result::Result<[u8; 3], AssetError> {
    let units = (meters / METERS_PER_UNIT).round();
    if !(0.0..=MAX_COORDINATE as f32).contains(&units) {
        return Err(AssetError::CoordinateOutOfRange { value: meters });
    }
    let v = units as u32;
    Ok([(v >> 16) as u8, (v >> 8) as u8, v as u8])
}

fn encode_rotation(angle: f32) -> u8 {
    let r = (angle.rem_euclid(TAU) / TAU * 256.0).round() as u32;
    (r % 256) as u8
}
