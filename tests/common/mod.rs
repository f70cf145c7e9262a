//! Shared field layout for integration tests.
//!
//! Two side-by-side zones with one known route from zone 1 into zone 2:
//!
//! ```text
//!  y=7 ┌───────────┬───────────┐
//!      │           │      ● (5,5)
//!      │  zone 1   │  zone 2   │
//!      │       ●───┼──●        │
//!      │  ● (0,0)  │           │
//! y=-1 └───────────┴───────────┘
//!     x=-1        x=3         x=7
//! ```

#![allow(dead_code)]

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};
use std::sync::Arc;

use gati_nav::planning::{
    PathSynthesizer, SegmentTable, SynthesizerConfig, Zone, ZoneMap, ZoneSegment,
};
use gati_nav::{Point2D, SwerveKinematics};

pub fn rect(id: u8, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Zone {
    Zone::new(
        id,
        vec![
            Point2D::new(min_x, min_y),
            Point2D::new(max_x, min_y),
            Point2D::new(max_x, max_y),
            Point2D::new(min_x, max_y),
        ],
    )
    .unwrap()
}

pub fn zones() -> ZoneMap {
    ZoneMap::new(vec![
        rect(1, -1.0, -1.0, 3.0, 7.0),
        rect(2, 3.0, -1.0, 7.0, 7.0),
    ])
    .unwrap()
}

/// The 1 → 2 route: three waypoints.
pub fn crossing_segment() -> ZoneSegment {
    ZoneSegment::new(
        1,
        2,
        vec![
            (Point2D::new(1.0, 1.0), 0.0),
            (Point2D::new(3.0, 2.5), FRAC_PI_4),
            (Point2D::new(4.5, 4.0), FRAC_PI_2),
        ],
    )
}

pub fn segments() -> SegmentTable {
    SegmentTable::from_segments(vec![crossing_segment()]).unwrap()
}

pub fn synthesizer() -> PathSynthesizer {
    PathSynthesizer::new(
        Arc::new(zones()),
        Arc::new(segments()),
        SynthesizerConfig::default(),
    )
}

pub fn kinematics() -> SwerveKinematics {
    SwerveKinematics::rectangular(0.57, 0.57).unwrap()
}
