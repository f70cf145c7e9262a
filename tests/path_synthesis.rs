//! Path synthesis scenarios
//!
//! Zone location, segment lookup (explicit and reversed), path invariants
//! and the binary asset, exercised through the public planning API.
//!
//! Run with: `cargo test --test path_synthesis`

mod common;

use approx::assert_relative_eq;
use std::f32::consts::FRAC_PI_2;
use std::path::Path as FsPath;

use gati_nav::planning::{
    PathSource, PathSynthesizer, SynthesizerConfig, ZoneMap, encode_segments,
    load_segment_table, parse_segments,
};
use gati_nav::{GatiConfig, Path, PathError, Point2D, Pose2D};
use std::sync::Arc;

fn assert_path_invariants(path: &Path) {
    let waypoints = path.waypoints();
    assert!(!waypoints.is_empty());
    assert_eq!(waypoints[0].distance, 0.0);
    for pair in waypoints.windows(2) {
        assert!(
            pair[1].distance > pair[0].distance,
            "distances not increasing: {} then {}",
            pair[0].distance,
            pair[1].distance
        );
    }
    let sum: f32 = path.segment_lengths().iter().sum();
    assert_relative_eq!(path.total_distance(), sum, epsilon = 1e-4);
    assert_relative_eq!(path.last().distance, path.total_distance(), epsilon = 1e-3);
    assert_eq!(path.last().speed, 0.0);
}

#[test]
fn test_zone_one_to_zone_two() {
    let synth = common::synthesizer();
    let start = Pose2D::new(0.0, 0.0, 0.0);
    let end = Pose2D::new(5.0, 5.0, FRAC_PI_2);

    let path = synth.synthesize(&start, &end).unwrap();
    assert_path_invariants(&path);

    // Not turned yet at the start, fully turned at the goal
    assert_relative_eq!(path.first().rotation, 0.0, epsilon = 1e-6);
    assert_relative_eq!(path.last().rotation, FRAC_PI_2, epsilon = 1e-5);
    assert_eq!(path.first().translation, start.translation());
    assert_eq!(path.last().translation, end.translation());

    // Passes through every waypoint of the zone segment
    for corner in [
        Point2D::new(1.0, 1.0),
        Point2D::new(3.0, 2.5),
        Point2D::new(4.5, 4.0),
    ] {
        assert!(
            path.waypoints().iter().any(|wp| wp.translation == corner),
            "missing {:?}",
            corner
        );
    }
    assert_eq!(path.segment_lengths().len(), 3);
}

#[test]
fn test_speeds_follow_profile() {
    let path = common::synthesizer()
        .synthesize(&Pose2D::new(0.0, 0.0, 0.0), &Pose2D::new(5.0, 5.0, FRAC_PI_2))
        .unwrap();
    let peak = path.waypoints().iter().map(|wp| wp.speed).fold(0.0, f32::max);
    assert!(peak > 0.0);
    assert!(peak <= SynthesizerConfig::default().limits.max_velocity + 1e-4);
    assert_eq!(path.first().speed, 0.0);
}

#[test]
fn test_reverse_direction_generated() {
    let synth = common::synthesizer();
    let path = synth
        .synthesize(&Pose2D::new(5.0, 5.0, FRAC_PI_2), &Pose2D::new(0.0, 0.0, 0.0))
        .unwrap();
    assert_path_invariants(&path);

    let far = path
        .waypoints()
        .iter()
        .position(|wp| wp.translation == Point2D::new(4.5, 4.0))
        .unwrap();
    let near = path
        .waypoints()
        .iter()
        .position(|wp| wp.translation == Point2D::new(1.0, 1.0))
        .unwrap();
    assert!(far < near);
}

#[test]
fn test_start_outside_every_zone() {
    let synth = common::synthesizer();
    let err = synth
        .synthesize(&Pose2D::new(-5.0, -5.0, 0.0), &Pose2D::new(5.0, 5.0, 0.0))
        .unwrap_err();
    assert_eq!(
        err,
        PathError::NoEnclosingZone {
            point: Point2D::new(-5.0, -5.0)
        }
    );
    assert!(synth.precheck(&Pose2D::new(-5.0, -5.0, 0.0), &Pose2D::identity()).is_err());
}

#[test]
fn test_no_known_segment() {
    let synth = common::synthesizer();
    let err = synth
        .synthesize(&Pose2D::new(0.0, 0.0, 0.0), &Pose2D::new(2.0, 2.0, 0.0))
        .unwrap_err();
    assert_eq!(err, PathError::NoKnownSegment { start: 1, end: 1 });
}

#[test]
fn test_asset_file_round_trip() {
    let bytes = encode_segments(&[common::crossing_segment()]).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("segments.bin");
    std::fs::write(&file, &bytes).unwrap();

    let table = load_segment_table(&file).unwrap();
    assert_eq!(table.len(), 1);
    let synth = PathSynthesizer::new(
        Arc::new(common::zones()),
        Arc::new(table),
        SynthesizerConfig::default(),
    );
    let from_file = synth
        .synthesize(&Pose2D::new(0.0, 0.0, 0.0), &Pose2D::new(5.0, 5.0, FRAC_PI_2))
        .unwrap();
    let in_memory = common::synthesizer()
        .synthesize(&Pose2D::new(0.0, 0.0, 0.0), &Pose2D::new(5.0, 5.0, FRAC_PI_2))
        .unwrap();

    assert_eq!(from_file.len(), in_memory.len());
    assert_relative_eq!(
        from_file.total_distance(),
        in_memory.total_distance(),
        epsilon = 1e-3
    );
}

#[test]
fn test_truncated_asset_is_fatal() {
    let mut bytes = encode_segments(&[common::crossing_segment()]).unwrap();
    bytes.truncate(bytes.len() - 3);
    assert!(parse_segments(&bytes).is_err());

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("short.bin");
    std::fs::write(&file, &bytes).unwrap();
    assert!(load_segment_table(&file).is_err());
}

#[test]
fn test_deployed_field_plans() {
    let root = FsPath::new(env!("CARGO_MANIFEST_DIR"));
    let config = GatiConfig::load(&root.join("gati.toml")).unwrap();
    let zones = ZoneMap::from_config(&config.planning.zones).unwrap();
    let table = load_segment_table(&root.join(&config.planning.segment_asset)).unwrap();
    assert!(table.contains_explicit(1, 2));

    let synth = PathSynthesizer::new(
        Arc::new(zones),
        Arc::new(table),
        SynthesizerConfig::from_config(&config),
    );
    let path = synth
        .synthesize(&Pose2D::new(0.0, 0.0, 0.0), &Pose2D::new(5.0, 5.0, FRAC_PI_2))
        .unwrap();
    assert_path_invariants(&path);
}

#[test]
fn test_deployed_zone_lookup_repeatable() {
    let root = FsPath::new(env!("CARGO_MANIFEST_DIR"));
    let config = GatiConfig::load(&root.join("gati.toml")).unwrap();
    let zones = ZoneMap::from_config(&config.planning.zones).unwrap();
    let table = load_segment_table(&root.join(&config.planning.segment_asset)).unwrap();
    let synth = PathSynthesizer::new(
        Arc::new(zones),
        Arc::new(table),
        SynthesizerConfig::from_config(&config),
    );

    // x = 3.0 is the edge shared by zones 1 and 2
    let start = Pose2D::new(3.0, 2.0, 0.0);
    let end = Pose2D::new(1.0, 1.0, 0.0);
    let first = synth.locate(&start, &end).unwrap();
    let second = synth.locate(&start, &end).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, (2, 1));

    let point = start.translation();
    let zone = synth.zones().locate(&point).map(|z| z.id());
    assert_eq!(zone, synth.zones().locate(&point).map(|z| z.id()));
}
