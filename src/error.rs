//! Error types for gati-nav.
//!
//! Startup failures (bad config, malformed asset, empty zone table) surface
//! as [`Error`]. Per-request path synthesis failures are [`PathError`]; they
//! are an expected outcome near field edges and never abort the process.

use thiserror::Error;

use crate::core::types::Point2D;

/// Crate-level error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Segment asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Zone table error: {0}")]
    Zones(String),

    #[error("Thread error: {0}")]
    Thread(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Violations of the binary segment asset format.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    #[error("truncated record header at byte {offset} ({remaining} bytes left)")]
    TruncatedHeader { offset: usize, remaining: usize },

    #[error(
        "record {start}->{end} at byte {offset} declares {count} waypoints but only {available} bytes remain"
    )]
    TruncatedWaypoints {
        offset: usize,
        start: u8,
        end: u8,
        count: u8,
        available: usize,
    },

    #[error("record {start}->{end} has no waypoints")]
    EmptyRecord { start: u8, end: u8 },

    #[error("duplicate record for {start}->{end}")]
    DuplicateRecord { start: u8, end: u8 },

    #[error("coordinate {value} m cannot be encoded in 24-bit fixed point")]
    CoordinateOutOfRange { value: f32 },

    #[error("record {start}->{end} has {count} waypoints, at most 255 fit")]
    TooManyWaypoints { start: u8, end: u8, count: usize },
}

/// Failure of a single path synthesis request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("no zone encloses ({:.3}, {:.3})", point.x, point.y)]
    NoEnclosingZone { point: Point2D },

    #[error("no segment known from zone {start} to zone {end}")]
    NoKnownSegment { start: u8, end: u8 },

    #[error("path worker could not be started: {0}")]
    WorkerUnavailable(String),
}
