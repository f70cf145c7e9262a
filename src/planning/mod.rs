//! Zone-based path synthesis.
//!
//! - [`zone`]: static field polygons and point location
//! - [`segment`]: waypoints, precomputed zone segments, straight segments
//! - [`asset`]: binary segment asset codec
//! - [`table`]: segment lookup with on-demand reversal
//! - [`profile`]: trapezoidal velocity profile
//! - [`path`]: assembled, speed-annotated path
//! - [`synthesizer`]: the synthesis pipeline

pub mod asset;
pub mod path;
pub mod profile;
pub mod segment;
pub mod synthesizer;
pub mod table;
pub mod zone;

pub use asset::{encode_segments, load_segment_table, parse_segments};
pub use path::{MotionLimits, Path};
pub use profile::{ProfilePhase, TrapezoidProfile};
pub use segment::{PathSegment, StraightSegment, Waypoint, ZoneSegment};
pub use synthesizer::{PathSource, PathSynthesizer, SynthesizerConfig};
pub use table::SegmentTable;
pub use zone::{Bounds, Zone, ZoneMap};
