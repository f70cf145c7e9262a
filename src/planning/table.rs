//! Zone-to-zone segment lookup.

use std::collections::HashMap;
use std::sync::Arc;

use super::segment::ZoneSegment;
use crate::error::AssetError;

/// Immutable table of precomputed zone segments keyed by (start, end) zone.
///
/// Only one direction of a pair needs to be stored: when (a, b) is missing
/// but (b, a) exists, the reverse is generated on lookup. An explicit entry
/// always wins over a generated reverse.
#[derive(Debug, Clone, Default)]
pub struct SegmentTable {
    segments: HashMap<(u8, u8), Arc<ZoneSegment>>,
}

impl SegmentTable {
    /// Index parsed segments. Two records for the same ordered pair is an error.
    pub fn from_segments(segments: Vec<ZoneSegment>) -> Result<Self, AssetError> {
        let mut table = HashMap::with_capacity(segments.len());
        for segment in segments {
            let key = (segment.start_zone(), segment.end_zone());
            if table.insert(key, Arc::new(segment)).is_some() {
                return Err(AssetError::DuplicateRecord {
                    start: key.0,
                    end: key.1,
                });
            }
        }
        Ok(Self { segments: table })
    }

    /// Segment driving from zone `start` to zone `end`.
    pub fn lookup(&self, start: u8, end: u8) -> Option<Arc<ZoneSegment>> {
        if let Some(segment) = self.segments.get(&(start, end)) {
            return Some(Arc::clone(segment));
        }
        self.segments
            .get(&(end, start))
            .map(|segment| Arc::new(segment.reversed()))
    }

    /// Whether (start, end) is stored explicitly, not counting reverses.
    pub fn contains_explicit(&self, start: u8, end: u8) -> bool {
        self.segments.contains_key(&(start, end))
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Stored segments in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &ZoneSegment> {
        self.segments.values().map(|s| s.as_ref())
    }
}
