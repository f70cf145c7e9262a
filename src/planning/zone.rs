//! Field zones.
//!
//! The field is partitioned into a small number of static polygons. Every
//! point a path can start or end at must fall inside one of them. Lookup is
//! a linear scan with an axis-aligned bounding box reject before the exact
//! crossing-number test.

use crate::config::ZoneConfig;
use crate::core::types::Point2D;
use crate::error::{Error, Result};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point2D,
    pub max: Point2D,
}

impl Bounds {
    fn enclosing(points: &[Point2D]) -> Self {
        let mut min = Point2D::new(f32::INFINITY, f32::INFINITY);
        let mut max = Point2D::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, p: &Point2D) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// A simple polygon with a small integer id.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    id: u8,
    vertices: Vec<Point2D>,
    bounds: Bounds,
}

impl Zone {
    /// Build a zone, rejecting polygons with fewer than three vertices or
    /// crossing edges.
    pub fn new(id: u8, vertices: Vec<Point2D>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(Error::Zones(format!(
                "zone {} has {} vertices, need at least 3",
                id,
                vertices.len()
            )));
        }
        if let Some((a, b)) = first_crossing(&vertices) {
            return Err(Error::Zones(format!(
                "zone {} is self-intersecting (edges {} and {})",
                id, a, b
            )));
        }
        let bounds = Bounds::enclosing(&vertices);
        Ok(Self {
            id,
            vertices,
            bounds,
        })
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn vertices(&self) -> &[Point2D] {
        &self.vertices
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Point-in-polygon test.
    ///
    /// Points exactly on an edge may go either way.
    pub fn contains(&self, p: &Point2D) -> bool {
        if !self.bounds.contains(p) {
            return false;
        }
        let mut inside = false;
        let n = self.vertices.len();
        let mut j = n - 1;
        for i in 0..n {
            let vi = &self.vertices[i];
            let vj = &self.vertices[j];
            if (vi.y > p.y) != (vj.y > p.y) {
                let x_cross = vj.x + (p.y - vj.y) * (vi.x - vj.x) / (vi.y - vj.y);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

/// Immutable zone table.
#[derive(Debug, Clone)]
pub struct ZoneMap {
    zones: Vec<Zone>,
}

impl ZoneMap {
    /// Build from zones. An empty table is a configuration error.
    pub fn new(zones: Vec<Zone>) -> Result<Self> {
        if zones.is_empty() {
            return Err(Error::Zones("zone table is empty".into()));
        }
        for (i, zone) in zones.iter().enumerate() {
            if zones[..i].iter().any(|z| z.id == zone.id) {
                return Err(Error::Zones(format!("duplicate zone id {}", zone.id)));
            }
        }
        Ok(Self { zones })
    }

    pub fn from_config(configs: &[ZoneConfig]) -> Result<Self> {
        let zones = configs
            .iter()
            .map(|c| Zone::new(c.id, c.points()))
            .collect::<Result<Vec<_>>>()?;
        Self::new(zones)
    }

    /// First zone containing `p`, in table order.
    pub fn locate(&self, p: &Point2D) -> Option<&Zone> {
        self.zones.iter().find(|z| z.contains(p))
    }

    pub fn get(&self, id: u8) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == id)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }
}

/// First pair of non-adjacent edges that intersect, if any.
fn first_crossing(vertices: &[Point2D]) -> Option<(usize, usize)> {
    let n = vertices.len();
    for i in 0..n {
        let (a1, a2) = (vertices[i], vertices[(i + 1) % n]);
        for j in (i + 2)..n {
            // Edge n-1 and edge 0 share a vertex
            if i == 0 && j == n - 1 {
                continue;
            }
            let (b1, b2) = (vertices[j], vertices[(j + 1) % n]);
            if segments_intersect(&a1, &a2, &b1, &b2) {
                return Some((i, j));
            }
        }
    }
    None
}

fn cross(o: &Point2D, a: &Point2D, b: &Point2D) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn segments_intersect(p1: &Point2D, p2: &Point2D, q1: &Point2D, q2: &Point2D) -> bool {
    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);
    (d1 > 0.0) != (d2 > 0.0) && (d3 > 0.0) != (d4 > 0.0) && d1 != 0.0 && d2 != 0.0
}
