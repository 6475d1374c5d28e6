use std::{collections::BTreeMap, fmt};

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::orient::{Direction, Orient};
use geo::{Area, Contains, Coord, Line, LineString, Polygon, Relate};
use outlook_arrangement::snap::{
    locate_in_ring, ring_area2, segments_cross, segments_meet, segments_overlap, RingPosition,
};
use outlook_arrangement::{Grid, GridPoint};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{InputError, InvalidProbability};
use crate::risk;
use crate::types::{CategoricalTier, Hazard, NestingRank, Probability};

/// Stable identity of a risk area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaId(pub u64);

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Typed value of a risk area extension field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtensionValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

/// A single drawn risk area of one hazard.  Immutable once built; edits
/// produce a new value with the same id.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskArea {
    id: AreaId,
    hazard: Hazard,
    probability: Probability,
    tier: CategoricalTier,
    boundary: Polygon<f64>,
    extensions: BTreeMap<String, ExtensionValue>,
}

impl RiskArea {
    /// Build a risk area, validating the probability against the hazard's
    /// table and the boundary's rings.  Rings are re-oriented so the exterior
    /// is counter-clockwise and holes are clockwise.
    pub fn new(id: AreaId, hazard: Hazard, probability: Probability, boundary: Polygon<f64>) -> Result<Self, InputError> {
        let tier = risk::classify(hazard, probability)?;
        check_boundary(id, &boundary)?;
        Ok(Self {
            id,
            hazard,
            probability,
            tier,
            boundary: boundary.orient(Direction::Default),
            extensions: BTreeMap::new(),
        })
    }

    /// Like `new`, parsing the probability from its literal form.
    pub fn parse(id: AreaId, hazard: Hazard, literal: &str, boundary: Polygon<f64>) -> Result<Self, InputError> {
        let probability = literal.parse::<Probability>()
            .map_err(|_| InvalidProbability { hazard, literal: literal.to_string() })?;
        Self::new(id, hazard, probability, boundary)
    }

    /// Same area with a new boundary (an edit).  Extensions are kept.
    pub fn with_boundary(&self, boundary: Polygon<f64>) -> Result<Self, InputError> {
        let mut area = Self::new(self.id, self.hazard, self.probability, boundary)?;
        area.extensions = self.extensions.clone();
        Ok(area)
    }

    pub fn with_extension(mut self, key: impl Into<String>, value: ExtensionValue) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    pub fn with_extensions(mut self, extensions: BTreeMap<String, ExtensionValue>) -> Self {
        self.extensions.extend(extensions);
        self
    }

    #[inline] pub fn id(&self) -> AreaId { self.id }

    #[inline] pub fn hazard(&self) -> Hazard { self.hazard }

    #[inline] pub fn probability(&self) -> Probability { self.probability }

    #[inline] pub fn rank(&self) -> NestingRank { self.probability.rank() }

    /// Categorical tier of this area's probability.
    #[inline] pub fn tier(&self) -> CategoricalTier { self.tier }

    #[inline] pub fn boundary(&self) -> &Polygon<f64> { &self.boundary }

    #[inline] pub fn extensions(&self) -> &BTreeMap<String, ExtensionValue> { &self.extensions }

    /// Check the boundary as it looks on the snapping grid of `config`.
    ///
    /// A ring that is simple in world coordinates can collapse or touch
    /// itself once its vertices are snapped; the nesting rules and the
    /// overlay only ever see the snapped rings.  Rings must keep more than
    /// `area_epsilon` of area, stay simple, and not cross or overlap each
    /// other, and every hole must stay inside the exterior.
    pub fn check_snapped(&self, config: &EngineConfig) -> Result<(), InputError> {
        let Ok(grid) = Grid::new(config.snap_epsilon) else { return Ok(()) };
        let id = self.id;
        let rings: Vec<Vec<GridPoint>> = std::iter::once(self.boundary.exterior())
            .chain(self.boundary.interiors())
            .map(|ring| grid.snap_ring(ring).map_err(|_| InputError::NonFiniteCoordinate { area: id }))
            .collect::<Result<_, _>>()?;

        for (i, ring) in rings.iter().enumerate() {
            let area = ring_area2(ring).unsigned_abs() as f64 / 2.0 * grid.cell_area();
            if ring.len() < 3 || area <= config.area_epsilon {
                return Err(InputError::DegenerateRing { area: id, ring: i });
            }
            if !snapped_ring_is_simple(ring) {
                return Err(InputError::SelfIntersection { area: id, ring: i });
            }
        }

        for (i, hole) in rings.iter().enumerate().skip(1) {
            if rings[..i].iter().any(|other| rings_conflict(hole, other)) {
                return Err(InputError::SelfIntersection { area: id, ring: i });
            }
            let inside = hole.iter()
                .map(|&p| locate_in_ring(p, &rings[0]))
                .find(|&pos| pos != RingPosition::OnBoundary);
            if inside != Some(RingPosition::Inside) {
                return Err(InputError::HoleOutsideShell { area: id, ring: i });
            }
        }
        Ok(())
    }
}

/// Reject boundaries that are empty, non-finite, degenerate or self-crossing.
fn check_boundary(id: AreaId, boundary: &Polygon<f64>) -> Result<(), InputError> {
    if boundary.exterior().0.is_empty() {
        return Err(InputError::EmptyGeometry { area: id });
    }

    let rings: Vec<&LineString<f64>> = std::iter::once(boundary.exterior()).chain(boundary.interiors()).collect();
    for (ring, coords) in rings.iter().enumerate() {
        if coords.0.iter().any(|c| !(c.x.is_finite() && c.y.is_finite())) {
            return Err(InputError::NonFiniteCoordinate { area: id });
        }
        let vertices = open_ring(coords);
        if vertices.len() < 3 || Polygon::new((*coords).clone(), vec![]).unsigned_area() <= 0.0 {
            return Err(InputError::DegenerateRing { area: id, ring });
        }
        if self_intersects(&vertices) {
            return Err(InputError::SelfIntersection { area: id, ring });
        }
    }

    let shell = Polygon::new(boundary.exterior().clone(), vec![]);
    let holes: Vec<Polygon<f64>> = boundary.interiors().iter().map(|h| Polygon::new(h.clone(), vec![])).collect();
    for (i, hole) in holes.iter().enumerate() {
        if !shell.contains(hole) {
            return Err(InputError::HoleOutsideShell { area: id, ring: i + 1 });
        }
        for other in &holes[..i] {
            let im = hole.relate(other);
            if im.is_intersects() && !im.is_touches() {
                return Err(InputError::SelfIntersection { area: id, ring: i + 1 });
            }
        }
    }
    Ok(())
}

/// Ring vertices without consecutive duplicates or the closing vertex.
fn open_ring(ring: &LineString<f64>) -> Vec<Coord<f64>> {
    let mut out: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len());
    for &c in &ring.0 {
        if out.last() != Some(&c) {
            out.push(c);
        }
    }
    while out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    out
}

/// True if any two edges of the open ring meet anywhere other than at the
/// vertex shared by neighbouring edges.
fn self_intersects(vertices: &[Coord<f64>]) -> bool {
    let n = vertices.len();
    let edges: Vec<Line<f64>> = (0..n).map(|i| Line::new(vertices[i], vertices[(i + 1) % n])).collect();
    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            match line_intersection(edges[i], edges[j]) {
                None => {}
                Some(LineIntersection::SinglePoint { .. }) if adjacent => {}
                Some(_) => return true,
            }
        }
    }
    false
}

/// Edges of a ring on the grid, closing edge included.
fn ring_edges(ring: &[GridPoint]) -> impl Iterator<Item = (GridPoint, GridPoint)> + '_ {
    (0..ring.len()).map(move |i| (ring[i], ring[(i + 1) % ring.len()]))
}

/// Neighbouring edges may only share their common vertex; other edges may
/// not meet at all.
fn snapped_ring_is_simple(ring: &[GridPoint]) -> bool {
    let edges: Vec<(GridPoint, GridPoint)> = ring_edges(ring).collect();
    let n = edges.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let ((a, b), (c, d)) = (edges[i], edges[j]);
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            let bad = if adjacent { segments_overlap(a, b, c, d) } else { segments_meet(a, b, c, d) };
            if bad {
                return false;
            }
        }
    }
    true
}

/// Two rings cross, or run along each other.  Touching at single points is
/// allowed.
fn rings_conflict(r: &[GridPoint], s: &[GridPoint]) -> bool {
    ring_edges(r).any(|(a, b)| {
        ring_edges(s).any(|(c, d)| segments_cross(a, b, c, d) || segments_overlap(a, b, c, d))
    })
}
