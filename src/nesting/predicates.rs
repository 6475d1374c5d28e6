use geo::{Area, BooleanOps, Coord, MapCoords, Polygon, Relate};

use crate::config::EngineConfig;

/// Polygon predicates evaluated on grid-snapped geometry, with an area
/// tolerance for "overlap" and "inside".
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Predicates {
    snap_epsilon: f64,
    area_epsilon: f64,
}

impl Predicates {
    pub(crate) fn new(config: &EngineConfig) -> Self {
        Self { snap_epsilon: config.snap_epsilon, area_epsilon: config.area_epsilon }
    }

    /// Round every vertex to the snapping grid.
    pub(crate) fn snap(&self, polygon: &Polygon<f64>) -> Polygon<f64> {
        let eps = self.snap_epsilon;
        if !(eps.is_finite() && eps > 0.0) {
            return polygon.clone();
        }
        polygon.map_coords(|c| Coord { x: (c.x / eps).round() * eps, y: (c.y / eps).round() * eps })
    }

    /// Interiors intersect in more than `area_epsilon` of area.  Shared edges
    /// and touching vertices do not overlap.
    pub(crate) fn overlaps(&self, a: &Polygon<f64>, b: &Polygon<f64>) -> bool {
        let im = a.relate(b);
        if !im.is_intersects() || im.is_touches() {
            return false;
        }
        a.intersection(b).unsigned_area() > self.area_epsilon
    }

    /// `inner` lies inside `outer`, boundary contact allowed, up to
    /// `area_epsilon` of overshoot.
    pub(crate) fn contains(&self, outer: &Polygon<f64>, inner: &Polygon<f64>) -> bool {
        let im = inner.relate(outer);
        if im.is_within() {
            return true;
        }
        if !im.is_intersects() {
            return false;
        }
        inner.difference(outer).unsigned_area() <= self.area_epsilon
    }
}
