use std::fmt;

use geo::{Coord, LineString, Polygon};

use crate::error::ArrangementError;

/// A vertex snapped to the arrangement grid, in integer grid units.
///
/// All topological decisions (vertex identity, angular order, orientation,
/// point-in-ring) are made on `GridPoint`s so they are exact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPoint {
    pub x: i64,
    pub y: i64,
}

impl GridPoint {
    pub const fn new(x: i64, y: i64) -> Self { Self { x, y } }

    /// Grid coordinates as floats (exact for |x|, |y| < 2^53).
    #[inline] pub fn as_coord(self) -> Coord<f64> { Coord { x: self.x as f64, y: self.y as f64 } }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Largest grid magnitude for which `i64 -> f64` conversion stays exact.
const MAX_GRID: f64 = 9_007_199_254_740_992.0; // 2^53

/// A uniform snapping grid with spacing `epsilon`.
///
/// Near-coincident vertices (closer than half a cell) collapse to the same
/// `GridPoint`, which is what makes shared and touching edges coincide
/// exactly in the arrangement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid {
    epsilon: f64,
}

impl Grid {
    /// Create a grid with the given cell size.
    pub fn new(epsilon: f64) -> Result<Self, ArrangementError> {
        if !(epsilon.is_finite() && epsilon > 0.0) {
            return Err(ArrangementError::InvalidEpsilon(epsilon));
        }
        Ok(Self { epsilon })
    }

    #[inline] pub fn epsilon(&self) -> f64 { self.epsilon }

    /// Snap a coordinate to the nearest grid point.
    pub fn snap(&self, c: Coord<f64>) -> Result<GridPoint, ArrangementError> {
        let x = (c.x / self.epsilon).round();
        let y = (c.y / self.epsilon).round();
        if !(x.is_finite() && y.is_finite()) || x.abs() > MAX_GRID || y.abs() > MAX_GRID {
            return Err(ArrangementError::CoordinateOutOfRange { x: c.x, y: c.y });
        }
        Ok(GridPoint::new(x as i64, y as i64))
    }

    /// Map a grid point back to world coordinates.
    #[inline]
    pub fn coord(&self, p: GridPoint) -> Coord<f64> {
        Coord { x: p.x as f64 * self.epsilon, y: p.y as f64 * self.epsilon }
    }

    /// Area of one grid cell in world units.
    #[inline] pub fn cell_area(&self) -> f64 { self.epsilon * self.epsilon }

    /// Snap a ring, dropping consecutive duplicates and the closing vertex.
    /// Returns an open ring (first vertex not repeated at the end).
    pub fn snap_ring(&self, ring: &LineString<f64>) -> Result<Vec<GridPoint>, ArrangementError> {
        let mut out: Vec<GridPoint> = Vec::with_capacity(ring.0.len());
        for &c in &ring.0 {
            let p = self.snap(c)?;
            if out.last() != Some(&p) {
                out.push(p);
            }
        }
        while out.len() > 1 && out.first() == out.last() {
            out.pop();
        }
        Ok(out)
    }

    /// Snap every vertex of a polygon to the grid.  Rings are re-closed.
    pub fn snap_polygon(&self, polygon: &Polygon<f64>) -> Result<Polygon<f64>, ArrangementError> {
        let to_world = |ring: Vec<GridPoint>| -> LineString<f64> {
            let mut coords: Vec<Coord<f64>> = ring.iter().map(|&p| self.coord(p)).collect();
            if let Some(&first) = coords.first() {
                coords.push(first);
            }
            LineString(coords)
        };

        let exterior = to_world(self.snap_ring(polygon.exterior())?);
        let interiors = polygon.interiors().iter()
            .map(|ring| self.snap_ring(ring).map(to_world))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Polygon::new(exterior, interiors))
    }
}

/// Twice the signed area of an open ring of grid points (positive if CCW).
pub fn ring_area2(ring: &[GridPoint]) -> i128 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let a = ring[i];
            let b = ring[(i + 1) % n];
            a.x as i128 * b.y as i128 - b.x as i128 * a.y as i128
        })
        .sum()
}

/// Position of a point relative to a closed ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RingPosition {
    Inside,
    OnBoundary,
    Outside,
}

/// A point with rational coordinates `(x / scale, y / scale)` in grid units.
///
/// Face samples sit strictly between grid lines, so they are carried as
/// scaled integers and every test against grid geometry stays exact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Sample {
    pub x: i128,
    pub y: i128,
    pub scale: i128,
}

impl Sample {
    /// Grid units as floats.
    pub fn as_coord(self) -> Coord<f64> {
        Coord { x: self.x as f64 / self.scale as f64, y: self.y as f64 / self.scale as f64 }
    }
}

impl From<GridPoint> for Sample {
    fn from(p: GridPoint) -> Self { Self { x: p.x as i128, y: p.y as i128, scale: 1 } }
}

/// Exact point-in-ring test on an open ring of grid points.
pub fn locate_in_ring(p: GridPoint, ring: &[GridPoint]) -> RingPosition {
    locate_sample(p.into(), ring)
}

/// `locate_in_ring` for a rational sample.
pub fn locate_sample(p: Sample, ring: &[GridPoint]) -> RingPosition {
    let n = ring.len();
    let mut inside = false;
    for i in 0..n {
        let (a, b) = (ring[i], ring[(i + 1) % n]);
        if sample_on_segment(p, a, b) {
            return RingPosition::OnBoundary;
        }
        if crosses_ray(p, a, b) {
            inside = !inside;
        }
    }
    if inside { RingPosition::Inside } else { RingPosition::Outside }
}

/// True if the ray from `p` towards +x crosses the edge `a`–`b`, counting
/// the edge as half-open in y.  Summed over any closed chain of edges this
/// gives even-odd membership, whatever order the edges come in.
pub fn crosses_ray(p: Sample, a: GridPoint, b: GridPoint) -> bool {
    let (ay, by) = (a.y as i128 * p.scale, b.y as i128 * p.scale);
    if (ay > p.y) == (by > p.y) {
        return false;
    }
    // p.x < a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y), all scaled
    let lhs = (p.x - a.x as i128 * p.scale) * (b.y as i128 - a.y as i128);
    let rhs = (p.y - ay) * (b.x as i128 - a.x as i128);
    if b.y > a.y { lhs < rhs } else { lhs > rhs }
}

fn sample_on_segment(p: Sample, a: GridPoint, b: GridPoint) -> bool {
    let k = p.scale;
    let (ax, ay, bx, by) = (a.x as i128 * k, a.y as i128 * k, b.x as i128 * k, b.y as i128 * k);
    let cross = (bx - ax) * (p.y - ay) - (by - ay) * (p.x - ax);
    cross == 0
        && p.x >= ax.min(bx) && p.x <= ax.max(bx)
        && p.y >= ay.min(by) && p.y <= ay.max(by)
}

/// Exact orientation of `c` relative to the directed line `a -> b`.
#[inline]
pub fn orient(a: GridPoint, b: GridPoint, c: GridPoint) -> i128 {
    (b.x as i128 - a.x as i128) * (c.y as i128 - a.y as i128)
        - (b.y as i128 - a.y as i128) * (c.x as i128 - a.x as i128)
}

/// True if `p` lies on the closed segment `a`–`b`.
pub fn on_segment(p: GridPoint, a: GridPoint, b: GridPoint) -> bool {
    orient(a, b, p) == 0
        && p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// True if the open segments `a`–`b` and `c`–`d` cross at a single point
/// interior to both.
pub fn segments_cross(a: GridPoint, b: GridPoint, c: GridPoint, d: GridPoint) -> bool {
    let (o1, o2) = (orient(a, b, c).signum(), orient(a, b, d).signum());
    let (o3, o4) = (orient(c, d, a).signum(), orient(c, d, b).signum());
    o1 * o2 < 0 && o3 * o4 < 0
}

/// True if the closed segments `a`–`b` and `c`–`d` share any point.
pub fn segments_meet(a: GridPoint, b: GridPoint, c: GridPoint, d: GridPoint) -> bool {
    segments_cross(a, b, c, d)
        || on_segment(c, a, b) || on_segment(d, a, b)
        || on_segment(a, c, d) || on_segment(b, c, d)
}

/// True if the segments are collinear and share more than a single point.
pub fn segments_overlap(a: GridPoint, b: GridPoint, c: GridPoint, d: GridPoint) -> bool {
    if orient(a, b, c) != 0 || orient(a, b, d) != 0 {
        return false;
    }
    // Project on the dominant axis of a-b.
    let key = |p: GridPoint| if (b.x - a.x).abs() >= (b.y - a.y).abs() { p.x } else { p.y };
    let (lo1, hi1) = (key(a).min(key(b)), key(a).max(key(b)));
    let (lo2, hi2) = (key(c).min(key(d)), key(c).max(key(d)));
    lo1.max(lo2) < hi1.min(hi2)
}

/// Grid point nearest to the crossing of two segments that satisfy
/// `segments_cross`.  Halves round up.  `None` if the exact computation
/// would overflow.
pub fn round_crossing(a: GridPoint, b: GridPoint, c: GridPoint, d: GridPoint) -> Option<GridPoint> {
    let (rx, ry) = (b.x as i128 - a.x as i128, b.y as i128 - a.y as i128);
    let (sx, sy) = (d.x as i128 - c.x as i128, d.y as i128 - c.y as i128);
    let (qx, qy) = (c.x as i128 - a.x as i128, c.y as i128 - a.y as i128);

    let mut den = rx.checked_mul(sy)?.checked_sub(ry.checked_mul(sx)?)?;
    let mut num = qx.checked_mul(sy)?.checked_sub(qy.checked_mul(sx)?)?;
    if den == 0 {
        return None;
    }
    if den < 0 {
        den = -den;
        num = -num;
    }
    // a + r * num / den, rounded: floor((2 * a * den + 2 * r * num + den) / (2 * den))
    let round = |origin: i64, r: i128| -> Option<i64> {
        let top = (origin as i128).checked_mul(den)?.checked_add(r.checked_mul(num)?)?;
        let v = top.checked_mul(2)?.checked_add(den)?.div_euclid(den.checked_mul(2)?);
        i64::try_from(v).ok()
    };
    Some(GridPoint::new(round(a.x, rx)?, round(a.y, ry)?))
}

#[cfg(test)]
mod tests {
    use geo::{coord, polygon};

    use super::*;

    #[test]
    fn near_coincident_vertices_collapse() {
        let grid = Grid::new(1e-3).unwrap();
        let a = grid.snap(coord! { x: 1.0002, y: 2.0 }).unwrap();
        let b = grid.snap(coord! { x: 0.9998, y: 2.0001 }).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, GridPoint::new(1000, 2000));
    }

    #[test]
    fn rejects_non_positive_epsilon() {
        assert!(Grid::new(0.0).is_err());
        assert!(Grid::new(-1.0).is_err());
        assert!(Grid::new(f64::NAN).is_err());
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let grid = Grid::new(1.0).unwrap();
        assert!(grid.snap(coord! { x: f64::INFINITY, y: 0.0 }).is_err());
    }

    #[test]
    fn snap_ring_drops_duplicates_and_closure() {
        let grid = Grid::new(1.0).unwrap();
        let poly = polygon![
            (x: 0.0, y: 0.0), (x: 0.1, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0),
        ];
        let ring = grid.snap_ring(poly.exterior()).unwrap();
        assert_eq!(ring.len(), 4);
        assert_eq!(ring_area2(&ring), 8);
    }

    #[test]
    fn point_in_ring_is_exact() {
        let ring = [GridPoint::new(0, 0), GridPoint::new(4, 0), GridPoint::new(4, 4), GridPoint::new(0, 4)];
        assert_eq!(locate_in_ring(GridPoint::new(2, 2), &ring), RingPosition::Inside);
        assert_eq!(locate_in_ring(GridPoint::new(4, 2), &ring), RingPosition::OnBoundary);
        assert_eq!(locate_in_ring(GridPoint::new(0, 0), &ring), RingPosition::OnBoundary);
        assert_eq!(locate_in_ring(GridPoint::new(5, 2), &ring), RingPosition::Outside);
        assert_eq!(locate_in_ring(GridPoint::new(-1, 4), &ring), RingPosition::Outside);
    }

    #[test]
    fn samples_between_grid_lines_are_located_exactly() {
        let ring = [GridPoint::new(0, 0), GridPoint::new(1, 0), GridPoint::new(0, 1)];
        // (1/3, 1/3) is inside; (1/2, 1/2) is on the hypotenuse; (2/3, 2/3) is outside.
        assert_eq!(locate_sample(Sample { x: 1, y: 1, scale: 3 }, &ring), RingPosition::Inside);
        assert_eq!(locate_sample(Sample { x: 1, y: 1, scale: 2 }, &ring), RingPosition::OnBoundary);
        assert_eq!(locate_sample(Sample { x: 2, y: 2, scale: 3 }, &ring), RingPosition::Outside);
    }

    #[test]
    fn crossing_is_rounded_to_nearest_grid_point() {
        let p = |x, y| GridPoint::new(x, y);
        assert!(segments_cross(p(0, 0), p(4, 4), p(0, 4), p(4, 0)));
        assert_eq!(round_crossing(p(0, 0), p(4, 4), p(0, 4), p(4, 0)), Some(p(2, 2)));
        // Crossing at (1.5, 0.5) rounds half up.
        assert_eq!(round_crossing(p(0, 0), p(3, 1), p(1, 1), p(2, 0)), Some(p(2, 1)));
        // Shared endpoints and T-junctions are not crossings.
        assert!(!segments_cross(p(0, 0), p(2, 0), p(2, 0), p(2, 2)));
        assert!(!segments_cross(p(0, 0), p(4, 0), p(2, 0), p(2, 2)));
        assert!(segments_meet(p(0, 0), p(4, 0), p(2, 0), p(2, 2)));
    }

    #[test]
    fn collinear_overlap_needs_positive_length() {
        let p = |x, y| GridPoint::new(x, y);
        assert!(segments_overlap(p(0, 0), p(4, 0), p(2, 0), p(6, 0)));
        assert!(!segments_overlap(p(0, 0), p(2, 0), p(2, 0), p(4, 0)));
        assert!(!segments_overlap(p(0, 0), p(2, 0), p(0, 1), p(2, 1)));
        assert!(segments_overlap(p(0, 0), p(0, 3), p(0, 2), p(0, 1)));
    }
}
