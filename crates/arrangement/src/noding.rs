//! Segment noding by snap rounding.
//!
//! A pixel is the closed unit square around a grid point.  Pixels holding a
//! segment endpoint or a crossing of two segments are hot.  Every segment is
//! routed through the centres of the hot pixels it touches, in the order it
//! enters them, and the routes are cut into edges.  Routing can move an edge
//! by up to half a pixel, so the edges are checked again; any crossing they
//! still have becomes a new hot pixel and routing restarts from the original
//! segments.  The resulting edges only meet at shared endpoints.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::Line;
use rstar::{Envelope, RTree, RTreeObject, AABB};
use tracing::{debug, trace};

use crate::error::ArrangementError;
use crate::snap::{on_segment, round_crossing, segments_cross, GridPoint};

/// Below this many segments, candidate pairs are found by brute force rather
/// than through an R-tree.
pub const NAIVE_SEGMENT_THRESHOLD: usize = 64;

/// Routing rounds before giving up on a configuration that keeps crossing.
const MAX_ROUNDS: usize = 32;

/// An undirected segment between two distinct grid points, stored with
/// `a < b` so equal segments compare equal regardless of input direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Segment {
    pub a: GridPoint,
    pub b: GridPoint,
}

impl Segment {
    pub fn new(p: GridPoint, q: GridPoint) -> Self {
        if p <= q { Self { a: p, b: q } } else { Self { a: q, b: p } }
    }

    fn envelope(&self) -> AABB<[f64; 2]> {
        AABB::from_corners(
            [self.a.x.min(self.b.x) as f64, self.a.y.min(self.b.y) as f64],
            [self.a.x.max(self.b.x) as f64, self.a.y.max(self.b.y) as f64],
        )
    }

    /// Hot pixel nearest to where this segment crosses `other`.
    fn crossing(&self, other: &Segment) -> Option<GridPoint> {
        if !segments_cross(self.a, self.b, other.a, other.b) {
            return None;
        }
        round_crossing(self.a, self.b, other.a, other.b).or_else(|| {
            // Out of exact range: round the floating-point crossing instead.
            let line = |s: &Segment| Line::new(s.a.as_coord(), s.b.as_coord());
            match line_intersection(line(self), line(other))? {
                LineIntersection::SinglePoint { intersection, .. } => {
                    Some(GridPoint::new(intersection.x.round() as i64, intersection.y.round() as i64))
                }
                LineIntersection::Collinear { .. } => None,
            }
        })
    }
}

/// A segment envelope in an R-tree, associated with a segment by index.
struct SegmentBox {
    idx: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for SegmentBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope { self.envelope }
}

/// Snap-rounded segments.
#[derive(Clone, Debug)]
pub struct Noded {
    /// Sorted, deduplicated edges of the induced planar graph.
    pub edges: Vec<Segment>,
    /// For each input segment, the hot pixel centres it was routed through,
    /// from `a` to `b`.
    pub routes: Vec<Vec<GridPoint>>,
}

/// Snap-round a set of segments with integer endpoints.
pub fn node(segments: &[Segment], naive_threshold: usize) -> Result<Noded, ArrangementError> {
    let mut hot: BTreeSet<GridPoint> = segments.iter().flat_map(|s| [s.a, s.b]).collect();
    for (i, j) in candidate_pairs(segments, naive_threshold) {
        if let Some(p) = segments[i].crossing(&segments[j]) {
            hot.insert(p);
        }
    }

    for round in 0..MAX_ROUNDS {
        let pixels = HotPixels::new(&hot, naive_threshold);
        let routes: Vec<Vec<GridPoint>> = segments.iter().map(|s| pixels.route(s)).collect();

        let fragments: BTreeSet<Segment> = routes.iter()
            .flat_map(|r| r.windows(2).map(|w| Segment::new(w[0], w[1])))
            .collect();
        let edges = split_at_vertices(&fragments.into_iter().collect::<Vec<_>>(), &hot, naive_threshold);

        let crossings: Vec<GridPoint> = candidate_pairs(&edges, naive_threshold)
            .into_iter()
            .filter_map(|(i, j)| edges[i].crossing(&edges[j]))
            .collect();
        let before = hot.len();
        hot.extend(crossings.iter().copied());

        if crossings.is_empty() {
            debug!(segments = segments.len(), hot = hot.len(), edges = edges.len(), round, "snap rounding converged");
            return Ok(Noded { edges, routes });
        }
        trace!(round, crossings = crossings.len(), "edges still cross after routing");
        if hot.len() == before {
            break;
        }
    }
    Err(ArrangementError::Topology("snap rounding did not converge".to_string()))
}

/// Index pairs `(i, j)`, `i < j`, of segments whose envelopes intersect, in
/// ascending order.
fn candidate_pairs(segments: &[Segment], naive_threshold: usize) -> Vec<(usize, usize)> {
    let envelopes: Vec<_> = segments.iter().map(Segment::envelope).collect();
    let mut pairs = Vec::new();
    if segments.len() < naive_threshold {
        for i in 0..segments.len() {
            for j in (i + 1)..segments.len() {
                if envelopes[i].intersects(&envelopes[j]) {
                    pairs.push((i, j));
                }
            }
        }
        return pairs;
    }

    let rtree = RTree::bulk_load(
        envelopes.iter().enumerate().map(|(idx, &envelope)| SegmentBox { idx, envelope }).collect(),
    );
    for (i, envelope) in envelopes.iter().enumerate() {
        let mut js: Vec<usize> = rtree
            .locate_in_envelope_intersecting(envelope)
            .map(|b| b.idx)
            .filter(|&j| j > i)
            .collect();
        js.sort_unstable();
        pairs.extend(js.into_iter().map(|j| (i, j)));
    }
    pairs
}

/// Split edges at every hot pixel centre lying inside them, then deduplicate.
fn split_at_vertices(edges: &[Segment], hot: &BTreeSet<GridPoint>, naive_threshold: usize) -> Vec<Segment> {
    let pixels = HotPixels::new(hot, naive_threshold);
    let mut out = BTreeSet::new();
    for edge in edges {
        let mut points: Vec<GridPoint> = pixels.near(edge)
            .into_iter()
            .filter(|&p| on_segment(p, edge.a, edge.b))
            .collect();
        points.sort();
        points.dedup();
        for w in points.windows(2) {
            out.insert(Segment::new(w[0], w[1]));
        }
    }
    out.into_iter().collect()
}

/// The hot pixel centres, searchable by segment.
enum HotPixels<'a> {
    Naive(&'a BTreeSet<GridPoint>),
    Indexed(RTree<[i64; 2]>),
}

impl<'a> HotPixels<'a> {
    fn new(hot: &'a BTreeSet<GridPoint>, naive_threshold: usize) -> Self {
        if hot.len() < naive_threshold {
            HotPixels::Naive(hot)
        } else {
            HotPixels::Indexed(RTree::bulk_load(hot.iter().map(|p| [p.x, p.y]).collect()))
        }
    }

    /// Centres within one grid unit of the segment's bounding box.
    fn near(&self, s: &Segment) -> Vec<GridPoint> {
        let (x0, x1) = (s.a.x.min(s.b.x) - 1, s.a.x.max(s.b.x) + 1);
        let (y0, y1) = (s.a.y.min(s.b.y) - 1, s.a.y.max(s.b.y) + 1);
        match self {
            HotPixels::Naive(hot) => hot.iter()
                .filter(|p| p.x >= x0 && p.x <= x1 && p.y >= y0 && p.y <= y1)
                .copied()
                .collect(),
            HotPixels::Indexed(rtree) => rtree
                .locate_in_envelope(&AABB::from_corners([x0, y0], [x1, y1]))
                .map(|&[x, y]| GridPoint::new(x, y))
                .collect(),
        }
    }

    /// Hot pixel centres visited by `s`, from `s.a` to `s.b`.
    fn route(&self, s: &Segment) -> Vec<GridPoint> {
        let mut visits: Vec<(Entry, GridPoint)> = self.near(s)
            .into_iter()
            .filter(|&p| p != s.a && p != s.b)
            .filter_map(|p| pixel_entry(s.a, s.b, p).map(|e| (e, p)))
            .collect();
        visits.sort_by(|(e, p), (f, q)| e.cmp(f).then_with(|| p.cmp(q)));

        let mut route: Vec<GridPoint> = Vec::with_capacity(visits.len() + 2);
        route.push(s.a);
        route.extend(visits.into_iter().map(|(_, p)| p));
        route.push(s.b);
        route
    }
}

/// A non-negative fraction `num / den`, `den > 0`.
#[derive(Clone, Copy, Debug)]
struct Ratio {
    num: i128,
    den: i128,
}

impl Ratio {
    const ZERO: Ratio = Ratio { num: 0, den: 1 };
    const ONE: Ratio = Ratio { num: 1, den: 1 };

    fn new(num: i128, den: i128) -> Self {
        if den < 0 { Self { num: -num, den: -den } } else { Self { num, den } }
    }
}

impl PartialEq for Ratio {
    fn eq(&self, other: &Self) -> bool { self.cmp(other) == Ordering::Equal }
}

impl Eq for Ratio {}

impl PartialOrd for Ratio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Ratio {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.num * other.den).cmp(&(other.num * self.den))
    }
}

/// Where a segment enters and leaves a pixel, as parameters along it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    enter: Ratio,
    leave: Ratio,
}

/// Clip `a + t (b - a)`, `t` in `[0, 1]`, to the closed pixel around `h`.
/// Works in doubled coordinates so the pixel edges are integers.
fn pixel_entry(a: GridPoint, b: GridPoint, h: GridPoint) -> Option<Entry> {
    let (ax, ay) = (2 * a.x as i128, 2 * a.y as i128);
    let (dx, dy) = (2 * (b.x as i128 - a.x as i128), 2 * (b.y as i128 - a.y as i128));
    let (hx, hy) = (2 * h.x as i128, 2 * h.y as i128);

    let mut enter = Ratio::ZERO;
    let mut leave = Ratio::ONE;
    let sides: [(i128, i128); 4] = [
        (-dx, ax - (hx - 1)),
        (dx, (hx + 1) - ax),
        (-dy, ay - (hy - 1)),
        (dy, (hy + 1) - ay),
    ];
    for (p, q) in sides {
        if p == 0 {
            if q < 0 {
                return None;
            }
            continue;
        }
        let t = Ratio::new(q, p);
        if p < 0 {
            enter = enter.max(t);
        } else {
            leave = leave.min(t);
        }
        if enter > leave {
            return None;
        }
    }
    Some(Entry { enter, leave })
}

#[cfg(test)]
mod tests {
    use smallvec::SmallVec;

    use super::*;
    use crate::snap::orient;

    /// True if the closed pixel around `h` meets segment `a`–`b`.
    fn touches_pixel(a: GridPoint, b: GridPoint, h: GridPoint) -> bool {
        let corners: SmallVec<[GridPoint; 4]> = [(-1, -1), (1, -1), (1, 1), (-1, 1)]
            .into_iter()
            .map(|(dx, dy)| GridPoint::new(2 * h.x + dx, 2 * h.y + dy))
            .collect();
        let (a2, b2) = (GridPoint::new(2 * a.x, 2 * a.y), GridPoint::new(2 * b.x, 2 * b.y));
        let sides: SmallVec<[i128; 4]> = corners.iter().map(|&c| orient(a2, b2, c).signum()).collect();
        let inside_box = a2.x.min(b2.x) <= 2 * h.x + 1 && a2.x.max(b2.x) >= 2 * h.x - 1
            && a2.y.min(b2.y) <= 2 * h.y + 1 && a2.y.max(b2.y) >= 2 * h.y - 1;
        inside_box && !(sides.iter().all(|&s| s > 0) || sides.iter().all(|&s| s < 0))
    }

    fn seg(ax: i64, ay: i64, bx: i64, by: i64) -> Segment {
        Segment::new(GridPoint::new(ax, ay), GridPoint::new(bx, by))
    }

    fn edges(segments: &[Segment]) -> Vec<Segment> {
        node(segments, NAIVE_SEGMENT_THRESHOLD).unwrap().edges
    }

    #[test]
    fn crossing_segments_split_at_intersection() {
        let out = edges(&[seg(0, 0, 4, 4), seg(0, 4, 4, 0)]);
        assert_eq!(out.len(), 4);
        assert!(out.contains(&seg(0, 0, 2, 2)));
        assert!(out.contains(&seg(2, 2, 4, 0)));
    }

    #[test]
    fn t_junction_splits_only_the_touched_segment() {
        let out = edges(&[seg(0, 0, 4, 0), seg(2, 0, 2, 3)]);
        assert_eq!(out, vec![seg(0, 0, 2, 0), seg(2, 0, 2, 3), seg(2, 0, 4, 0)]);
    }

    #[test]
    fn collinear_overlap_collapses_to_shared_edges() {
        let out = edges(&[seg(0, 0, 4, 0), seg(2, 0, 6, 0)]);
        assert_eq!(out, vec![seg(0, 0, 2, 0), seg(2, 0, 4, 0), seg(4, 0, 6, 0)]);
    }

    #[test]
    fn duplicate_segments_are_merged() {
        assert_eq!(edges(&[seg(0, 0, 1, 0), seg(1, 0, 0, 0)]), vec![seg(0, 0, 1, 0)]);
    }

    #[test]
    fn segment_passing_near_a_vertex_is_routed_through_it() {
        // The long edge passes half a cell below (5, 1), on the edge of its pixel.
        let out = edges(&[seg(0, 0, 10, 1), seg(5, 1, 5, 4)]);
        assert!(out.contains(&seg(0, 0, 5, 1)));
        assert!(out.contains(&seg(5, 1, 10, 1)));
        assert!(out.contains(&seg(5, 1, 5, 4)));
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn routes_start_and_end_at_segment_endpoints() {
        let noded = node(&[seg(0, 0, 10, 1), seg(5, 1, 5, 4)], NAIVE_SEGMENT_THRESHOLD).unwrap();
        let p = GridPoint::new;
        assert_eq!(noded.routes[0], vec![p(0, 0), p(5, 1), p(10, 1)]);
        assert_eq!(noded.routes[1], vec![p(5, 1), p(5, 4)]);
    }

    #[test]
    fn rounded_crossings_never_leave_crossing_edges() {
        // A fan of sloped segments whose crossings all round.
        let mut segments = Vec::new();
        for k in 0..12 {
            segments.push(seg(0, k * 3, 37, 40 - k * 2));
            segments.push(seg(k * 3 + 1, -2, 40 - k, 41));
        }
        let out = edges(&segments);
        for (i, e) in out.iter().enumerate() {
            for f in &out[i + 1..] {
                assert!(!segments_cross(e.a, e.b, f.a, f.b), "{e:?} crosses {f:?}");
                for v in [f.a, f.b] {
                    assert!(v == e.a || v == e.b || !on_segment(v, e.a, e.b), "{v} lies inside {e:?}");
                }
            }
        }
    }

    #[test]
    fn pixel_entry_agrees_with_corner_test() {
        let p = GridPoint::new;
        for h in [p(1, 0), p(2, 1), p(3, 1), p(5, 2), p(0, 1), p(4, 4)] {
            let (a, b) = (p(0, 0), p(7, 3));
            assert_eq!(pixel_entry(a, b, h).is_some(), touches_pixel(a, b, h), "pixel {h}");
        }
    }

    #[test]
    fn rtree_path_matches_naive_path() {
        let mut segments = Vec::new();
        for k in 0..10 {
            segments.push(seg(0, k * 2, 20, k * 2));
            segments.push(seg(k * 2 + 1, -1, k * 2 + 1, 21));
        }
        let naive = node(&segments, usize::MAX).unwrap().edges;
        let indexed = node(&segments, 0).unwrap().edges;
        assert_eq!(naive, indexed);
        // 10 horizontals split into 11 pieces, 10 verticals into 11 pieces.
        assert_eq!(naive.len(), 220);
    }
}
