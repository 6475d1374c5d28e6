use std::collections::BTreeSet;

use ahash::AHashMap;
use geo::{Coord, LineString, Point, Polygon, Rect};
use rstar::{RTree, RTreeObject, AABB};
use tracing::debug;

use crate::dcel::{Dcel, FaceId, HalfEdgeId, VertexId, OUTER_FACE};
use crate::error::ArrangementError;
use crate::noding::{self, Segment, NAIVE_SEGMENT_THRESHOLD};
use crate::snap::{crosses_ray, locate_in_ring, locate_sample, orient, Grid, GridPoint, RingPosition, Sample};

/// Build parameters for an `Arrangement`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArrangementConfig {
    /// Snapping grid cell size, in world units.
    pub snap_epsilon: f64,
    /// Segment count below which noding uses brute-force pair testing.
    pub naive_segment_threshold: usize,
}

impl Default for ArrangementConfig {
    fn default() -> Self {
        Self { snap_epsilon: 1e-7, naive_segment_threshold: NAIVE_SEGMENT_THRESHOLD }
    }
}

/// A bounding box in an R-tree, associated with a bounded face.
#[derive(Debug, Clone)]
struct FaceBox {
    face: FaceId,
    bbox: Rect<f64>,
}

impl RTreeObject for FaceBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// The planar arrangement induced by a set of polygon boundaries.
///
/// Every maximal connected region of the plane not crossed by any input
/// boundary is one bounded face; the unbounded remainder is `OUTER_FACE`.
/// Within a face, membership in every input polygon is constant.
#[derive(Clone, Debug)]
pub struct Arrangement {
    grid: Grid,
    dcel: Dcel<GridPoint>,
    /// Snap-rounded boundary edges of each input polygon, holes included.
    /// Kept as a multiset: a ring that folds onto itself lists an edge twice.
    inputs: Vec<Vec<Segment>>,
    /// Largest power of two by which face samples may subdivide a cell.
    sample_shift: u32,
}

/// Cap on `sample_shift`.
const MAX_SAMPLE_SHIFT: u32 = 20;

impl Arrangement {
    /// Build the arrangement of all rings (exteriors and holes) of `polygons`.
    pub fn build<'a>(
        polygons: impl IntoIterator<Item = &'a Polygon<f64>>,
        config: &ArrangementConfig,
    ) -> Result<Self, ArrangementError> {
        let grid = Grid::new(config.snap_epsilon)?;

        let mut segments = Vec::new();
        let mut owner = Vec::new();
        let mut num_inputs = 0;
        for (input, polygon) in polygons.into_iter().enumerate() {
            num_inputs = input + 1;
            for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
                let ring = grid.snap_ring(ring)?;
                if ring.len() < 3 { continue; }
                for i in 0..ring.len() {
                    segments.push(Segment::new(ring[i], ring[(i + 1) % ring.len()]));
                    owner.push(input);
                }
            }
        }

        let noded = noding::node(&segments, config.naive_segment_threshold)?;
        debug!(segments = segments.len(), edges = noded.edges.len(), "noded arrangement segments");

        let mut inputs: Vec<Vec<Segment>> = vec![Vec::new(); num_inputs];
        for (route, &input) in noded.routes.iter().zip(&owner) {
            inputs[input].extend(route.windows(2).map(|w| Segment::new(w[0], w[1])));
        }

        let extent = noded.edges.iter()
            .flat_map(|e| [e.a, e.b])
            .map(|p| p.x.unsigned_abs().max(p.y.unsigned_abs()))
            .max()
            .unwrap_or(0);
        let bits = u64::BITS - extent.leading_zeros();
        let sample_shift = 60u32.saturating_sub(bits).clamp(1, MAX_SAMPLE_SHIFT);

        let dcel = link_faces(&noded.edges)?;
        debug!(
            vertices = dcel.num_vertices(),
            faces = dcel.num_bounded_faces(),
            "built arrangement"
        );

        Ok(Self { grid, dcel, inputs, sample_shift })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[inline] pub fn grid(&self) -> &Grid { &self.grid }

    #[inline] pub fn dcel(&self) -> &Dcel<GridPoint> { &self.dcel }

    /// Number of faces including `OUTER_FACE`.
    #[inline] pub fn num_faces(&self) -> usize { self.dcel.num_faces() }

    /// Number of input polygons, in the order given to `build`.
    #[inline] pub fn num_inputs(&self) -> usize { self.inputs.len() }

    /// Iterate over bounded faces.
    pub fn bounded_faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        (1..self.dcel.num_faces()).map(FaceId)
    }

    // -----------------------------------------------------------------------
    // Face geometry
    // -----------------------------------------------------------------------

    /// Vertices of the cycle through `start`, in traversal order.
    pub(crate) fn cycle_points(&self, start: HalfEdgeId) -> Vec<GridPoint> {
        self.dcel.face_cycle(start).map(|he| *self.dcel.origin_coords(he)).collect()
    }

    /// Outer ring and hole rings of a bounded face, in grid units.
    pub fn face_rings(&self, face: FaceId) -> (Vec<GridPoint>, Vec<Vec<GridPoint>>) {
        let record = self.dcel.face(face);
        let outer = record.outer.map(|he| self.cycle_points(he)).unwrap_or_default();
        let holes = record.inner.iter().map(|&he| self.cycle_points(he)).collect();
        (outer, holes)
    }

    /// Area of a bounded face in world units (holes excluded).
    pub fn face_area(&self, face: FaceId) -> f64 {
        let record = self.dcel.face(face);
        let Some(outer) = record.outer else { return f64::INFINITY };
        let area2 = self.dcel.cycle_area2(outer)
            + record.inner.iter().map(|&he| self.dcel.cycle_area2(he)).sum::<i128>();
        area2 as f64 / 2.0 * self.grid.cell_area()
    }

    /// Face geometry in world coordinates.
    pub fn face_polygon(&self, face: FaceId) -> Polygon<f64> {
        let (outer, holes) = self.face_rings(face);
        rings_to_polygon(&outer, &holes, |p| self.grid.coord(p))
    }

    /// A point strictly inside the face, off every arrangement edge.
    ///
    /// Tries the centroid of each convex corner's triangle, then points ever
    /// closer to each convex corner inside its angle.  Near enough to the
    /// corner the point belongs to this face, since no other edge leaves the
    /// corner between its two boundary edges.  Every candidate is confirmed
    /// with exact ring tests.
    pub fn face_sample(&self, face: FaceId) -> Option<Sample> {
        let (outer, holes) = self.face_rings(face);
        let n = outer.len();
        let corners: Vec<(GridPoint, GridPoint, GridPoint)> = (0..n)
            .map(|i| (outer[(i + n - 1) % n], outer[i], outer[(i + 1) % n]))
            .filter(|&(u, v, w)| orient(u, v, w) > 0)
            .collect();

        let centroids = corners.iter().map(|&(u, v, w)| Sample {
            x: u.x as i128 + v.x as i128 + w.x as i128,
            y: u.y as i128 + v.y as i128 + w.y as i128,
            scale: 3,
        });
        let near_corners = (1..=self.sample_shift).flat_map(|shift| {
            let k = 1i128 << shift;
            corners.iter().map(move |&(u, v, w)| Sample {
                x: k * v.x as i128 + (u.x as i128 - v.x as i128) + (w.x as i128 - v.x as i128),
                y: k * v.y as i128 + (u.y as i128 - v.y as i128) + (w.y as i128 - v.y as i128),
                scale: k,
            })
        });

        centroids.chain(near_corners).find(|&p| {
            locate_sample(p, &outer) == RingPosition::Inside
                && holes.iter().all(|h| locate_sample(p, h) == RingPosition::Outside)
        })
    }

    /// `face_sample` in grid units.
    pub fn grid_interior_point(&self, face: FaceId) -> Option<Coord<f64>> {
        self.face_sample(face).map(Sample::as_coord)
    }

    /// `grid_interior_point` in world coordinates.
    pub fn interior_point(&self, face: FaceId) -> Option<Point<f64>> {
        let p = self.grid_interior_point(face)?;
        let eps = self.grid.epsilon();
        Some(Point::new(p.x * eps, p.y * eps))
    }

    /// Bounding box of an input's snap-rounded boundary, in grid units.
    pub fn input_bbox(&self, input: usize) -> Option<Rect<f64>> {
        let points: Vec<GridPoint> = self.inputs[input].iter().flat_map(|s| [s.a, s.b]).collect();
        ring_bbox(&points)
    }

    /// True if `p` is inside input polygon `input` after snap rounding.
    /// `p` must not lie on an arrangement edge, which holds for face samples.
    pub fn covers(&self, input: usize, p: Sample) -> bool {
        self.inputs[input].iter().filter(|s| crosses_ray(p, s.a, s.b)).count() % 2 == 1
    }

    /// Faces sharing at least one edge with `face` (never `face` itself).
    pub fn adjacent_faces(&self, face: FaceId) -> BTreeSet<FaceId> {
        let record = self.dcel.face(face);
        record.outer.iter().chain(record.inner.iter())
            .flat_map(|&start| self.dcel.face_cycle(start))
            .map(|he| self.dcel.half_edge(self.dcel.half_edge(he).twin).face)
            .filter(|&f| f != face)
            .collect()
    }
}

/// Convert grid rings to a closed `Polygon` using `map` for each vertex.
pub(crate) fn rings_to_polygon(
    outer: &[GridPoint],
    holes: &[Vec<GridPoint>],
    map: impl Fn(GridPoint) -> Coord<f64>,
) -> Polygon<f64> {
    let close = |ring: &[GridPoint]| -> LineString<f64> {
        let mut coords: Vec<Coord<f64>> = ring.iter().map(|&p| map(p)).collect();
        if let Some(&first) = coords.first() {
            coords.push(first);
        }
        LineString(coords)
    };
    Polygon::new(close(outer), holes.iter().map(|h| close(h)).collect())
}

/// Build the DCEL for a set of noded edges and assign every cycle to a face.
fn link_faces(edges: &[Segment]) -> Result<Dcel<GridPoint>, ArrangementError> {
    let mut dcel: Dcel<GridPoint> = Dcel::new();

    let points: BTreeSet<GridPoint> = edges.iter().flat_map(|e| [e.a, e.b]).collect();
    // Vertex ids follow sorted point order; the map is only used for lookup.
    let ids: AHashMap<GridPoint, VertexId> = points.into_iter().map(|p| (p, dcel.add_vertex(p))).collect();
    for edge in edges {
        dcel.add_edge(ids[&edge.a], ids[&edge.b]);
    }
    dcel.link_by_angle();

    // Split cycles into bounded face boundaries (CCW) and component outlines (CW).
    let mut visited = vec![false; dcel.num_half_edges()];
    let mut bounded = Vec::new();
    let mut outlines = Vec::new();
    for i in 0..dcel.num_half_edges() {
        if visited[i] { continue; }
        let start = HalfEdgeId(i);
        for he in dcel.face_cycle(start) {
            visited[he.0] = true;
        }
        if dcel.cycle_area2(start) > 0 {
            bounded.push(start);
        } else {
            outlines.push(start);
        }
    }

    for start in bounded {
        let face = dcel.add_face(start);
        dcel.set_face(start, face);
    }

    // Attach each component outline to the innermost bounded face around it.
    let rings: Vec<Vec<GridPoint>> = (1..dcel.num_faces())
        .map(|f| {
            dcel.face(FaceId(f)).outer
                .map(|he| dcel.face_cycle(he).map(|e| *dcel.origin_coords(e)).collect())
                .unwrap_or_default()
        })
        .collect();
    let areas: Vec<i128> = (1..dcel.num_faces())
        .map(|f| dcel.face(FaceId(f)).outer.map_or(0, |he| dcel.cycle_area2(he)))
        .collect();

    let rtree = RTree::bulk_load(
        rings.iter().enumerate()
            .filter_map(|(i, ring)| ring_bbox(ring).map(|bbox| FaceBox { face: FaceId(i + 1), bbox }))
            .collect(),
    );

    for start in outlines {
        let p = *dcel.origin_coords(start);
        let env = AABB::from_corners([p.x as f64, p.y as f64], [p.x as f64, p.y as f64]);
        let container = rtree
            .locate_in_envelope_intersecting(&env)
            .map(|b| b.face)
            .filter(|f| locate_in_ring(p, &rings[f.0 - 1]) == RingPosition::Inside)
            .min_by_key(|f| (areas[f.0 - 1], *f))
            .unwrap_or(OUTER_FACE);

        dcel.set_face(start, container);
        dcel.face_mut(container).inner.push(start);
    }

    for (i, he) in dcel.half_edges.iter().enumerate() {
        if dcel.half_edges[he.next.0].prev != HalfEdgeId(i) {
            return Err(ArrangementError::Topology(format!("broken next/prev link at {}", HalfEdgeId(i))));
        }
    }

    Ok(dcel)
}

/// Bounding box of a grid ring, in grid units.
fn ring_bbox(ring: &[GridPoint]) -> Option<Rect<f64>> {
    let first = ring.first()?;
    let (mut min, mut max) = (*first, *first);
    for p in ring {
        min = GridPoint::new(min.x.min(p.x), min.y.min(p.y));
        max = GridPoint::new(max.x.max(p.x), max.y.max(p.y));
    }
    Some(Rect::new(min.as_coord(), max.as_coord()))
}
