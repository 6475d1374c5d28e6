//! Dissolve: merge edge-adjacent faces carrying the same label into maximal
//! regions and trace the region outlines back into polygons.

use std::collections::BTreeMap;

use geo::Polygon;

use crate::arrangement::{rings_to_polygon, Arrangement};
use crate::dcel::{FaceId, HalfEdgeId};
use crate::error::ArrangementError;
use crate::snap::{locate_in_ring, on_segment, orient, ring_area2, GridPoint, RingPosition};

/// A maximal set of edge-connected faces sharing one label.
#[derive(Clone, Debug)]
pub struct Dissolved<L> {
    pub label: L,
    /// Member faces, sorted.
    pub faces: Vec<FaceId>,
    /// Region geometry: one polygon per outer shell, holes attached.
    /// Rings start at their smallest vertex; shells are CCW, holes CW.
    pub polygons: Vec<Polygon<f64>>,
}

/// Minimal union-find over face indices.
struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(n: usize) -> Self { Self { parent: (0..n).collect() } }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Smaller index becomes the root so region ids are deterministic.
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}

impl Arrangement {
    /// Merge faces with equal labels across shared edges.
    ///
    /// `labels` is indexed by face id and must have one entry per face,
    /// `OUTER_FACE` included (normally `None`).  Unlabelled faces are not
    /// part of any region.  Faces that meet only at a vertex stay in separate
    /// regions.  Output is ordered by the smallest member face.
    pub fn dissolve<L: Copy + Eq>(&self, labels: &[Option<L>]) -> Result<Vec<Dissolved<L>>, ArrangementError> {
        let dcel = self.dcel();
        if labels.len() != dcel.num_faces() {
            return Err(ArrangementError::LabelCount { expected: dcel.num_faces(), actual: labels.len() });
        }

        let face_of = |he: HalfEdgeId| dcel.half_edge(he).face;
        let twin_of = |he: HalfEdgeId| dcel.half_edge(he).twin;

        let mut sets = DisjointSets::new(dcel.num_faces());
        for i in (0..dcel.num_half_edges()).step_by(2) {
            let (f, g) = (face_of(HalfEdgeId(i)), face_of(HalfEdgeId(i + 1)));
            if f != g && labels[f.0].is_some() && labels[f.0] == labels[g.0] {
                sets.union(f.0, g.0);
            }
        }

        let region: Vec<Option<usize>> = (0..dcel.num_faces())
            .map(|f| labels[f].map(|_| sets.find(f)))
            .collect();
        let is_boundary = |he: HalfEdgeId| {
            let r = region[face_of(he).0];
            r.is_some() && r != region[face_of(twin_of(he)).0]
        };

        // Trace every boundary cycle, keeping the region on the left.
        let mut rings: BTreeMap<usize, Vec<Vec<GridPoint>>> = BTreeMap::new();
        let mut visited = vec![false; dcel.num_half_edges()];
        for i in 0..dcel.num_half_edges() {
            let start = HalfEdgeId(i);
            if visited[i] || !is_boundary(start) { continue; }

            let mut ring = Vec::new();
            let mut current = start;
            loop {
                visited[current.0] = true;
                ring.push(*dcel.origin_coords(current));

                // Rotate around the head vertex through interior edges.
                let mut h = dcel.half_edge(current).next;
                let mut guard = 0;
                while !is_boundary(h) {
                    h = dcel.half_edge(twin_of(h)).next;
                    guard += 1;
                    if guard > dcel.num_half_edges() {
                        return Err(ArrangementError::Topology(format!("no boundary successor for {current}")));
                    }
                }

                if h == start { break; }
                if visited[h.0] {
                    return Err(ArrangementError::Topology(format!("boundary walk re-entered {h}")));
                }
                current = h;
            }

            if let Some(r) = region[face_of(start).0] {
                rings.entry(r).or_default().push(ring);
            }
        }

        let mut members: BTreeMap<usize, Vec<FaceId>> = BTreeMap::new();
        for (f, r) in region.iter().enumerate() {
            if let Some(r) = r {
                members.entry(*r).or_default().push(FaceId(f));
            }
        }

        let mut out = Vec::with_capacity(members.len());
        for (root, faces) in members {
            let Some(label) = labels[root] else { continue };
            let polygons = assemble(rings.remove(&root).unwrap_or_default())?
                .into_iter()
                .map(|(shell, holes)| rings_to_polygon(&shell, &holes, |p| self.grid().coord(p)))
                .collect();
            out.push(Dissolved { label, faces, polygons });
        }
        Ok(out)
    }
}

/// Remove vertices lying strictly between their neighbours on a straight line.
pub(crate) fn simplify(ring: Vec<GridPoint>) -> Vec<GridPoint> {
    let n = ring.len();
    if n < 3 { return ring; }
    (0..n)
        .filter(|&i| {
            let prev = ring[(i + n - 1) % n];
            let next = ring[(i + 1) % n];
            let cur = ring[i];
            !(orient(prev, cur, next) == 0 && cur != prev && cur != next && on_segment(cur, prev, next))
        })
        .map(|i| ring[i])
        .collect()
}

/// Rotate a ring so it starts at its smallest vertex.
pub(crate) fn canonical_start(mut ring: Vec<GridPoint>) -> Vec<GridPoint> {
    if let Some(pos) = ring.iter().enumerate().min_by_key(|(_, p)| **p).map(|(i, _)| i) {
        ring.rotate_left(pos);
    }
    ring
}

/// Group traced rings into shells with their holes.
fn assemble(rings: Vec<Vec<GridPoint>>) -> Result<Vec<(Vec<GridPoint>, Vec<Vec<GridPoint>>)>, ArrangementError> {
    let mut shells: Vec<(Vec<GridPoint>, i128)> = Vec::new();
    let mut holes: Vec<Vec<GridPoint>> = Vec::new();
    for ring in rings {
        let ring = canonical_start(simplify(ring));
        if ring.len() < 3 { continue; }
        match ring_area2(&ring) {
            a if a > 0 => shells.push((ring, a)),
            a if a < 0 => holes.push(ring),
            _ => {}
        }
    }
    shells.sort();

    let mut assigned: Vec<Vec<Vec<GridPoint>>> = vec![Vec::new(); shells.len()];
    for hole in holes {
        let owner = shells.iter().enumerate()
            .filter(|(_, (shell, _))| hole_inside(&hole, shell))
            .min_by_key(|(i, (_, area))| (*area, *i))
            .map(|(i, _)| i)
            .ok_or_else(|| ArrangementError::Topology(format!("hole starting at {} has no shell", hole[0])))?;
        assigned[owner].push(hole);
    }

    Ok(shells.into_iter()
        .zip(assigned)
        .map(|((shell, _), mut holes)| {
            holes.sort();
            (shell, holes)
        })
        .collect())
}

/// True if `hole` lies inside `shell`.  The rings may touch at vertices but
/// never cross, so the first hole vertex or edge midpoint off the shell
/// boundary decides.
fn hole_inside(hole: &[GridPoint], shell: &[GridPoint]) -> bool {
    for &p in hole {
        match locate_in_ring(p, shell) {
            RingPosition::Inside => return true,
            RingPosition::Outside => return false,
            RingPosition::OnBoundary => {}
        }
    }

    // Every vertex touches the shell: test edge midpoints at doubled scale.
    let doubled: Vec<GridPoint> = shell.iter().map(|p| GridPoint::new(p.x * 2, p.y * 2)).collect();
    let n = hole.len();
    for i in 0..n {
        let (a, b) = (hole[i], hole[(i + 1) % n]);
        match locate_in_ring(GridPoint::new(a.x + b.x, a.y + b.y), &doubled) {
            RingPosition::Inside => return true,
            RingPosition::Outside => return false,
            RingPosition::OnBoundary => {}
        }
    }
    false
}
