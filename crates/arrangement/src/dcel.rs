//! Half-edge (DCEL) storage for the arrangement.
//!
//! Each undirected edge is a twin pair of directed half-edges; a half-edge
//! knows its origin, its twin, its successor and predecessor around the
//! face on its left, and that face.
//!
//! Edges are inserted before any face is known.  `link_by_angle` derives the
//! successor links from the angular order of edges at each vertex, after
//! which every `next` cycle bounds exactly one face.  Faces are numbered
//! from 1; `FaceId(0)` is the unbounded face.

use std::cmp::Ordering;
use std::fmt;

use smallvec::SmallVec;

use crate::snap::GridPoint;

macro_rules! idx {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub usize);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

idx!(VertexId);
idx!(HalfEdgeId);
idx!(FaceId);

/// The unbounded face.
pub const OUTER_FACE: FaceId = FaceId(0);

/// A directed half-edge.
#[derive(Clone, Copy, Debug)]
pub struct HalfEdge {
    /// Vertex this half-edge leaves from.
    pub origin: VertexId,
    /// Same edge, opposite direction.
    pub twin: HalfEdgeId,
    /// Successor around `face`.
    pub next: HalfEdgeId,
    pub prev: HalfEdgeId,
    /// Face on the left.
    pub face: FaceId,
}

/// Boundary cycles of one face.
///
/// A bounded face has one CCW outer cycle.  Any face, the outer face
/// included, also owns the CW outlines of components nested directly in it.
#[derive(Clone, Debug, Default)]
pub struct Face {
    /// A half-edge on the outer cycle; `None` for `OUTER_FACE`.
    pub outer: Option<HalfEdgeId>,
    /// One half-edge per nested component outline.
    pub inner: SmallVec<[HalfEdgeId; 2]>,
}

/// Half-edge structure over vertices carrying a point of type `C`.
///
/// `OUTER_FACE` exists from construction.
#[derive(Clone, Debug)]
pub struct Dcel<C> {
    pub(crate) points: Vec<C>,
    /// Some half-edge leaving each vertex, once it has one.
    pub(crate) leaving: Vec<Option<HalfEdgeId>>,
    pub(crate) half_edges: Vec<HalfEdge>,
    pub(crate) faces: Vec<Face>,
}

impl<C> Default for Dcel<C> {
    fn default() -> Self { Self::new() }
}

impl<C> Dcel<C> {
    pub fn new() -> Self {
        Self { points: Vec::new(), leaving: Vec::new(), half_edges: Vec::new(), faces: vec![Face::default()] }
    }

    #[inline] pub fn num_vertices(&self) -> usize { self.points.len() }

    #[inline] pub fn num_half_edges(&self) -> usize { self.half_edges.len() }

    /// Undirected edge count.
    #[inline] pub fn num_edges(&self) -> usize { self.half_edges.len() / 2 }

    /// Face count, `OUTER_FACE` included.
    #[inline] pub fn num_faces(&self) -> usize { self.faces.len() }

    #[inline] pub fn num_bounded_faces(&self) -> usize { self.faces.len().saturating_sub(1) }

    #[inline] pub fn point(&self, v: VertexId) -> &C { &self.points[v.0] }

    #[inline] pub fn leaving(&self, v: VertexId) -> Option<HalfEdgeId> { self.leaving[v.0] }

    #[inline] pub fn half_edge(&self, he: HalfEdgeId) -> &HalfEdge { &self.half_edges[he.0] }

    #[inline] pub fn face(&self, f: FaceId) -> &Face { &self.faces[f.0] }

    #[inline] pub fn face_mut(&mut self, f: FaceId) -> &mut Face { &mut self.faces[f.0] }

    /// Point at the tail of `he`.
    #[inline]
    pub fn origin_coords(&self, he: HalfEdgeId) -> &C { self.point(self.half_edges[he.0].origin) }

    /// Vertex at the head of `he`.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId) -> VertexId { self.half_edges[self.half_edges[he.0].twin.0].origin }

    pub fn add_vertex(&mut self, point: C) -> VertexId {
        self.points.push(point);
        self.leaving.push(None);
        VertexId(self.points.len() - 1)
    }

    /// New bounded face with `outer` on its outer cycle.
    pub fn add_face(&mut self, outer: HalfEdgeId) -> FaceId {
        self.faces.push(Face { outer: Some(outer), inner: SmallVec::new() });
        FaceId(self.faces.len() - 1)
    }

    /// Add the twin pair `u -> v`, `v -> u`, returned in that order.
    ///
    /// Both halves start on `OUTER_FACE` and loop onto themselves until
    /// `link_by_angle` and `set_face` run.
    pub fn add_edge(&mut self, u: VertexId, v: VertexId) -> (HalfEdgeId, HalfEdgeId) {
        let (uv, vu) = (HalfEdgeId(self.half_edges.len()), HalfEdgeId(self.half_edges.len() + 1));
        for (he, origin, twin) in [(uv, u, vu), (vu, v, uv)] {
            self.half_edges.push(HalfEdge { origin, twin, next: he, prev: he, face: OUTER_FACE });
            self.leaving[origin.0].get_or_insert(he);
        }
        (uv, vu)
    }

    /// Link `he -> next`.
    pub fn set_next(&mut self, he: HalfEdgeId, next: HalfEdgeId) {
        self.half_edges[he.0].next = next;
        self.half_edges[next.0].prev = he;
    }

    /// Put every half-edge of the cycle through `start` on `face`.
    pub fn set_face(&mut self, start: HalfEdgeId, face: FaceId) {
        let cycle: Vec<HalfEdgeId> = self.face_cycle(start).collect();
        for he in cycle {
            self.half_edges[he.0].face = face;
        }
    }

    /// Half-edges of the cycle through `start`, following `next`.
    pub fn face_cycle(&self, start: HalfEdgeId) -> Walk<'_, C> {
        Walk { dcel: self, step: Step::Next, start, current: Some(start) }
    }

    /// Half-edges leaving the origin of `start`, following `twin.next`.
    pub fn vertex_star(&self, start: HalfEdgeId) -> Walk<'_, C> {
        Walk { dcel: self, step: Step::TwinNext, start, current: Some(start) }
    }
}

impl Dcel<GridPoint> {
    /// Derive every `next`/`prev` link from the angular order of the edges
    /// around each vertex.
    ///
    /// Outgoing half-edges at a vertex are sorted CCW by direction; the
    /// half-edge arriving along `twin(o_i)` continues with `o_{i-1}`, the
    /// outgoing edge immediately clockwise of it.  This keeps every face on
    /// the left of its boundary half-edges.
    pub fn link_by_angle(&mut self) {
        let mut stars: Vec<SmallVec<[HalfEdgeId; 4]>> = vec![SmallVec::new(); self.points.len()];
        for (i, he) in self.half_edges.iter().enumerate() {
            stars[he.origin.0].push(HalfEdgeId(i));
        }

        for mut star in stars {
            star.sort_by(|&a, &b| compare_direction(self.direction(a), self.direction(b)));
            let Some(&last) = star.last() else { continue };
            let mut clockwise = last;
            for &out in &star {
                let arriving = self.half_edges[out.0].twin;
                self.set_next(arriving, clockwise);
                clockwise = out;
            }
        }
    }

    /// Direction vector of `he` in grid units.
    fn direction(&self, he: HalfEdgeId) -> (i64, i64) {
        let a = self.origin_coords(he);
        let b = self.point(self.dest(he));
        (b.x - a.x, b.y - a.y)
    }

    /// Twice the signed area enclosed by the cycle containing `start`
    /// (positive for CCW cycles).  Exact in integer arithmetic.
    pub fn cycle_area2(&self, start: HalfEdgeId) -> i128 {
        self.face_cycle(start)
            .map(|he| {
                let a = self.origin_coords(he);
                let b = self.point(self.dest(he));
                a.x as i128 * b.y as i128 - b.x as i128 * a.y as i128
            })
            .sum()
    }
}

/// Order two non-zero direction vectors by polar angle in `[0, 2π)`, exactly.
/// Parallel vectors with the same direction compare by length.
pub(crate) fn compare_direction(a: (i64, i64), b: (i64, i64)) -> Ordering {
    fn half(d: (i64, i64)) -> u8 {
        if d.1 > 0 || (d.1 == 0 && d.0 > 0) { 0 } else { 1 }
    }

    half(a).cmp(&half(b)).then_with(|| {
        let cross = a.0 as i128 * b.1 as i128 - a.1 as i128 * b.0 as i128;
        match cross.cmp(&0) {
            Ordering::Greater => Ordering::Less,
            Ordering::Less => Ordering::Greater,
            Ordering::Equal => {
                let la = a.0 as i128 * a.0 as i128 + a.1 as i128 * a.1 as i128;
                let lb = b.0 as i128 * b.0 as i128 + b.1 as i128 * b.1 as i128;
                la.cmp(&lb)
            }
        }
    })
}

#[derive(Clone, Copy, Debug)]
enum Step {
    Next,
    TwinNext,
}

/// Walk around a face cycle or a vertex star, stopping before `start` recurs.
pub struct Walk<'a, C> {
    dcel: &'a Dcel<C>,
    step: Step,
    start: HalfEdgeId,
    current: Option<HalfEdgeId>,
}

impl<C> Iterator for Walk<'_, C> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<HalfEdgeId> {
        let he = self.current?;
        let edges = &self.dcel.half_edges;
        let succ = match self.step {
            Step::Next => edges[he.0].next,
            Step::TwinNext => edges[edges[he.0].twin.0].next,
        };
        self.current = (succ != self.start).then_some(succ);
        Some(he)
    }
}
