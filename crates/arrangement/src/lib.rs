//! Planar arrangement of polygon boundaries.
//!
//! Input rings are snapped to a uniform grid, noded against each other, and
//! linked into a half-edge structure (`Dcel`).  Every bounded face of the
//! result is a cell of constant coverage with respect to the input polygons.
//! `Arrangement::dissolve` merges labelled faces back into polygons.

pub mod arrangement;
pub mod dcel;
pub mod dissolve;
pub mod error;
pub mod noding;
pub mod snap;

pub use arrangement::{Arrangement, ArrangementConfig};
pub use dcel::{Dcel, FaceId, HalfEdgeId, VertexId, OUTER_FACE};
pub use dissolve::Dissolved;
pub use error::ArrangementError;
pub use noding::NAIVE_SEGMENT_THRESHOLD;
pub use snap::{Grid, GridPoint, Sample};
