//! Overlay of tier-tagged polygons from every hazard into one categorical map.

mod engine;
mod region;

pub use engine::{overlay, overlay_with};
pub use region::{tier_at, CategoricalRegion, Contribution};
