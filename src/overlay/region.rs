use std::collections::BTreeSet;

use geo::{Area, Centroid, Intersects, MultiPolygon, Point};
use serde::Serialize;

use crate::types::{AreaId, CategoricalTier, Hazard, Probability};

/// One input polygon that attains its region's tier somewhere in the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Contribution {
    pub hazard: Hazard,
    pub probability: Probability,
    pub tier: CategoricalTier,
    pub area: AreaId,
}

/// A maximal connected region of one categorical tier.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalRegion {
    pub tier: CategoricalTier,
    /// Usually a single polygon; a region pinched at a vertex has one polygon
    /// per side of the pinch.  Holes permitted.
    pub geometry: MultiPolygon<f64>,
    pub provenance: BTreeSet<Contribution>,
}

impl CategoricalRegion {
    pub fn area(&self) -> f64 { self.geometry.unsigned_area() }

    pub fn centroid(&self) -> Option<Point<f64>> { self.geometry.centroid() }

    /// Hazards named in the provenance.
    pub fn hazards(&self) -> BTreeSet<Hazard> {
        self.provenance.iter().map(|c| c.hazard).collect()
    }
}

/// Tier of the categorical map at `point`.  Points on an edge shared by two
/// regions take the higher tier; points outside every region are `None`.
pub fn tier_at(regions: &[CategoricalRegion], point: Point<f64>) -> CategoricalTier {
    regions.iter()
        .filter(|r| r.geometry.intersects(&point))
        .map(|r| r.tier)
        .max()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    fn region(tier: CategoricalTier, x0: f64, x1: f64) -> CategoricalRegion {
        CategoricalRegion {
            tier,
            geometry: MultiPolygon(vec![polygon![(x: x0, y: 0.0), (x: x1, y: 0.0), (x: x1, y: 1.0), (x: x0, y: 1.0)]]),
            provenance: BTreeSet::new(),
        }
    }

    #[test]
    fn shared_edge_belongs_to_higher_tier() {
        let regions = [region(CategoricalTier::Mrgl, 0.0, 1.0), region(CategoricalTier::Enh, 1.0, 2.0)];
        assert_eq!(tier_at(&regions, Point::new(0.5, 0.5)), CategoricalTier::Mrgl);
        assert_eq!(tier_at(&regions, Point::new(1.0, 0.5)), CategoricalTier::Enh);
        assert_eq!(tier_at(&regions, Point::new(1.5, 0.5)), CategoricalTier::Enh);
        assert_eq!(tier_at(&regions, Point::new(5.0, 0.5)), CategoricalTier::None);
    }
}
