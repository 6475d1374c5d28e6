use std::cmp::Reverse;
use std::collections::BTreeSet;

use geo::{Coord, MultiPolygon, Rect};
use outlook_arrangement::{Arrangement, FaceId, Sample, OUTER_FACE};
use rstar::{RTree, RTreeObject, AABB};
use tracing::{debug, warn};

use crate::assign::TieredPolygon;
use crate::config::EngineConfig;
use crate::error::InternalError;
use crate::overlay::region::{CategoricalRegion, Contribution};
use crate::types::CategoricalTier;

/// Bounding box of one snap-rounded input polygon, in grid units.
#[derive(Debug, Clone)]
struct InputBox {
    idx: usize,
    bbox: Rect<f64>,
}

impl RTreeObject for InputBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// Per-face result of the coverage pass.
#[derive(Debug, Clone, Default)]
struct Cell {
    tier: CategoricalTier,
    /// Indices of the input polygons covering the cell.
    covering: Vec<usize>,
    sliver: bool,
}

/// `overlay_with` using the default tolerances.
pub fn overlay(polygons: &[TieredPolygon]) -> Result<Vec<CategoricalRegion>, InternalError> {
    overlay_with(&EngineConfig::default(), polygons)
}

/// Merge tier-tagged polygons of any hazards into maximal same-tier regions.
///
/// Every point covered by some input takes the maximum tier among the inputs
/// covering it.  Regions are returned sorted by tier (highest first), then by
/// centroid, and re-running on the same input gives identical output.
pub fn overlay_with(config: &EngineConfig, polygons: &[TieredPolygon]) -> Result<Vec<CategoricalRegion>, InternalError> {
    let inputs: Vec<&TieredPolygon> = polygons.iter().filter(|p| p.tier > CategoricalTier::None).collect();
    if inputs.is_empty() {
        return Ok(Vec::new());
    }

    let arrangement = Arrangement::build(inputs.iter().map(|p| &p.polygon), &config.arrangement())?;
    let rtree = RTree::bulk_load(
        (0..arrangement.num_inputs())
            .filter_map(|idx| arrangement.input_bbox(idx).map(|bbox| InputBox { idx, bbox }))
            .collect(),
    );

    let mut cells = vec![Cell::default(); arrangement.num_faces()];
    for face in arrangement.bounded_faces() {
        let cell = &mut cells[face.0];
        if arrangement.face_area(face) < config.area_epsilon {
            cell.sliver = true;
            continue;
        }
        let Some(p) = arrangement.face_sample(face) else {
            cell.sliver = true;
            continue;
        };
        cell.covering = covering(&arrangement, &rtree, p);
        cell.tier = cell.covering.iter().map(|&i| inputs[i].tier).max().unwrap_or_default();
    }

    let slivers = resolve_slivers(&arrangement, &mut cells);
    if slivers > 0 {
        warn!(slivers, "suppressed sliver faces below area epsilon");
    }

    let labels: Vec<Option<CategoricalTier>> = cells.iter()
        .enumerate()
        .map(|(f, cell)| (FaceId(f) != OUTER_FACE && cell.tier > CategoricalTier::None).then_some(cell.tier))
        .collect();

    let mut regions: Vec<CategoricalRegion> = arrangement.dissolve(&labels)?
        .into_iter()
        .map(|d| {
            let provenance: BTreeSet<Contribution> = d.faces.iter()
                .flat_map(|f| cells[f.0].covering.iter())
                .map(|&i| inputs[i])
                .filter(|p| p.tier == d.label)
                .map(|p| Contribution { hazard: p.hazard, probability: p.probability, tier: p.tier, area: p.area })
                .collect();
            CategoricalRegion { tier: d.label, geometry: MultiPolygon(d.polygons), provenance }
        })
        .collect();

    sort_canonical(&mut regions);
    debug!(
        inputs = inputs.len(),
        faces = arrangement.num_faces() - 1,
        regions = regions.len(),
        "overlay complete"
    );
    Ok(regions)
}

/// Indices of inputs containing the face sample `p`, ascending.
fn covering(arrangement: &Arrangement, rtree: &RTree<InputBox>, p: Sample) -> Vec<usize> {
    let c = p.as_coord();
    let env = AABB::from_point([c.x, c.y]);
    let mut out: Vec<usize> = rtree
        .locate_in_envelope_intersecting(&env)
        .map(|b| b.idx)
        .filter(|&i| arrangement.covers(i, p))
        .collect();
    out.sort_unstable();
    out
}

/// Give each sliver the highest tier among its edge-adjacent non-sliver
/// faces.  Slivers keep no coverage, so they add nothing to provenance.
fn resolve_slivers(arrangement: &Arrangement, cells: &mut [Cell]) -> usize {
    let slivers: Vec<FaceId> = arrangement.bounded_faces().filter(|f| cells[f.0].sliver).collect();
    for &face in &slivers {
        let tier = arrangement.adjacent_faces(face)
            .into_iter()
            .filter(|&g| g != OUTER_FACE && !cells[g.0].sliver)
            .map(|g| cells[g.0].tier)
            .max()
            .unwrap_or_default();
        cells[face.0].tier = tier;
    }
    slivers.len()
}

/// Highest tier first, then by centroid; ties fall back to the first vertex.
fn sort_canonical(regions: &mut [CategoricalRegion]) {
    let key = |r: &CategoricalRegion| {
        let c = r.centroid().map_or(Coord { x: f64::NAN, y: f64::NAN }, |p| p.0);
        let first = r.geometry.0.first()
            .and_then(|p| p.exterior().0.first().copied())
            .unwrap_or(Coord { x: f64::NAN, y: f64::NAN });
        (Reverse(r.tier), c, first)
    };
    regions.sort_by(|a, b| {
        let (ta, ca, fa) = key(a);
        let (tb, cb, fb) = key(b);
        ta.cmp(&tb)
            .then_with(|| ca.x.total_cmp(&cb.x))
            .then_with(|| ca.y.total_cmp(&cb.y))
            .then_with(|| fa.x.total_cmp(&fb.x))
            .then_with(|| fa.y.total_cmp(&fb.y))
    });
}

#[cfg(test)]
mod tests {
    use geo::{polygon, Area, Point, Polygon};

    use super::*;
    use crate::overlay::tier_at;
    use crate::types::{AreaId, Hazard, Probability};

    fn tiered(area: u64, hazard: Hazard, literal: &str, polygon: Polygon<f64>) -> TieredPolygon {
        let probability: Probability = literal.parse().unwrap();
        TieredPolygon {
            area: AreaId(area),
            hazard,
            probability,
            tier: crate::risk::classify(hazard, probability).unwrap(),
            polygon,
        }
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]
    }

    #[test]
    fn empty_input_gives_no_regions() {
        assert!(overlay(&[]).unwrap().is_empty());
    }

    #[test]
    fn higher_tier_overrides_overlap() {
        let regions = overlay(&[
            tiered(1, Hazard::Wind, "5%", rect(0.0, 0.0, 4.0, 4.0)),
            tiered(2, Hazard::Hail, "15%", rect(2.0, 0.0, 6.0, 4.0)),
        ])
        .unwrap();

        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].tier, CategoricalTier::Slgt);
        assert!((regions[0].area() - 16.0).abs() < 1e-6);
        assert_eq!(regions[1].tier, CategoricalTier::Mrgl);
        assert!((regions[1].area() - 8.0).abs() < 1e-6);

        // Wind only attains MRGL outside the hail area.
        assert_eq!(regions[1].hazards(), BTreeSet::from([Hazard::Wind]));
        assert_eq!(regions[0].hazards(), BTreeSet::from([Hazard::Hail]));
        assert_eq!(tier_at(&regions, Point::new(2.0, 2.0)), CategoricalTier::Slgt);
    }

    #[test]
    fn sliver_takes_neighbouring_tier() {
        let mut cells = vec![Cell::default(); 3];
        let config = EngineConfig { area_epsilon: 1e-3, ..EngineConfig::default() };
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(1.0, 0.0, 1.0001, 1.0);
        let arrangement = Arrangement::build([&a, &b], &config.arrangement()).unwrap();
        assert_eq!(arrangement.num_faces(), 3);
        for f in arrangement.bounded_faces() {
            cells[f.0].sliver = arrangement.face_area(f) < config.area_epsilon;
            if !cells[f.0].sliver {
                cells[f.0].tier = CategoricalTier::Enh;
            }
        }
        assert_eq!(resolve_slivers(&arrangement, &mut cells), 1);
        assert!(cells.iter().skip(1).all(|c| c.tier == CategoricalTier::Enh));
    }

    #[test]
    fn rerun_is_bit_identical() {
        let input = [
            tiered(1, Hazard::Tornado, "2%", rect(0.0, 0.0, 10.0, 10.0)),
            tiered(2, Hazard::Wind, "15%", rect(5.0, 5.0, 15.0, 15.0)),
            tiered(3, Hazard::Hail, "5%", rect(-3.0, 2.0, 1.0, 3.0)),
        ];
        let a = overlay(&input).unwrap();
        let b = overlay(&input).unwrap();
        assert_eq!(a, b);
        let total: f64 = a.iter().map(|r| r.geometry.unsigned_area()).sum();
        assert!((total - (100.0 + 100.0 - 25.0 + 3.0)).abs() < 1e-6);
    }
}
