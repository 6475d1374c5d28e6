//! Tier assignment: label every area of a validated hazard set with its
//! categorical tier.

use geo::Polygon;
use tracing::debug;

use crate::error::InternalError;
use crate::nesting::predicates::Predicates;
use crate::nesting::HazardRiskSet;
use crate::types::{AreaId, CategoricalTier, Hazard, Probability};

/// A risk area boundary tagged with its categorical tier.
#[derive(Debug, Clone, PartialEq)]
pub struct TieredPolygon {
    pub area: AreaId,
    pub hazard: Hazard,
    pub probability: Probability,
    pub tier: CategoricalTier,
    pub polygon: Polygon<f64>,
}

/// Classify every area of `set`.
///
/// The set is expected to be nested already.  Overlapping areas of equal rank,
/// or crossing areas of different rank, mean validation was bypassed and fail
/// with `InternalError::InvariantViolation`.
pub fn assign(set: &HazardRiskSet) -> Result<Vec<TieredPolygon>, InternalError> {
    let preds = Predicates::new(set.config());
    let areas = set.areas();
    let snapped: Vec<Polygon<f64>> = areas.iter().map(|a| preds.snap(a.boundary())).collect();

    for i in 0..areas.len() {
        for j in (i + 1)..areas.len() {
            if !preds.overlaps(&snapped[i], &snapped[j]) {
                continue;
            }
            let (a, b) = (&areas[i], &areas[j]);
            let nested = match a.rank().cmp(&b.rank()) {
                std::cmp::Ordering::Equal => false,
                std::cmp::Ordering::Less => preds.contains(&snapped[i], &snapped[j]),
                std::cmp::Ordering::Greater => preds.contains(&snapped[j], &snapped[i]),
            };
            if !nested {
                return Err(InternalError::InvariantViolation(format!(
                    "{} areas {} ({}) and {} ({}) are not nested",
                    set.hazard(), a.id(), a.probability(), b.id(), b.probability(),
                )));
            }
        }
    }

    let tiered: Vec<TieredPolygon> = areas.iter()
        .map(|a| TieredPolygon {
            area: a.id(),
            hazard: a.hazard(),
            probability: a.probability(),
            tier: a.tier(),
            polygon: a.boundary().clone(),
        })
        .collect();

    debug!(hazard = %set.hazard(), polygons = tiered.len(), "assigned tiers");
    Ok(tiered)
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;
    use crate::types::RiskArea;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]
    }

    #[test]
    fn tags_each_area_with_its_tier() {
        let mut set = HazardRiskSet::new(Hazard::Hail);
        set.insert(RiskArea::parse(AreaId(1), Hazard::Hail, "5%", rect(0.0, 0.0, 10.0, 10.0)).unwrap()).unwrap();
        set.insert(RiskArea::parse(AreaId(2), Hazard::Hail, "60#", rect(1.0, 1.0, 2.0, 2.0)).unwrap()).unwrap();

        let tiered = assign(&set).unwrap();
        assert_eq!(tiered.len(), 2);
        assert_eq!(tiered[0].tier, CategoricalTier::Mrgl);
        assert_eq!(tiered[1].tier, CategoricalTier::Mdt);
        assert_eq!(tiered[1].area, AreaId(2));
    }

    #[test]
    fn bypassed_validation_is_an_internal_error() {
        let mut set = HazardRiskSet::new(Hazard::Wind);
        set.push_unchecked(RiskArea::parse(AreaId(1), Hazard::Wind, "15%", rect(0.0, 0.0, 4.0, 4.0)).unwrap());
        set.push_unchecked(RiskArea::parse(AreaId(2), Hazard::Wind, "15%", rect(2.0, 2.0, 6.0, 6.0)).unwrap());
        assert!(matches!(assign(&set), Err(InternalError::InvariantViolation(_))));
    }

    #[test]
    fn empty_set_assigns_nothing() {
        assert!(assign(&HazardRiskSet::new(Hazard::Tornado)).unwrap().is_empty());
    }
}
