use geo::Polygon;
use tracing::trace;

use crate::config::EngineConfig;
use crate::error::{NestingViolation, ViolationKind};
use crate::nesting::predicates::Predicates;
use crate::nesting::HazardRiskSet;
use crate::types::RiskArea;

/// Check `candidate` against every other area of `existing`.
///
/// Areas with the candidate's own id are skipped, so an edited area can be
/// checked against the rest of its set.  Areas of another hazard are never
/// compared.  Returns the first violation found, in set order.
pub fn validate(existing: &HazardRiskSet, candidate: &RiskArea) -> Result<(), NestingViolation> {
    let preds = Predicates::new(existing.config());
    let others: Vec<(&RiskArea, Polygon<f64>)> = existing.iter()
        .filter(|a| a.id() != candidate.id() && a.hazard() == candidate.hazard())
        .map(|a| (a, preds.snap(a.boundary())))
        .collect();
    check(&preds, &others, candidate, &preds.snap(candidate.boundary()))
}

/// Re-validate a whole set by replaying it in insertion order: every area is
/// checked against the areas before it.  Collects every violation.
pub fn validate_set(set: &HazardRiskSet) -> Result<(), Vec<NestingViolation>> {
    validate_set_with(set.config(), set)
}

/// `validate_set` with tolerances other than the set's own.
pub fn validate_set_with(config: &EngineConfig, set: &HazardRiskSet) -> Result<(), Vec<NestingViolation>> {
    validate_sequence(&Predicates::new(config), set.areas())
}

pub(crate) fn validate_sequence(preds: &Predicates, areas: &[RiskArea]) -> Result<(), Vec<NestingViolation>> {
    let snapped: Vec<(&RiskArea, Polygon<f64>)> = areas.iter().map(|a| (a, preds.snap(a.boundary()))).collect();

    let violations: Vec<NestingViolation> = (0..snapped.len())
        .filter_map(|i| {
            let (candidate, polygon) = &snapped[i];
            check(preds, &snapped[..i], candidate, polygon).err()
        })
        .collect();

    if violations.is_empty() { Ok(()) } else { Err(violations) }
}

/// Pairwise rules against each existing area, then the support rule.
fn check(
    preds: &Predicates,
    existing: &[(&RiskArea, Polygon<f64>)],
    candidate: &RiskArea,
    polygon: &Polygon<f64>,
) -> Result<(), NestingViolation> {
    let violation = |kind, other: &RiskArea| NestingViolation { kind, area: candidate.id(), conflicting: other.id() };
    let rank = candidate.rank();

    for (other, other_polygon) in existing {
        if !preds.overlaps(polygon, other_polygon) {
            continue;
        }
        trace!(area = %candidate.id(), other = %other.id(), "overlapping areas");

        let (outer, inner) = match other.rank().cmp(&rank) {
            std::cmp::Ordering::Equal => return Err(violation(ViolationKind::SameTierOverlap, other)),
            std::cmp::Ordering::Greater => (polygon, other_polygon),
            std::cmp::Ordering::Less => (other_polygon, polygon),
        };
        if preds.contains(outer, inner) {
            continue;
        }
        if preds.contains(inner, outer) {
            return Err(violation(ViolationKind::InvertedNesting, other));
        }
        return Err(violation(ViolationKind::Crossing, other));
    }

    // A higher-ranked area must sit inside some lower-ranked one, once any exist.
    let mut lower: Vec<&(&RiskArea, Polygon<f64>)> = existing.iter().filter(|(a, _)| a.rank() < rank).collect();
    if lower.is_empty() || lower.iter().any(|(_, p)| preds.contains(p, polygon)) {
        return Ok(());
    }
    // Highest rank first; the stable sort keeps set order among equals.
    lower.sort_by(|(a, _), (b, _)| b.rank().cmp(&a.rank()));
    Err(violation(ViolationKind::UnsupportedHigherTier, lower[0].0))
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;
    use crate::types::{AreaId, Hazard};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> geo::Polygon<f64> {
        polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]
    }

    fn area(id: u64, literal: &str, boundary: geo::Polygon<f64>) -> RiskArea {
        RiskArea::parse(AreaId(id), Hazard::Tornado, literal, boundary).unwrap()
    }

    fn set(areas: Vec<RiskArea>) -> HazardRiskSet {
        let mut set = HazardRiskSet::new(Hazard::Tornado);
        for a in areas {
            set.insert(a).unwrap();
        }
        set
    }

    #[test]
    fn inverted_nesting_is_distinguished_from_crossing() {
        let existing = set(vec![area(1, "10%", rect(0.0, 0.0, 10.0, 10.0))]);
        let err = validate(&existing, &area(2, "5%", rect(2.0, 2.0, 4.0, 4.0))).unwrap_err();
        assert_eq!(err.kind, ViolationKind::InvertedNesting);

        let err = validate(&existing, &area(2, "5%", rect(8.0, 8.0, 12.0, 12.0))).unwrap_err();
        assert_eq!(err.kind, ViolationKind::Crossing);
        assert_eq!((err.area, err.conflicting), (AreaId(2), AreaId(1)));
    }

    #[test]
    fn lower_area_drawn_around_higher_one_is_accepted() {
        let existing = set(vec![area(1, "10#", rect(2.0, 2.0, 4.0, 4.0))]);
        assert!(validate(&existing, &area(2, "5%", rect(0.0, 0.0, 10.0, 10.0))).is_ok());
    }

    #[test]
    fn unsupported_names_highest_lower_area() {
        let existing = set(vec![
            area(1, "2%", rect(0.0, 0.0, 10.0, 10.0)),
            area(2, "5%", rect(1.0, 1.0, 9.0, 9.0)),
        ]);
        let err = validate(&existing, &area(3, "10%", rect(20.0, 20.0, 21.0, 21.0))).unwrap_err();
        assert_eq!(err.kind, ViolationKind::UnsupportedHigherTier);
        assert_eq!(err.conflicting, AreaId(2));
    }

    #[test]
    fn edited_area_skips_itself() {
        let existing = set(vec![area(1, "2%", rect(0.0, 0.0, 10.0, 10.0))]);
        assert!(validate(&existing, &area(1, "2%", rect(0.0, 0.0, 12.0, 12.0))).is_ok());
    }

    #[test]
    fn validate_set_collects_every_violation() {
        let preds = Predicates::new(&crate::config::EngineConfig::default());
        let areas = vec![
            area(1, "5%", rect(0.0, 0.0, 4.0, 4.0)),
            area(2, "5%", rect(2.0, 2.0, 6.0, 6.0)),
            area(3, "5%", rect(3.0, 3.0, 8.0, 8.0)),
        ];
        let errs = validate_sequence(&preds, &areas).unwrap_err();
        assert_eq!(errs.len(), 2);
        assert!(errs.iter().all(|e| e.kind == ViolationKind::SameTierOverlap));
        assert_eq!(errs[1].area, AreaId(3));
        assert_eq!(errs[1].conflicting, AreaId(1));
    }
}
