// Nesting rules enforced at the hazard set boundary.

use geo::{polygon, Polygon};
use outlook::{
    validate, validate_set, validate_set_with, AreaId, EngineConfig, Hazard, HazardRiskSet, NestingViolation,
    RiskArea, SetError, ViolationKind,
};

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
    polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]
}

fn area(id: u64, hazard: Hazard, literal: &str, boundary: Polygon<f64>) -> RiskArea {
    RiskArea::parse(AreaId(id), hazard, literal, boundary).unwrap()
}

#[test]
fn same_tier_overlap_is_rejected() {
    let mut set = HazardRiskSet::new(Hazard::Wind);
    set.insert(area(1, Hazard::Wind, "15%", rect(0.0, 0.0, 4.0, 4.0))).unwrap();

    let err = set.insert(area(2, Hazard::Wind, "15%", rect(3.0, 3.0, 6.0, 6.0))).unwrap_err();
    assert_eq!(
        err,
        SetError::Violation(NestingViolation {
            kind: ViolationKind::SameTierOverlap,
            area: AreaId(2),
            conflicting: AreaId(1),
        })
    );
    assert_eq!(set.len(), 1);
}

#[test]
fn same_tier_areas_may_share_an_edge() {
    let mut set = HazardRiskSet::new(Hazard::Hail);
    set.insert(area(1, Hazard::Hail, "15%", rect(0.0, 0.0, 4.0, 4.0))).unwrap();
    set.insert(area(2, Hazard::Hail, "15%", rect(4.0, 0.0, 8.0, 4.0))).unwrap();
    set.insert(area(3, Hazard::Hail, "15%", rect(8.0, 4.0, 9.0, 5.0))).unwrap();
    assert_eq!(set.len(), 3);
    assert!(validate_set(&set).is_ok());
}

#[test]
fn higher_tier_outside_every_lower_area_is_unsupported() {
    let mut set = HazardRiskSet::new(Hazard::Tornado);
    set.insert(area(1, Hazard::Tornado, "2%", rect(0.0, 0.0, 10.0, 10.0))).unwrap();

    let err = set.insert(area(2, Hazard::Tornado, "5%", rect(20.0, 20.0, 25.0, 25.0))).unwrap_err();
    let SetError::Violation(v) = err else { panic!("expected a single violation") };
    assert_eq!(v.kind, ViolationKind::UnsupportedHigherTier);
    assert_eq!(v.conflicting, AreaId(1));
}

#[test]
fn higher_tier_drawn_first_is_accepted_until_shell_crosses_it() {
    let mut set = HazardRiskSet::new(Hazard::Tornado);
    set.insert(area(1, Hazard::Tornado, "10%", rect(4.0, 4.0, 6.0, 6.0))).unwrap();

    // A shell that cuts through the existing higher area crosses it.
    let err = set.insert(area(2, Hazard::Tornado, "5%", rect(0.0, 0.0, 5.0, 5.0))).unwrap_err();
    let SetError::Violation(v) = err else { panic!("expected a single violation") };
    assert_eq!(v.kind, ViolationKind::Crossing);

    set.insert(area(2, Hazard::Tornado, "5%", rect(0.0, 0.0, 10.0, 10.0))).unwrap();
    assert!(validate_set(&set).is_ok());
}

#[test]
fn significant_ranks_above_plain_probability() {
    let mut set = HazardRiskSet::new(Hazard::Tornado);
    set.insert(area(1, Hazard::Tornado, "10%", rect(0.0, 0.0, 10.0, 10.0))).unwrap();
    set.insert(area(2, Hazard::Tornado, "10#", rect(2.0, 2.0, 8.0, 8.0))).unwrap();

    let candidate = area(3, Hazard::Tornado, "10%", rect(1.0, 1.0, 3.0, 3.0));
    let v = validate(&set, &candidate).unwrap_err();
    // Overlaps the existing 10% area first, in set order.
    assert_eq!(v.kind, ViolationKind::SameTierOverlap);
    assert_eq!(v.conflicting, AreaId(1));
}

#[test]
fn boundary_touching_containment_is_nested() {
    let mut set = HazardRiskSet::new(Hazard::Wind);
    set.insert(area(1, Hazard::Wind, "5%", rect(0.0, 0.0, 10.0, 10.0))).unwrap();
    set.insert(area(2, Hazard::Wind, "15%", rect(0.0, 0.0, 5.0, 10.0))).unwrap();
    set.insert(area(3, Hazard::Wind, "30%", rect(0.0, 0.0, 5.0, 5.0))).unwrap();
    assert_eq!(set.len(), 3);
}

#[test]
fn tolerances_decide_what_counts_as_overlap() {
    let loose = EngineConfig { area_epsilon: 2.0, ..EngineConfig::default() };
    let mut set = HazardRiskSet::with_config(Hazard::Wind, loose);
    set.insert(area(1, Hazard::Wind, "15%", rect(0.0, 0.0, 4.0, 4.0))).unwrap();
    set.insert(area(2, Hazard::Wind, "15%", rect(3.0, 3.0, 6.0, 6.0))).unwrap();

    assert!(validate_set(&set).is_ok());
    let violations = validate_set_with(&EngineConfig::default(), &set).unwrap_err();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::SameTierOverlap);
}
