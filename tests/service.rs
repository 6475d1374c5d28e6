// Snapshot publication: generations, failed recomputes and concurrent readers.

use std::sync::Arc;

use geo::{polygon, Polygon};
use outlook::{
    AreaId, ConversionError, ConversionService, EngineConfig, Hazard, HazardRiskSet, HazardSets, RiskArea,
    ViolationKind,
};

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
    polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]
}

fn area(id: u64, hazard: Hazard, literal: &str, boundary: Polygon<f64>) -> RiskArea {
    RiskArea::parse(AreaId(id), hazard, literal, boundary).unwrap()
}

fn sample_sets() -> HazardSets {
    let mut sets = HazardSets::new();
    sets.get_mut(Hazard::Wind).insert(area(1, Hazard::Wind, "5%", rect(0.0, 0.0, 10.0, 10.0))).unwrap();
    sets.get_mut(Hazard::Wind).insert(area(2, Hazard::Wind, "15%", rect(2.0, 2.0, 8.0, 8.0))).unwrap();
    sets.get_mut(Hazard::Hail).insert(area(3, Hazard::Hail, "5%", rect(6.0, 6.0, 14.0, 14.0))).unwrap();
    sets
}

#[test]
fn each_recompute_publishes_the_next_generation() {
    let service = ConversionService::default();
    assert_eq!(service.generation(), 0);

    let sets = sample_sets();
    let first = service.recompute(&sets).unwrap();
    assert_eq!(first.generation(), 1);
    assert!(Arc::ptr_eq(&first, &service.snapshot()));

    let second = service.recompute(&sets).unwrap();
    assert_eq!(second.generation(), 2);
    assert_eq!(service.generation(), 2);

    // Unchanged input gives the same outlook.
    assert!(first.same_outlook(&second));
    assert_eq!(first.regions(), second.regions());
}

#[test]
fn rejected_recompute_keeps_previous_snapshot() {
    let service = ConversionService::default();
    let published = service.recompute(&sample_sets()).unwrap();

    // A set accepted under loose tolerances that the service's own reject.
    let loose = EngineConfig { area_epsilon: 2.0, ..EngineConfig::default() };
    let mut tornado = HazardRiskSet::with_config(Hazard::Tornado, loose);
    tornado.insert(area(10, Hazard::Tornado, "2%", rect(0.0, 0.0, 4.0, 4.0))).unwrap();
    tornado.insert(area(11, Hazard::Tornado, "2%", rect(3.0, 3.0, 6.0, 6.0))).unwrap();
    let mut sets = sample_sets();
    sets.put(tornado);

    let err = service.recompute(&sets).unwrap_err();
    let ConversionError::Validation(validation) = err else { panic!("expected a validation error") };
    assert_eq!(validation.violations.len(), 1);
    let (hazard, violation) = validation.violations[0];
    assert_eq!(hazard, Hazard::Tornado);
    assert_eq!(violation.kind, ViolationKind::SameTierOverlap);
    assert_eq!((violation.area, violation.conflicting), (AreaId(11), AreaId(10)));

    assert_eq!(service.generation(), 1);
    assert!(Arc::ptr_eq(&published, &service.snapshot()));
}

#[test]
fn readers_always_see_complete_snapshots() {
    let service = ConversionService::default();
    let sets = sample_sets();
    let expected = service.recompute(&sets).unwrap();

    std::thread::scope(|scope| {
        let reader = scope.spawn(|| {
            let mut last = 0;
            for _ in 0..200 {
                let snapshot = service.snapshot();
                assert!(snapshot.generation() >= last);
                last = snapshot.generation();
                assert_eq!(snapshot.regions().len(), expected.regions().len());
            }
        });
        for _ in 0..20 {
            service.recompute(&sets).unwrap();
        }
        reader.join().unwrap();
    });

    assert_eq!(service.generation(), 21);
}

#[test]
fn empty_sets_publish_an_empty_outlook() {
    let service = ConversionService::new(EngineConfig::default());
    let snapshot = service.recompute(&HazardSets::new()).unwrap();
    assert_eq!(snapshot.generation(), 1);
    assert!(snapshot.regions().is_empty());
}

#[test]
fn near_coincident_ring_still_publishes() {
    // Vertices within a few grid cells of each other; the snapped ring is a
    // thin spike with a sliver attached.
    let ring = polygon![
        (x: 0.9999999224508052, y: 3.0000004256090826),
        (x: 3.908e-7, y: 0.9999997989),
        (x: 0.9999998906649237, y: 3.000000041510008),
        (x: 1.0, y: 1.9999995005603006),
    ];
    let mut sets = HazardSets::new();
    sets.get_mut(Hazard::Tornado).insert(area(1, Hazard::Tornado, "15%", ring)).unwrap();

    let service = ConversionService::default();
    let snapshot = service.recompute(&sets).unwrap();
    assert_eq!(snapshot.generation(), 1);
    assert!(!snapshot.regions().is_empty());
    assert!(snapshot.regions().iter().all(|r| r.tier == outlook::CategoricalTier::Enh));
}

#[test]
fn boundary_degenerate_on_the_service_grid_is_rejected() {
    let mut sets = HazardSets::new();
    sets.get_mut(Hazard::Hail).insert(area(1, Hazard::Hail, "5%", rect(0.0, 0.0, 0.3, 0.3))).unwrap();

    let coarse = ConversionService::new(EngineConfig { snap_epsilon: 1.0, ..EngineConfig::default() });
    let err = coarse.recompute(&sets).unwrap_err();
    let ConversionError::Input { hazard, source } = err else { panic!("expected an input error") };
    assert_eq!(hazard, Hazard::Hail);
    assert_eq!(source, outlook::InputError::DegenerateRing { area: AreaId(1), ring: 0 });
    assert_eq!(coarse.generation(), 0);
}
