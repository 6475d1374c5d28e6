use geo::Point;

use crate::assign::TieredPolygon;
use crate::config::EngineConfig;
use crate::nesting::HazardRiskSet;
use crate::overlay::{tier_at, CategoricalRegion};
use crate::types::{CategoricalTier, Hazard};

/// One hazard set per hazard, the input of a recompute.
#[derive(Debug, Clone)]
pub struct HazardSets {
    sets: [HazardRiskSet; 3],
}

fn slot(hazard: Hazard) -> usize {
    match hazard {
        Hazard::Tornado => 0,
        Hazard::Wind => 1,
        Hazard::Hail => 2,
    }
}

impl Default for HazardSets {
    fn default() -> Self { Self::with_config(EngineConfig::default()) }
}

impl HazardSets {
    pub fn new() -> Self { Self::default() }

    /// Empty sets whose mutations validate with `config`.
    pub fn with_config(config: EngineConfig) -> Self {
        Self { sets: Hazard::all().map(|h| HazardRiskSet::with_config(h, config)) }
    }

    pub fn get(&self, hazard: Hazard) -> &HazardRiskSet { &self.sets[slot(hazard)] }

    pub fn get_mut(&mut self, hazard: Hazard) -> &mut HazardRiskSet { &mut self.sets[slot(hazard)] }

    /// Put `set` in its hazard's slot, returning the set it replaces.
    pub fn put(&mut self, set: HazardRiskSet) -> HazardRiskSet {
        let i = slot(set.hazard());
        std::mem::replace(&mut self.sets[i], set)
    }

    /// Sets in hazard order.
    pub fn iter(&self) -> impl Iterator<Item = &HazardRiskSet> { self.sets.iter() }

    /// Total number of areas over all hazards.
    pub fn num_areas(&self) -> usize { self.sets.iter().map(HazardRiskSet::len).sum() }
}

/// An immutable, published categorical outlook.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutlookSnapshot {
    generation: u64,
    hazards: [Vec<TieredPolygon>; 3],
    regions: Vec<CategoricalRegion>,
}

impl OutlookSnapshot {
    /// The generation-0 snapshot published before any recompute.
    pub fn empty() -> Self { Self::default() }

    pub(crate) fn new(generation: u64, hazards: [Vec<TieredPolygon>; 3], regions: Vec<CategoricalRegion>) -> Self {
        Self { generation, hazards, regions }
    }

    #[inline] pub fn generation(&self) -> u64 { self.generation }

    /// Tier-tagged polygons of one hazard, in set order.
    pub fn hazard(&self, hazard: Hazard) -> &[TieredPolygon] { &self.hazards[slot(hazard)] }

    /// Merged regions in canonical order.
    #[inline] pub fn regions(&self) -> &[CategoricalRegion] { &self.regions }

    pub fn tier_at(&self, point: Point<f64>) -> CategoricalTier { tier_at(&self.regions, point) }

    /// Same content as `other`, ignoring the generation.
    pub fn same_outlook(&self, other: &OutlookSnapshot) -> bool {
        self.hazards == other.hazards && self.regions == other.regions
    }
}
