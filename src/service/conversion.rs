use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::assign::{assign, TieredPolygon};
use crate::config::EngineConfig;
use crate::error::{ConversionError, ValidationError};
use crate::nesting::validate_set_with;
use crate::overlay::{overlay_with, CategoricalRegion};
use crate::service::snapshot::{HazardSets, OutlookSnapshot};

/// Owns the published outlook snapshot and replaces it on every recompute.
///
/// Readers on any thread get the whole current snapshot through `snapshot`;
/// a snapshot is never visible half-built.  `recompute` assumes a single
/// writer.
#[derive(Debug)]
pub struct ConversionService {
    config: EngineConfig,
    current: RwLock<Arc<OutlookSnapshot>>,
}

impl Default for ConversionService {
    fn default() -> Self { Self::new(EngineConfig::default()) }
}

impl ConversionService {
    /// A service publishing the empty generation-0 snapshot.
    pub fn new(config: EngineConfig) -> Self {
        Self { config, current: RwLock::new(Arc::new(OutlookSnapshot::empty())) }
    }

    #[inline] pub fn config(&self) -> &EngineConfig { &self.config }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Arc<OutlookSnapshot> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn generation(&self) -> u64 { self.snapshot().generation() }

    /// Re-check every boundary and hazard set with the service's tolerances, classify
    /// and overlay them, and publish the result as the next generation.
    ///
    /// On error nothing is published and the previous snapshot stays current.
    pub fn recompute(&self, sets: &HazardSets) -> Result<Arc<OutlookSnapshot>, ConversionError> {
        let (hazards, regions) = match self.build(sets) {
            Ok(built) => built,
            Err(err) => {
                warn!(generation = self.generation(), error = %err, "recompute rejected; previous snapshot kept");
                return Err(err);
            }
        };

        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let snapshot = Arc::new(OutlookSnapshot::new(slot.generation() + 1, hazards, regions));
        *slot = Arc::clone(&snapshot);
        drop(slot);

        info!(
            generation = snapshot.generation(),
            regions = snapshot.regions().len(),
            "published outlook snapshot"
        );
        Ok(snapshot)
    }

    fn build(&self, sets: &HazardSets) -> Result<([Vec<TieredPolygon>; 3], Vec<CategoricalRegion>), ConversionError> {
        for set in sets.iter() {
            for area in set.iter() {
                area.check_snapped(&self.config)
                    .map_err(|source| ConversionError::Input { hazard: set.hazard(), source })?;
            }
        }

        let violations: Vec<_> = sets.iter()
            .filter_map(|set| validate_set_with(&self.config, set).err().map(|vs| (set.hazard(), vs)))
            .flat_map(|(hazard, vs)| vs.into_iter().map(move |v| (hazard, v)))
            .collect();
        if !violations.is_empty() {
            return Err(ValidationError { violations }.into());
        }

        let mut hazards: [Vec<TieredPolygon>; 3] = Default::default();
        for (slot, set) in hazards.iter_mut().zip(sets.iter()) {
            *slot = assign(set)?;
        }

        let all: Vec<TieredPolygon> = hazards.iter().flatten().cloned().collect();
        debug!(areas = sets.num_areas(), polygons = all.len(), "overlaying hazards");
        let regions = overlay_with(&self.config, &all)?;
        Ok((hazards, regions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_empty_generation_zero() {
        let service = ConversionService::default();
        assert_eq!(service.generation(), 0);
        assert!(service.snapshot().regions().is_empty());
    }

    #[test]
    fn service_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConversionService>();
    }
}
