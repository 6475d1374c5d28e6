use tracing::debug;

use crate::config::EngineConfig;
use crate::error::SetError;
use crate::nesting::predicates::Predicates;
use crate::nesting::validator::{validate, validate_sequence};
use crate::types::{AreaId, Hazard, RiskArea};

/// The risk areas of one hazard, in insertion order.
///
/// Every mutation is proposed, validated against the nesting rules, and only
/// then applied; a rejected mutation leaves the set unchanged.
#[derive(Debug, Clone)]
pub struct HazardRiskSet {
    hazard: Hazard,
    config: EngineConfig,
    areas: Vec<RiskArea>,
}

impl HazardRiskSet {
    pub fn new(hazard: Hazard) -> Self {
        Self::with_config(hazard, EngineConfig::default())
    }

    /// An empty set whose validation uses the given tolerances.
    pub fn with_config(hazard: Hazard, config: EngineConfig) -> Self {
        Self { hazard, config, areas: Vec::new() }
    }

    #[inline] pub fn hazard(&self) -> Hazard { self.hazard }

    #[inline] pub fn config(&self) -> &EngineConfig { &self.config }

    #[inline] pub fn len(&self) -> usize { self.areas.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.areas.is_empty() }

    #[inline] pub fn areas(&self) -> &[RiskArea] { &self.areas }

    pub fn iter(&self) -> impl Iterator<Item = &RiskArea> { self.areas.iter() }

    pub fn get(&self, id: AreaId) -> Option<&RiskArea> {
        self.areas.iter().find(|a| a.id() == id)
    }

    fn position(&self, id: AreaId) -> Result<usize, SetError> {
        self.areas.iter().position(|a| a.id() == id).ok_or(SetError::UnknownArea(id))
    }

    fn check_hazard(&self, area: &RiskArea) -> Result<(), SetError> {
        if area.hazard() != self.hazard {
            return Err(SetError::HazardMismatch { area: area.id(), expected: self.hazard, actual: area.hazard() });
        }
        Ok(())
    }

    fn check_proposal(&self, proposed: &[RiskArea]) -> Result<(), SetError> {
        validate_sequence(&Predicates::new(&self.config), proposed).map_err(SetError::Violations)
    }

    /// Validate a new area against the set and append it.
    pub fn insert(&mut self, area: RiskArea) -> Result<(), SetError> {
        self.check_hazard(&area)?;
        area.check_snapped(&self.config)?;
        if self.get(area.id()).is_some() {
            return Err(SetError::DuplicateArea(area.id()));
        }
        validate(self, &area)?;
        debug!(hazard = %self.hazard, area = %area.id(), probability = %area.probability(), "inserted risk area");
        self.areas.push(area);
        Ok(())
    }

    /// Replace the area with the same id in place and return the old value.
    /// The whole proposed set is re-validated.
    pub fn replace(&mut self, area: RiskArea) -> Result<RiskArea, SetError> {
        self.check_hazard(&area)?;
        area.check_snapped(&self.config)?;
        let pos = self.position(area.id())?;

        let mut proposed = self.areas.clone();
        proposed[pos] = area;
        self.check_proposal(&proposed)?;

        let previous = std::mem::replace(&mut self.areas, proposed).swap_remove(pos);
        debug!(hazard = %self.hazard, area = %previous.id(), "replaced risk area");
        Ok(previous)
    }

    /// Remove an area.  Rejected if the remaining areas would no longer nest,
    /// e.g. when the removed shell was the one supporting a higher-ranked area.
    pub fn remove(&mut self, id: AreaId) -> Result<RiskArea, SetError> {
        let pos = self.position(id)?;

        let mut proposed = self.areas.clone();
        let removed = proposed.remove(pos);
        self.check_proposal(&proposed)?;

        self.areas = proposed;
        debug!(hazard = %self.hazard, area = %id, "removed risk area");
        Ok(removed)
    }

    #[cfg(test)]
    pub(crate) fn push_unchecked(&mut self, area: RiskArea) {
        self.areas.push(area);
    }
}
