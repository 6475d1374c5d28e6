use std::{collections::{BTreeMap, BTreeSet}, fs, path::Path};

use anyhow::{bail, Context, Result};
use geo::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{InputError, SetError};
use crate::service::HazardSets;
use crate::types::{AreaId, ExtensionValue, Hazard, RiskArea};

/// An outlook document: every drawn area of every hazard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlookDocument {
    pub areas: Vec<AreaRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaRecord {
    /// Allocated after the largest explicit id when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub hazard: Hazard,
    pub probability: String,
    pub geometry: GeometryRecord,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, ExtensionValue>,
}

/// GeoJSON geometry object; only polygons are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeometryRecord {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
}

impl GeometryRecord {
    pub fn to_polygon(&self) -> Result<Polygon<f64>> {
        let GeometryRecord::Polygon { coordinates } = self;
        let mut rings = coordinates.iter().enumerate().map(|(i, ring)| {
            ring.iter()
                .map(|pos| match pos.as_slice() {
                    [x, y, ..] => Ok(Coord { x: *x, y: *y }),
                    _ => bail!("ring {i} has a position with fewer than two coordinates"),
                })
                .collect::<Result<Vec<_>>>()
                .map(LineString)
        });
        let exterior = rings.next().transpose()?.unwrap_or_else(|| LineString(Vec::new()));
        let interiors = rings.collect::<Result<Vec<_>>>()?;
        Ok(Polygon::new(exterior, interiors))
    }
}

/// Why a document area did not make it into its hazard set.
#[derive(Debug, Error)]
pub enum AreaRejected {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Set(#[from] SetError),
}

#[derive(Debug)]
pub struct Rejection {
    /// Position of the area in the document.
    pub index: usize,
    pub area: AreaId,
    pub hazard: Hazard,
    pub reason: AreaRejected,
}

/// Hazard sets built from a document, with every area that was refused.
#[derive(Debug)]
pub struct LoadReport {
    pub sets: HazardSets,
    pub rejected: Vec<Rejection>,
}

impl LoadReport {
    /// The sets, or an error naming the first refused area.
    pub fn into_sets(self) -> Result<HazardSets> {
        if let Some(r) = self.rejected.first() {
            bail!("area {} ({}, document index {}) rejected: {}", r.area, r.hazard, r.index, r.reason);
        }
        Ok(self.sets)
    }
}

pub fn read_document(path: &Path) -> Result<OutlookDocument> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse outlook document {}", path.display()))
}

/// Read a document and build its hazard sets; any refused area is an error.
pub fn read_outlook(path: &Path, config: &EngineConfig) -> Result<HazardSets> {
    build_sets(&read_document(path)?, config)?.into_sets()
}

/// Parse a document from a JSON string and build its hazard sets.
pub fn parse_outlook(json: &str, config: &EngineConfig) -> Result<HazardSets> {
    let document: OutlookDocument = serde_json::from_str(json).context("parse outlook document")?;
    build_sets(&document, config)?.into_sets()
}

/// Insert every area, in document order, into its hazard's set through the
/// validated `insert`.  Refused areas are skipped and reported; later areas
/// are checked against the accepted ones only.
///
/// Fails outright on malformed geometry records or duplicate explicit ids.
pub fn build_sets(document: &OutlookDocument, config: &EngineConfig) -> Result<LoadReport> {
    let mut seen = BTreeSet::new();
    for record in &document.areas {
        if let Some(id) = record.id {
            if !seen.insert(id) {
                bail!("duplicate area id {id}");
            }
        }
    }
    let mut next_id = seen.last().map_or(1, |max| max + 1);

    let mut sets = HazardSets::with_config(*config);
    let mut rejected = Vec::new();
    for (index, record) in document.areas.iter().enumerate() {
        let id = AreaId(record.id.unwrap_or_else(|| {
            next_id += 1;
            next_id - 1
        }));
        let polygon = record.geometry.to_polygon()
            .with_context(|| format!("geometry of area {id} (document index {index})"))?;

        let result = RiskArea::parse(id, record.hazard, &record.probability, polygon)
            .map(|area| area.with_extensions(record.extensions.clone()))
            .map_err(AreaRejected::from)
            .and_then(|area| sets.get_mut(record.hazard).insert(area).map_err(AreaRejected::from));

        if let Err(reason) = result {
            debug!(area = %id, hazard = %record.hazard, %reason, "area rejected");
            rejected.push(Rejection { index, area: id, hazard: record.hazard, reason });
        }
    }

    Ok(LoadReport { sets, rejected })
}
