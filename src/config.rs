use std::{fs::File, io::BufReader, path::Path};

use anyhow::{bail, Context, Result};
use outlook_arrangement::ArrangementConfig;
use serde::{Deserialize, Serialize};

/// Default snapping grid cell size, in world units.
pub const SNAP_EPSILON: f64 = 1e-7;

/// Default area below which intersections and faces are treated as empty.
pub const AREA_EPSILON: f64 = 1e-9;

/// Default segment count below which noding uses brute-force pair testing.
pub const NAIVE_SEGMENT_THRESHOLD: usize = outlook_arrangement::NAIVE_SEGMENT_THRESHOLD;

/// Geometric tolerances of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub snap_epsilon: f64,
    pub area_epsilon: f64,
    pub naive_segment_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snap_epsilon: SNAP_EPSILON,
            area_epsilon: AREA_EPSILON,
            naive_segment_threshold: NAIVE_SEGMENT_THRESHOLD,
        }
    }
}

impl EngineConfig {
    /// Load a config from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("open config {}", path.display()))?;
        let config: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.snap_epsilon.is_finite() && self.snap_epsilon > 0.0) {
            bail!("snap_epsilon must be positive and finite, got {}", self.snap_epsilon);
        }
        if !(self.area_epsilon.is_finite() && self.area_epsilon >= 0.0) {
            bail!("area_epsilon must be non-negative and finite, got {}", self.area_epsilon);
        }
        Ok(())
    }

    pub fn arrangement(&self) -> ArrangementConfig {
        ArrangementConfig {
            snap_epsilon: self.snap_epsilon,
            naive_segment_threshold: self.naive_segment_threshold,
        }
    }
}
