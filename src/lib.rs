#![doc = "Outlook conversion engine: hazard risk areas to a categorical outlook"]
pub mod assign;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod io;
pub mod nesting;
pub mod overlay;
pub mod risk;
pub mod service;
pub mod types;

#[doc(inline)]
pub use assign::{assign, TieredPolygon};

#[doc(inline)]
pub use config::{EngineConfig, AREA_EPSILON, NAIVE_SEGMENT_THRESHOLD, SNAP_EPSILON};

#[doc(inline)]
pub use error::{
    ConversionError, InputError, InternalError, InvalidProbability, NestingViolation, SetError,
    ValidationError, ViolationKind,
};

#[doc(inline)]
pub use nesting::{validate, validate_set, validate_set_with, HazardRiskSet};

#[doc(inline)]
pub use overlay::{overlay, overlay_with, tier_at, CategoricalRegion, Contribution};

#[doc(inline)]
pub use risk::{classify, classify_literal, probabilities, tier_order};

#[doc(inline)]
pub use service::{ConversionService, HazardSets, OutlookSnapshot};

#[doc(inline)]
pub use types::{AreaId, CategoricalTier, ExtensionValue, Hazard, NestingRank, Probability, RiskArea};
