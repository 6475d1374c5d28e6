use std::fmt;

use outlook_arrangement::ArrangementError;
use serde::Serialize;
use thiserror::Error;

use crate::types::{AreaId, Hazard};

/// A probability literal that cannot be parsed at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed probability literal '{0}'")]
pub struct ParseProbabilityError(pub String);

/// A probability literal that is not defined for its hazard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("probability '{literal}' is not defined for {hazard}")]
pub struct InvalidProbability {
    pub hazard: Hazard,
    pub literal: String,
}

/// Input rejected before it can enter any hazard set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error(transparent)]
    InvalidProbability(#[from] InvalidProbability),

    #[error("area {area} has no boundary")]
    EmptyGeometry { area: AreaId },

    #[error("area {area} has a non-finite coordinate")]
    NonFiniteCoordinate { area: AreaId },

    /// Fewer than three distinct vertices, or zero area.  Ring 0 is the exterior.
    #[error("ring {ring} of area {area} is degenerate")]
    DegenerateRing { area: AreaId, ring: usize },

    #[error("ring {ring} of area {area} intersects itself or another ring")]
    SelfIntersection { area: AreaId, ring: usize },

    #[error("hole {ring} of area {area} is not inside the exterior ring")]
    HoleOutsideShell { area: AreaId, ring: usize },
}

/// Kind of nesting conflict between two areas of one hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ViolationKind {
    /// Two areas of the same rank overlap.
    SameTierOverlap,
    /// Boundaries of areas with different ranks cross.
    Crossing,
    /// A lower-ranked area lies inside a higher-ranked one.
    InvertedNesting,
    /// A higher-ranked area is not inside any lower-ranked area.
    UnsupportedHigherTier,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViolationKind::SameTierOverlap => "same-tier overlap",
            ViolationKind::Crossing => "crossing boundaries",
            ViolationKind::InvertedNesting => "inverted nesting",
            ViolationKind::UnsupportedHigherTier => "unsupported higher tier",
        })
    }
}

/// A nesting conflict between `area` and an existing `conflicting` area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Error)]
#[error("{kind}: area {area} conflicts with area {conflicting}")]
pub struct NestingViolation {
    pub kind: ViolationKind,
    pub area: AreaId,
    pub conflicting: AreaId,
}

/// Rejected mutation of a `HazardRiskSet`.  The set is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetError {
    /// The boundary does not survive snapping to the set's grid.
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Violation(#[from] NestingViolation),

    #[error("{} nesting violation(s), first: {}", .0.len(), first(.0))]
    Violations(Vec<NestingViolation>),

    #[error("no area with id {0}")]
    UnknownArea(AreaId),

    #[error("an area with id {0} already exists")]
    DuplicateArea(AreaId),

    #[error("area {area} is a {actual} area but the set holds {expected} areas")]
    HazardMismatch { area: AreaId, expected: Hazard, actual: Hazard },
}

/// Every nesting violation found while re-validating a set of hazards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} nesting violation(s), first: {}", .violations.len(), first_tagged(.violations))]
pub struct ValidationError {
    pub violations: Vec<(Hazard, NestingViolation)>,
}

/// Failure of an internal invariant; validation was bypassed or the
/// arrangement could not be built.
#[derive(Debug, Error)]
pub enum InternalError {
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("topology error: {0}")]
    Topology(String),
}

impl From<ArrangementError> for InternalError {
    fn from(err: ArrangementError) -> Self {
        InternalError::Topology(err.to_string())
    }
}

/// Why `ConversionService::recompute` did not publish a snapshot.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("{hazard}: {source}")]
    Input { hazard: Hazard, source: InputError },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

fn first(violations: &[NestingViolation]) -> String {
    violations.first().map_or_else(|| "none".to_string(), ToString::to_string)
}

fn first_tagged(violations: &[(Hazard, NestingViolation)]) -> String {
    violations.first().map_or_else(|| "none".to_string(), |(hazard, v)| format!("{hazard} {v}"))
}
