//! The nesting invariant of one hazard's risk areas: higher-ranked areas lie
//! inside lower-ranked ones, and areas of equal rank never overlap.

pub(crate) mod predicates;
mod set;
mod validator;

pub use set::HazardRiskSet;
pub use validator::{validate, validate_set, validate_set_with};
