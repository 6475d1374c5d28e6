mod area;
mod hazard;
mod probability;
mod tier;

pub use area::{AreaId, ExtensionValue, RiskArea};
pub use hazard::Hazard;
pub use probability::{NestingRank, Probability};
pub use tier::CategoricalTier;
