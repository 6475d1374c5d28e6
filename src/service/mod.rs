//! Publication of categorical outlook snapshots.

mod conversion;
mod snapshot;

pub use conversion::ConversionService;
pub use snapshot::{HazardSets, OutlookSnapshot};
