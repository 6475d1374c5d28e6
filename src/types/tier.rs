use std::fmt;

use serde::{Deserialize, Serialize};

/// Categorical severity tier of the combined outlook.
///
/// Variant order is the severity order; "maximum tier wins" merging relies on
/// the derived `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CategoricalTier {
    #[default]
    None,
    Mrgl,
    Slgt,
    Enh,
    Mdt,
    High,
}

impl CategoricalTier {
    /// Numeric level, 0 (`None`) through 5 (`High`).
    #[inline] pub fn level(&self) -> u8 { *self as u8 }

    pub fn label(&self) -> &'static str {
        match self {
            CategoricalTier::None => "NONE",
            CategoricalTier::Mrgl => "MRGL",
            CategoricalTier::Slgt => "SLGT",
            CategoricalTier::Enh => "ENH",
            CategoricalTier::Mdt => "MDT",
            CategoricalTier::High => "HIGH",
        }
    }

    /// All tiers from lowest to highest.
    pub fn order() -> [CategoricalTier; 6] {
        [
            CategoricalTier::None,
            CategoricalTier::Mrgl,
            CategoricalTier::Slgt,
            CategoricalTier::Enh,
            CategoricalTier::Mdt,
            CategoricalTier::High,
        ]
    }
}

impl fmt::Display for CategoricalTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_follow_declaration_order() {
        for (i, tier) in CategoricalTier::order().iter().enumerate() {
            assert_eq!(tier.level() as usize, i);
        }
        assert!(CategoricalTier::Mrgl < CategoricalTier::High);
    }

    #[test]
    fn serializes_as_label() {
        assert_eq!(serde_json::to_string(&CategoricalTier::Enh).unwrap(), "\"ENH\"");
    }
}
