use std::cmp::Ordering;

use crate::error::{InputError, InvalidProbability};
use crate::types::{CategoricalTier, Hazard, Probability};

use CategoricalTier::{Enh, High, Mdt, Mrgl, Slgt};

/// `(percent, significant) -> tier`, in nesting rank order.
type Table = [((u8, bool), CategoricalTier)];

const TORNADO: &Table = &[
    ((2, false), Mrgl),
    ((5, false), Slgt),
    ((10, false), Enh),
    ((10, true), Mdt),
    ((15, false), Enh),
    ((15, true), Mdt),
    ((30, false), Mdt),
    ((30, true), High),
    ((45, false), High),
    ((45, true), High),
    ((60, false), High),
    ((60, true), High),
];

const WIND: &Table = &[
    ((5, false), Mrgl),
    ((15, false), Slgt),
    ((30, false), Enh),
    ((30, true), Enh),
    ((45, false), Enh),
    ((45, true), Mdt),
    ((60, false), Mdt),
    ((60, true), High),
];

const HAIL: &Table = &[
    ((5, false), Mrgl),
    ((15, false), Slgt),
    ((30, false), Enh),
    ((30, true), Enh),
    ((45, false), Enh),
    ((45, true), Mdt),
    ((60, false), Mdt),
    ((60, true), Mdt),
];

fn table(hazard: Hazard) -> &'static Table {
    match hazard {
        Hazard::Tornado => TORNADO,
        Hazard::Wind => WIND,
        Hazard::Hail => HAIL,
    }
}

/// Categorical tier of a hazard probability.
pub fn classify(hazard: Hazard, probability: Probability) -> Result<CategoricalTier, InvalidProbability> {
    table(hazard)
        .iter()
        .find(|((percent, significant), _)| *percent == probability.percent && *significant == probability.significant)
        .map(|(_, tier)| *tier)
        .ok_or_else(|| InvalidProbability { hazard, literal: probability.to_string() })
}

/// Parse a literal such as `"15#"` and classify it.
pub fn classify_literal(hazard: Hazard, literal: &str) -> Result<CategoricalTier, InputError> {
    let probability = literal.parse::<Probability>()
        .map_err(|_| InvalidProbability { hazard, literal: literal.to_string() })?;
    Ok(classify(hazard, probability)?)
}

/// Probabilities defined for a hazard, lowest rank first.
pub fn probabilities(hazard: Hazard) -> Vec<Probability> {
    table(hazard).iter().map(|&((percent, significant), _)| Probability::new(percent, significant)).collect()
}

/// Total order on categorical tiers (`None` lowest, `High` highest).
#[inline]
pub fn tier_order(a: CategoricalTier, b: CategoricalTier) -> Ordering {
    a.level().cmp(&b.level())
}
