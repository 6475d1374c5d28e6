//! Probability to categorical tier conversion.

mod table;

pub use table::{classify, classify_literal, probabilities, tier_order};
