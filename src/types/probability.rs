use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ParseProbabilityError;

/// A hazard probability with its significance flag, written `"15%"` or
/// `"15#"` (significant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Probability {
    pub percent: u8,
    pub significant: bool,
}

/// Position of a probability within one hazard's nesting hierarchy.
///
/// Ordered by `(percent, significant)`, so `10#` ranks above `10%` and below
/// `15%`.  Nesting compares ranks rather than categorical tiers, which can
/// coincide for distinct probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NestingRank(pub Probability);

impl Probability {
    pub const fn new(percent: u8, significant: bool) -> Self { Self { percent, significant } }

    #[inline]
    pub fn rank(self) -> NestingRank { NestingRank(self) }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.percent, if self.significant { '#' } else { '%' })
    }
}

impl FromStr for Probability {
    type Err = ParseProbabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let literal = s.trim();
        let err = || ParseProbabilityError(s.to_string());

        let (digits, significant) = if let Some(d) = literal.strip_suffix('%') {
            (d, false)
        } else if let Some(d) = literal.strip_suffix('#') {
            (d, true)
        } else {
            return Err(err());
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let percent: u8 = digits.parse().map_err(|_| err())?;
        if percent == 0 || percent > 100 {
            return Err(err());
        }
        Ok(Self { percent, significant })
    }
}

impl TryFrom<String> for Probability {
    type Error = ParseProbabilityError;

    fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

impl From<Probability> for String {
    fn from(value: Probability) -> Self { value.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_significant_literals() {
        assert_eq!("15%".parse::<Probability>(), Ok(Probability::new(15, false)));
        assert_eq!(" 10# ".parse::<Probability>(), Ok(Probability::new(10, true)));
    }

    #[test]
    fn rejects_malformed_literals() {
        for bad in ["", "%", "15", "15 %", "-5%", "+5%", "0%", "101%", "1.5%", "15%%", "ten%"] {
            assert!(bad.parse::<Probability>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn significant_ranks_between_neighbouring_percentages() {
        let r = |s: &str| s.parse::<Probability>().unwrap().rank();
        assert!(r("10%") < r("10#"));
        assert!(r("10#") < r("15%"));
        assert!(r("2%") < r("5%"));
        assert_eq!(r("30#").0, Probability::new(30, true));
    }

    #[test]
    fn serde_uses_literal_form() {
        let p: Probability = serde_json::from_str("\"30#\"").unwrap();
        assert_eq!(p, Probability::new(30, true));
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"30#\"");
        assert!(serde_json::from_str::<Probability>("\"30\"").is_err());
    }
}
