use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// One of the probabilistic outlook types feeding the categorical outlook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hazard {
    Tornado,
    Wind,
    Hail,
}

impl Hazard {
    pub fn to_str(&self) -> &'static str {
        match self {
            Hazard::Tornado => "tornado",
            Hazard::Wind => "wind",
            Hazard::Hail => "hail",
        }
    }

    /// All hazards, in canonical order.
    pub fn all() -> [Hazard; 3] {
        [Hazard::Tornado, Hazard::Wind, Hazard::Hail]
    }
}

impl fmt::Display for Hazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for Hazard {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tornado" => Ok(Hazard::Tornado),
            "wind" => Ok(Hazard::Wind),
            "hail" => Ok(Hazard::Hail),
            other => Err(format!("unknown hazard '{other}'")),
        }
    }
}
