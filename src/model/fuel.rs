use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical fuel / powertrain category shared by every country.
///
/// `Fossil` is a derived aggregate, only produced by sources that cannot
/// separate diesel from gasoline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FuelCode {
    Bev,
    Phev,
    Hybrid,
    Diesel,
    Gasoline,
    LpgCngOther,
    Fossil,
    Other,
    Unknown,
}

impl FuelCode {
    pub const ALL: [FuelCode; 9] = [
        FuelCode::Bev,
        FuelCode::Phev,
        FuelCode::Hybrid,
        FuelCode::Diesel,
        FuelCode::Gasoline,
        FuelCode::LpgCngOther,
        FuelCode::Fossil,
        FuelCode::Other,
        FuelCode::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FuelCode::Bev => "BEV",
            FuelCode::Phev => "PHEV",
            FuelCode::Hybrid => "HYBRID",
            FuelCode::Diesel => "DIESEL",
            FuelCode::Gasoline => "GASOLINE",
            FuelCode::LpgCngOther => "LPG_CNG_OTHER",
            FuelCode::Fossil => "FOSSIL",
            FuelCode::Other => "OTHER",
            FuelCode::Unknown => "UNKNOWN",
        }
    }

    /// True for codes that identify an actual powertrain, i.e. anything but
    /// the `OTHER`/`UNKNOWN` fallbacks.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, FuelCode::Other | FuelCode::Unknown)
    }

    /// Plug-in electric (new energy vehicle) codes.
    pub fn is_nev(&self) -> bool {
        matches!(self, FuelCode::Bev | FuelCode::Phev)
    }

    /// Internal combustion codes, split or aggregated.
    pub fn is_fossil(&self) -> bool {
        matches!(self, FuelCode::Diesel | FuelCode::Gasoline | FuelCode::Fossil)
    }
}

impl fmt::Display for FuelCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FuelCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FuelCode::ALL
            .iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("unknown fuel code '{}'", s))
    }
}
