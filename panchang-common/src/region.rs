//! Supported regional naming schemes
//!
//! A region selects the mansion-name table, the cache-key component and the
//! locale the enrichment provider is asked to describe.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// One of the seven regional naming schemes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[default]
    #[serde(rename = "Malayalam")]
    Malayalam,
    #[serde(rename = "Tamil")]
    Tamil,
    #[serde(rename = "Kannada")]
    Kannada,
    #[serde(rename = "Telugu")]
    Telugu,
    #[serde(rename = "North Indian (Hindi)")]
    NorthIndian,
    #[serde(rename = "Bengali")]
    Bengali,
    #[serde(rename = "Marathi")]
    Marathi,
}

/// All regions in display order
pub const ALL_REGIONS: [Region; 7] = [
    Region::Malayalam,
    Region::Tamil,
    Region::Kannada,
    Region::Telugu,
    Region::NorthIndian,
    Region::Bengali,
    Region::Marathi,
];

impl Region {
    /// Human-readable name, also used verbatim in persisted months
    pub const fn display_name(self) -> &'static str {
        match self {
            Region::Malayalam => "Malayalam",
            Region::Tamil => "Tamil",
            Region::Kannada => "Kannada",
            Region::Telugu => "Telugu",
            Region::NorthIndian => "North Indian (Hindi)",
            Region::Bengali => "Bengali",
            Region::Marathi => "Marathi",
        }
    }

    /// Cache-key component: display name with whitespace runs replaced by `_`
    pub fn key_component(self) -> String {
        self.display_name()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
    }

    pub const fn all() -> &'static [Region; 7] {
        &ALL_REGIONS
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Region {
    type Err = Error;

    /// Accepts the display name, the key component, or a short alias
    /// (`hindi`, `north_indian`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        for region in ALL_REGIONS {
            if region.display_name().to_ascii_lowercase() == wanted
                || region.key_component().to_ascii_lowercase() == wanted
            {
                return Ok(region);
            }
        }
        match wanted.as_str() {
            "hindi" | "north_indian" | "north-indian" | "north indian" => Ok(Region::NorthIndian),
            _ => Err(Error::InvalidInput(format!("Unknown region: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_component_replaces_spaces() {
        assert_eq!(Region::NorthIndian.key_component(), "North_Indian_(Hindi)");
        assert_eq!(Region::Malayalam.key_component(), "Malayalam");
    }

    #[test]
    fn test_parse_accepts_display_name_and_aliases() {
        assert_eq!("Tamil".parse::<Region>().unwrap(), Region::Tamil);
        assert_eq!("north indian (hindi)".parse::<Region>().unwrap(), Region::NorthIndian);
        assert_eq!("North_Indian_(Hindi)".parse::<Region>().unwrap(), Region::NorthIndian);
        assert_eq!("hindi".parse::<Region>().unwrap(), Region::NorthIndian);
        assert!("Klingon".parse::<Region>().is_err());
    }

    #[test]
    fn test_serde_uses_display_name() {
        let json = serde_json::to_string(&Region::NorthIndian).unwrap();
        assert_eq!(json, "\"North Indian (Hindi)\"");
        let back: Region = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Region::NorthIndian);
    }
}
