//! Regions, factions and the (region, faction) collections they span.
//!
//! Every character lives in exactly one collection. The collection name is
//! derived from these enums only, never from user input, so it is safe to
//! interpolate into SQL identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CovdbError;

/// Battle.net API region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Us,
    Eu,
    Kr,
    Tw,
}

impl Region {
    /// All regions in refresh order.
    pub const ALL: [Region; 4] = [Region::Us, Region::Eu, Region::Kr, Region::Tw];

    pub fn as_str(self) -> &'static str {
        match self {
            Region::Us => "us",
            Region::Eu => "eu",
            Region::Kr => "kr",
            Region::Tw => "tw",
        }
    }

    /// Profile namespace used by the soulbinds endpoint, e.g. `profile-eu`.
    pub fn profile_namespace(self) -> String {
        format!("profile-{}", self.as_str())
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = CovdbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "us" => Ok(Region::Us),
            "eu" => Ok(Region::Eu),
            "kr" => Ok(Region::Kr),
            "tw" => Ok(Region::Tw),
            _ => Err(CovdbError::UnknownRegion(s.to_string())),
        }
    }
}

/// Character faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Horde,
    Alliance,
}

impl Faction {
    pub const ALL: [Faction; 2] = [Faction::Horde, Faction::Alliance];

    pub fn as_str(self) -> &'static str {
        match self {
            Faction::Horde => "horde",
            Faction::Alliance => "alliance",
        }
    }

    /// Single-letter key used by the addon (`ns.dbh`, `ns.dba`).
    pub fn letter(self) -> char {
        match self {
            Faction::Horde => 'h',
            Faction::Alliance => 'a',
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Faction {
    type Err = CovdbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "horde" | "h" => Ok(Faction::Horde),
            "alliance" | "a" => Ok(Faction::Alliance),
            _ => Err(CovdbError::UnknownFaction(s.to_string())),
        }
    }
}

/// One (region, faction) pair, backed by its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Collection {
    pub region: Region,
    pub faction: Faction,
}

impl Collection {
    pub fn new(region: Region, faction: Faction) -> Self {
        Self { region, faction }
    }

    /// All eight collections, region-major, horde before alliance.
    pub fn all() -> impl Iterator<Item = Collection> {
        Region::ALL.into_iter().flat_map(|region| {
            Faction::ALL
                .into_iter()
                .map(move |faction| Collection::new(region, faction))
        })
    }

    /// Table holding this collection's characters, e.g. `characters_eu_horde`.
    pub fn table_name(&self) -> String {
        format!("characters_{}_{}", self.region, self.faction)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.region, self.faction)
    }
}
