//! Barring categories and directions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Direction of a barring category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outgoing,
    Incoming,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Outgoing => f.write_str("outgoing"),
            Direction::Incoming => f.write_str("incoming"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "outgoing" | "out" => Ok(Direction::Outgoing),
            "incoming" | "in" => Ok(Direction::Incoming),
            other => Err(format!("Unknown direction: {}", other)),
        }
    }
}

/// Supplementary-service barring facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarringCategory {
    /// Bar all outgoing calls (BAOC)
    OutgoingAllCalls,
    /// Bar outgoing international calls (BAOIC)
    OutgoingInternational,
    /// Bar outgoing international calls except to the home country (BAOIC-exHC)
    OutgoingInternationalExceptHome,
    /// Bar all incoming calls (BAIC)
    IncomingAll,
    /// Bar incoming calls when roaming (BAIC-Roam)
    IncomingWhenRoaming,
    /// All barring services; only used to cancel everything or change the password
    AllBarring,
}

impl BarringCategory {
    /// Every category with a direction, in scan order
    pub const DIRECTIONAL: [BarringCategory; 5] = [
        BarringCategory::OutgoingAllCalls,
        BarringCategory::OutgoingInternational,
        BarringCategory::OutgoingInternationalExceptHome,
        BarringCategory::IncomingAll,
        BarringCategory::IncomingWhenRoaming,
    ];

    /// Direction this category bars, `None` for [`BarringCategory::AllBarring`]
    pub fn direction(self) -> Option<Direction> {
        match self {
            BarringCategory::OutgoingAllCalls
            | BarringCategory::OutgoingInternational
            | BarringCategory::OutgoingInternationalExceptHome => Some(Direction::Outgoing),
            BarringCategory::IncomingAll | BarringCategory::IncomingWhenRoaming => {
                Some(Direction::Incoming)
            }
            BarringCategory::AllBarring => None,
        }
    }

    /// Short name used on the command line
    pub fn short_name(self) -> &'static str {
        match self {
            BarringCategory::OutgoingAllCalls => "baoc",
            BarringCategory::OutgoingInternational => "baoic",
            BarringCategory::OutgoingInternationalExceptHome => "baoicxh",
            BarringCategory::IncomingAll => "baic",
            BarringCategory::IncomingWhenRoaming => "baicr",
            BarringCategory::AllBarring => "all",
        }
    }
}

impl fmt::Display for BarringCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BarringCategory::OutgoingAllCalls => "All outgoing calls",
            BarringCategory::OutgoingInternational => "International calls",
            BarringCategory::OutgoingInternationalExceptHome => {
                "International calls except home country"
            }
            BarringCategory::IncomingAll => "All incoming calls",
            BarringCategory::IncomingWhenRoaming => "Incoming calls when roaming",
            BarringCategory::AllBarring => "All barring",
        };
        f.write_str(s)
    }
}

impl FromStr for BarringCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        [
            BarringCategory::OutgoingAllCalls,
            BarringCategory::OutgoingInternational,
            BarringCategory::OutgoingInternationalExceptHome,
            BarringCategory::IncomingAll,
            BarringCategory::IncomingWhenRoaming,
            BarringCategory::AllBarring,
        ]
        .into_iter()
        .find(|c| c.short_name() == lower)
        .ok_or_else(|| format!("Unknown barring category: {}", s))
    }
}
