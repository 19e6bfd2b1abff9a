//! Legislative district identifiers
//!
//! Districts are identified as `<STATE>-<Chamber>-<NNN>`, e.g. `SC-House-042`
//! or `SC-Senate-007`. Parsing never fails loudly: malformed input yields
//! `None` and the caller decides whether to skip or log.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Legislative chamber
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Chamber {
    House,
    Senate,
}

impl Chamber {
    /// All chambers in display order
    pub const ALL: [Chamber; 2] = [Chamber::House, Chamber::Senate];

    /// Parse a chamber label (case-insensitive)
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "house" => Some(Chamber::House),
            "senate" => Some(Chamber::Senate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Chamber::House => "House",
            Chamber::Senate => "Senate",
        }
    }

    /// Every chamber as a set, the usual discovery scope
    pub fn all() -> BTreeSet<Chamber> {
        Self::ALL.into_iter().collect()
    }
}

impl fmt::Display for Chamber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed district identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DistrictId {
    state: String,
    chamber: Chamber,
    number: u16,
}

impl DistrictId {
    /// Build a district id from parts
    ///
    /// Returns `None` if the state is not two ASCII letters or the number is
    /// outside 1..=999.
    pub fn new(state: &str, chamber: Chamber, number: u16) -> Option<Self> {
        let valid_state = state.len() == 2 && state.chars().all(|c| c.is_ascii_alphabetic());
        if !valid_state || number == 0 || number > 999 {
            return None;
        }

        Some(Self {
            state: state.to_ascii_uppercase(),
            chamber,
            number,
        })
    }

    /// Parse `<STATE>-<House|Senate>-<NNN>`
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.trim().split('-');
        let state = parts.next()?;
        let chamber = parts.next()?;
        let number = parts.next()?;
        if parts.next().is_some() {
            return None;
        }

        if state.len() != 2 || !state.chars().all(|c| c.is_ascii_uppercase()) {
            return None;
        }

        let chamber = match chamber {
            "House" => Chamber::House,
            "Senate" => Chamber::Senate,
            _ => return None,
        };

        if number.len() != 3 || !number.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let number: u16 = number.parse().ok()?;

        Self::new(state, chamber, number)
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn chamber(&self) -> Chamber {
        self.chamber
    }

    pub fn number(&self) -> u16 {
        self.number
    }
}

impl fmt::Display for DistrictId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{:03}", self.state, self.chamber, self.number)
    }
}

impl From<DistrictId> for String {
    fn from(id: DistrictId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for DistrictId {
    type Error = crate::Error;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        DistrictId::parse(&raw)
            .ok_or_else(|| crate::Error::InvalidInput(format!("malformed district id '{}'", raw)))
    }
}

/// Set of districts a discovery run is responsible for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictScope {
    /// Two-letter state code
    pub state: String,
    /// Number of House seats
    pub house_seats: u16,
    /// Number of Senate seats
    pub senate_seats: u16,
}

impl Default for DistrictScope {
    fn default() -> Self {
        // South Carolina General Assembly
        Self {
            state: "SC".to_string(),
            house_seats: 124,
            senate_seats: 46,
        }
    }
}

impl DistrictScope {
    pub fn new(state: impl Into<String>, house_seats: u16, senate_seats: u16) -> Self {
        Self {
            state: state.into(),
            house_seats,
            senate_seats,
        }
    }

    /// Seat count for one chamber
    pub fn seats(&self, chamber: Chamber) -> u16 {
        match chamber {
            Chamber::House => self.house_seats,
            Chamber::Senate => self.senate_seats,
        }
    }

    /// Enumerate every district of the given chambers, in id order
    pub fn districts(&self, chambers: &BTreeSet<Chamber>) -> Vec<DistrictId> {
        chambers
            .iter()
            .flat_map(|&chamber| {
                (1..=self.seats(chamber).min(999))
                    .filter_map(move |n| DistrictId::new(&self.state, chamber, n))
            })
            .collect()
    }

    /// Total district count for the given chambers
    pub fn total(&self, chambers: &BTreeSet<Chamber>) -> usize {
        self.districts(chambers).len()
    }
}
