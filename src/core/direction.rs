//! Invoice direction and report direction filters.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether an invoice records a sale or a purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Direction {
    /// Sales invoice raised by the business
    Outward,
    /// Purchase invoice received by the business
    Inward,
}

impl Direction {
    /// Storage code of the direction
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Outward => "outward",
            Self::Inward => "inward",
        }
    }

    /// Section title used in reports
    #[must_use]
    pub const fn supply_label(self) -> &'static str {
        match self {
            Self::Outward => "Outward Supply",
            Self::Inward => "Inward Supply",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "outward" | "outbound" => Ok(Self::Outward),
            "inward" | "inbound" => Ok(Self::Inward),
            _ => Err(Error::InvalidDirection {
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Direction {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Direction> for String {
    fn from(direction: Direction) -> Self {
        direction.as_str().to_string()
    }
}

/// Which directions a report should materialise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectionFilter {
    /// Sales only
    Outward,
    /// Purchases only
    Inward,
    /// Both, outward first
    #[default]
    Both,
}

impl DirectionFilter {
    /// Directions selected by this filter, in report order
    #[must_use]
    pub fn directions(self) -> &'static [Direction] {
        match self {
            Self::Outward => &[Direction::Outward],
            Self::Inward => &[Direction::Inward],
            Self::Both => &[Direction::Outward, Direction::Inward],
        }
    }

    /// Whether `direction` is selected
    #[must_use]
    pub fn includes(self, direction: Direction) -> bool {
        self.directions().contains(&direction)
    }
}

impl FromStr for DirectionFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("both") {
            return Ok(Self::Both);
        }
        match s.parse::<Direction>()? {
            Direction::Outward => Ok(Self::Outward),
            Direction::Inward => Ok(Self::Inward),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_direction_round_trips_storage_code() {
        for direction in [Direction::Outward, Direction::Inward] {
            assert_eq!(direction.as_str().parse::<Direction>().unwrap(), direction);
        }
        assert_eq!("Outbound".parse::<Direction>().unwrap(), Direction::Outward);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_filter_directions() {
        assert_eq!(
            "both".parse::<DirectionFilter>().unwrap().directions(),
            &[Direction::Outward, Direction::Inward]
        );
        let inward = "inbound".parse::<DirectionFilter>().unwrap();
        assert!(inward.includes(Direction::Inward));
        assert!(!inward.includes(Direction::Outward));
    }
}
