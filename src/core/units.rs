//! Units of measure for line-item quantities.
//!
//! Quantities default to grams. Labels follow the printed-invoice convention:
//! `"10.500 gm"` for a quantity and `"4500.000 / g"` for a rate.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unit in which a line item's quantity is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Unit {
    /// Grams (`gm`)
    #[default]
    Gram,
    /// Kilograms (`kg`)
    Kilogram,
    /// Countable pieces (`pcs`)
    Piece,
}

impl Unit {
    /// Storage code of the unit
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gram => "gm",
            Self::Kilogram => "kg",
            Self::Piece => "pcs",
        }
    }

    /// Suffix used after a quantity
    #[must_use]
    pub const fn quantity_suffix(self) -> &'static str {
        match self {
            Self::Gram => " gm",
            Self::Kilogram => " kg",
            Self::Piece => " pcs",
        }
    }

    /// Suffix used after a per-unit rate
    #[must_use]
    pub const fn rate_suffix(self) -> &'static str {
        match self {
            Self::Gram => " / g",
            Self::Kilogram => " / kg",
            Self::Piece => " / pc",
        }
    }

    /// Grams per unit, `None` for units that are not weights
    #[must_use]
    pub const fn grams_per_unit(self) -> Option<Decimal> {
        match self {
            Self::Gram => Some(dec!(1)),
            Self::Kilogram => Some(dec!(1000)),
            Self::Piece => None,
        }
    }

    /// Formats a quantity with three decimals and the unit suffix
    #[must_use]
    pub fn quantity_label(self, quantity: Decimal) -> String {
        format!("{}{}", fixed3(quantity), self.quantity_suffix())
    }

    /// Formats a rate with three decimals and the per-unit suffix
    #[must_use]
    pub fn rate_label(self, rate: Decimal) -> String {
        format!("{}{}", fixed3(rate), self.rate_suffix())
    }

    /// Quantity normalised to grams
    #[must_use]
    pub fn quantity_in_grams(self, quantity: Decimal) -> Option<Decimal> {
        self.grams_per_unit()
            .and_then(|factor| quantity.checked_mul(factor))
    }

    /// Rate normalised to a price per gram
    #[must_use]
    pub fn rate_per_gram(self, rate: Decimal) -> Option<Decimal> {
        self.grams_per_unit()
            .and_then(|factor| rate.checked_div(factor))
            .map(|r| r.round_dp(6))
    }
}

/// Renders a decimal with exactly three fractional digits
fn fixed3(value: Decimal) -> String {
    let mut v = value.round_dp(3);
    v.rescale(3);
    v.to_string()
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gm" | "g" | "gram" | "grams" => Ok(Self::Gram),
            "kg" | "kilogram" | "kilograms" => Ok(Self::Kilogram),
            "pcs" | "pc" | "piece" | "pieces" => Ok(Self::Piece),
            _ => Err(Error::InvalidUnit {
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Unit {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.as_str().to_string()
    }
}
