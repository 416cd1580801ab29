//! Settings loading from `taxbill.toml`.
//!
//! The settings file supplies the last tier of line-item default resolution:
//! the tax rate, classification code and unit used when neither the input row
//! nor the product catalog provides one.

use crate::core::units::Unit;
use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::Path;

/// Default settings file name, resolved against the working directory
pub const DEFAULT_SETTINGS_PATH: &str = "taxbill.toml";

/// Tax rate applied when nothing more specific is known
pub const DEFAULT_TAX_RATE: Decimal = dec!(0.03);

/// Classification code applied when nothing more specific is known
pub const DEFAULT_CLASSIFICATION_CODE: &str = "711319";

/// Entire settings file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Fallback values for line items
    #[serde(default)]
    pub defaults: LineItemDefaults,
}

/// Fallback values for line-item fields
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LineItemDefaults {
    /// Tax rate as a fraction in [0, 1]
    pub tax_rate: Decimal,
    /// Commodity classification code
    pub classification_code: String,
    /// Unit of measure for quantities
    pub unit: Unit,
}

impl Default for LineItemDefaults {
    fn default() -> Self {
        Self {
            tax_rate: DEFAULT_TAX_RATE,
            classification_code: DEFAULT_CLASSIFICATION_CODE.to_string(),
            unit: Unit::default(),
        }
    }
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read settings file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse settings file: {e}"),
    })
}

/// Loads settings from `path` when it exists, otherwise returns the built-in defaults.
pub fn load_settings_or_default<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    if path.exists() {
        load_settings(path)
    } else {
        tracing::debug!("No settings file at {:?}, using built-in defaults", path);
        Ok(Settings::default())
    }
}
