//! Jurisdiction tax identifiers.
//!
//! A tax id is kept as an opaque string. Only its first two characters are
//! interpreted: they name the jurisdiction that issued it. No checksum or
//! format validation is performed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque jurisdiction tax identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxId(String);

impl TaxId {
    /// Wraps a raw identifier, trimming surrounding whitespace
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    /// Wraps an optional identifier; blank strings become `None`
    #[must_use]
    pub fn from_optional(raw: Option<&str>) -> Option<Self> {
        raw.map(Self::new).filter(|id| !id.is_blank())
    }

    /// The identifier as stored
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the identifier is empty
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }

    /// The two-character jurisdiction prefix, if the id is long enough
    #[must_use]
    pub fn jurisdiction_code(&self) -> Option<&str> {
        self.0.get(..2)
    }

    /// Name of the jurisdiction encoded in the prefix, if known
    #[must_use]
    pub fn jurisdiction_name(&self) -> Option<&'static str> {
        self.jurisdiction_code().and_then(jurisdiction_name)
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const JURISDICTIONS: &[(&str, &str)] = &[
    ("01", "JAMMU AND KASHMIR"),
    ("02", "HIMACHAL PRADESH"),
    ("03", "PUNJAB"),
    ("04", "CHANDIGARH"),
    ("05", "UTTARAKHAND"),
    ("06", "HARYANA"),
    ("07", "DELHI"),
    ("08", "RAJASTHAN"),
    ("09", "UTTAR PRADESH"),
    ("10", "BIHAR"),
    ("11", "SIKKIM"),
    ("12", "ARUNACHAL PRADESH"),
    ("13", "NAGALAND"),
    ("14", "MANIPUR"),
    ("15", "MIZORAM"),
    ("16", "TRIPURA"),
    ("17", "MEGHALAYA"),
    ("18", "ASSAM"),
    ("19", "WEST BENGAL"),
    ("20", "JHARKHAND"),
    ("21", "ODISHA"),
    ("22", "CHHATTISGARH"),
    ("23", "MADHYA PRADESH"),
    ("24", "GUJARAT"),
    ("25", "DAMAN AND DIU"),
    ("26", "DADRA AND NAGAR HAVELI"),
    ("27", "MAHARASHTRA"),
    ("29", "KARNATAKA"),
    ("30", "GOA"),
    ("31", "LAKSHADWEEP"),
    ("32", "KERALA"),
    ("33", "TAMIL NADU"),
    ("34", "PUDUCHERRY"),
    ("35", "ANDAMAN AND NICOBAR ISLANDS"),
    ("36", "TELANGANA"),
    ("37", "ANDHRA PRADESH"),
    ("38", "LADAKH"),
    ("97", "OTHER TERRITORY"),
    ("99", "CENTRE JURISDICTION"),
];

/// Looks up the jurisdiction name for a two-character code
#[must_use]
pub fn jurisdiction_name(code: &str) -> Option<&'static str> {
    JURISDICTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}
