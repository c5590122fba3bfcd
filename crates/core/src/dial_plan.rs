//! Mapping between the history domain's bare national numbers and the
//! registry domain's full serial numbers.
//!
//! The country calling code concatenation is the only linkage between the two
//! domains, so it lives in one explicit value object instead of ad-hoc string
//! formatting at call sites.

use serde::{Deserialize, Serialize};

/// Default country calling code (Colombia).
pub const DEFAULT_COUNTRY_CODE: &str = "57";

/// Converts between bare national phone numbers and registry `sn` values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialPlan {
    country_code: String,
}

impl Default for DialPlan {
    fn default() -> Self {
        Self { country_code: DEFAULT_COUNTRY_CODE.to_owned() }
    }
}

impl DialPlan {
    #[must_use]
    pub fn new(country_code: impl Into<String>) -> Self {
        Self { country_code: country_code.into() }
    }

    /// The raw calling-code prefix, for SQL join boundaries.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.country_code
    }

    /// Full serial number for a bare national number: `"57" + "3001234567"`.
    #[must_use]
    pub fn to_sn(&self, national: &str) -> String {
        let mut sn = String::with_capacity(self.country_code.len() + national.len());
        sn.push_str(&self.country_code);
        sn.push_str(national.trim());
        sn
    }

    /// Bare national number for an `sn`, if it carries this plan's prefix.
    #[must_use]
    pub fn national<'a>(&self, sn: &'a str) -> Option<&'a str> {
        sn.strip_prefix(self.country_code.as_str())
    }
}
