//! Reader configuration

use crate::Result;
use serde::{Deserialize, Serialize};

/// Tunables for [`CMemoryReader`](crate::CMemoryReader)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Longest string length accepted from the backend's length query.
    /// Longer lengths are treated as "no string". Unlimited when unset.
    pub max_string_length: Option<u64>,
}

impl ReaderOptions {
    /// Parse options from a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn with_max_string_length(mut self, max: u64) -> Self {
        self.max_string_length = Some(max);
        self
    }

    /// Whether a length reported by the backend is within bounds
    pub fn accepts_string_length(&self, length: u64) -> bool {
        self.max_string_length.map_or(true, |max| length <= max)
    }
}
