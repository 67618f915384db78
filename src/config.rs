//! The editable business rules: how to normalize orders and what to charge for them.

use crate::billing::Charges;
use crate::normalize::RuleSet;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to open configuration file for reading")]
    Open(#[from] std::io::Error),
    #[error("Could not decode the configuration")]
    Decode(#[from] ron::de::SpannedError),
    #[error("Could not encode the configuration")]
    Encode(#[from] ron::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub normalization: RuleSet,
    #[serde(default)]
    pub charges: Charges,
}

impl Config {
    /// Load a configuration from the RON file at `path`.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        Self::from_reader(std::fs::File::open(path)?)
    }

    pub fn from_reader(read: impl std::io::Read) -> Result<Self, Error> {
        Ok(ron::de::from_reader(read)?)
    }

    /// Serialize this instance as pretty RON, suitable for editing.
    pub fn to_ron(&self) -> Result<String, Error> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::new().struct_names(true),
        )?)
    }
}
