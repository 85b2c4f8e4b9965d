//! Housing configuration from the environment.
//!
//! Variables:
//! - `FISCA_ZONE_TABLE`: locality → zone table (YAML or JSON). Unset means
//!   every locality falls back to the default zone.
//! - `FISCA_SUBLOCALITY_TABLE`: sub-locality → parent locality table.
//! - `FISCA_MAX_REENTRY_DEPTH`: re-entry bound for evaluator calls that do
//!   not set one. Unset means exact cycles are errors.

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::zone::ZoneSource;

pub const ENV_ZONE_TABLE: &str = "FISCA_ZONE_TABLE";
pub const ENV_SUBLOCALITY_TABLE: &str = "FISCA_SUBLOCALITY_TABLE";
pub const ENV_MAX_REENTRY_DEPTH: &str = "FISCA_MAX_REENTRY_DEPTH";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HousingConfig {
    pub zone_table: Option<PathBuf>,
    pub sublocality_table: Option<PathBuf>,
    pub max_reentry_depth: Option<usize>,
}

impl HousingConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let path = |var: &'static str| -> Result<Option<PathBuf>, ConfigError> {
            match lookup(var).filter(|v| !v.is_empty()) {
                None => Ok(None),
                Some(raw) => {
                    let path = PathBuf::from(raw);
                    if path.is_file() {
                        Ok(Some(path))
                    } else {
                        Err(ConfigError::MissingFile { var, path })
                    }
                }
            }
        };
        let max_reentry_depth = match lookup(ENV_MAX_REENTRY_DEPTH).filter(|v| !v.is_empty()) {
            None => None,
            Some(raw) => Some(raw.trim().parse::<usize>().map_err(|_| {
                ConfigError::InvalidInteger {
                    var: ENV_MAX_REENTRY_DEPTH,
                    value: raw.clone(),
                }
            })?),
        };

        Ok(Self {
            zone_table: path(ENV_ZONE_TABLE)?,
            sublocality_table: path(ENV_SUBLOCALITY_TABLE)?,
            max_reentry_depth,
        })
    }

    /// Where the zone resolver loads its tables from.
    pub fn zone_source(&self) -> ZoneSource {
        ZoneSource {
            zone_table: self.zone_table.clone(),
            sublocality_table: self.sublocality_table.clone(),
        }
    }
}
