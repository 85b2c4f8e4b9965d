//! Housing-specific errors.
//!
//! Formula failures surface as [`EvalError`](fisca_eval::EvalError); the
//! variants here cover the zone tables and configuration, which fail before
//! or outside evaluation.

use std::path::PathBuf;

use fisca_params::ParamsError;
use thiserror::Error;

/// Errors raised while loading or querying zone tables.
#[derive(Debug, Error)]
pub enum ZoneError {
    /// A zone table file could not be read or parsed.
    #[error("failed to load zone table: {0}")]
    Load(#[from] ParamsError),

    /// A zone cell does not start with 1, 2 or 3.
    #[error("locality {code}: invalid zone {value:?} (expected 1, 2 or 3)")]
    InvalidZone { code: String, value: String },

    /// A sub-locality's parent chain never reaches a zoned locality.
    #[error("sub-locality {sublocality}: parent {parent} has no zone")]
    UnknownParent { sublocality: String, parent: String },
}

/// Invalid environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidInteger { var: &'static str, value: String },

    #[error("{var} points to a missing file: {path}")]
    MissingFile { var: &'static str, path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_zone_display() {
        let err = ZoneError::InvalidZone {
            code: "75056".to_string(),
            value: "4".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("75056"));
        assert!(msg.contains("\"4\""));
    }

    #[test]
    fn unknown_parent_display() {
        let err = ZoneError::UnknownParent {
            sublocality: "75101".to_string(),
            parent: "75056".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "sub-locality 75101: parent 75056 has no zone"
        );
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvalidInteger {
            var: "FISCA_MAX_REENTRY_DEPTH",
            value: "-1".to_string(),
        };
        assert!(format!("{err}").contains("FISCA_MAX_REENTRY_DEPTH"));
    }
}
