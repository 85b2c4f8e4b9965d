//! # Error Types
//!
//! Errors raised while constructing core values. Everything here is a
//! validation failure on external input (legislation files, household
//! descriptions, CLI arguments); none of it is recoverable by retrying.

use thiserror::Error;

/// Top-level error type for `fisca-core`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A period or instant string could not be parsed or is out of range.
    #[error("invalid period {input:?}: {reason}")]
    InvalidPeriod {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A category identifier is not one of the seven known categories.
    #[error("unknown employment category: {0:?}")]
    UnknownCategory(String),

    /// A role identifier is not recognised.
    #[error("unknown family role: {0:?}")]
    UnknownRole(String),

    /// A family composition violates the one-head / one-partner rule.
    #[error("invalid family {family}: {reason}")]
    InvalidFamily {
        /// Identifier of the offending family.
        family: String,
        /// The violated rule.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_period_display() {
        let err = CoreError::InvalidPeriod {
            input: "2015-13".to_string(),
            reason: "month out of range".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("2015-13"));
        assert!(msg.contains("month out of range"));
    }

    #[test]
    fn invalid_family_display() {
        let err = CoreError::InvalidFamily {
            family: "fam-1".to_string(),
            reason: "no head".to_string(),
        };
        assert!(format!("{err}").contains("fam-1"));
    }
}
