//! Parameter-tree error types.
//!
//! Every variant is fatal to the computation that raised it: a missing
//! parameter or a restructuring mismatch signals a defect in legislation
//! data or in the restructuring logic, never a transient condition.

use std::path::PathBuf;

use fisca_core::Instant;
use thiserror::Error;

/// Errors that can occur while loading, querying, or restructuring
/// parameter trees.
#[derive(Debug, Error)]
pub enum ParamsError {
    /// A dotted legislation path does not exist at the requested instant.
    #[error("parameter {path:?} not found at {instant}")]
    ParameterNotFound { path: String, instant: Instant },

    /// No legislation version is in force at the requested instant.
    #[error("no legislation in force at {instant}")]
    NoLegislationInForce { instant: Instant },

    /// A node exists but has the wrong shape (value vs scale vs subtree).
    #[error("parameter {path:?} is not a {expected}")]
    UnexpectedNode { path: String, expected: &'static str },

    /// `ScaleTree::remove` (or a rename/take) on an absent key.
    #[error("key {key:?} not found (available: {available:?})")]
    KeyNotFound { key: String, available: Vec<String> },

    /// The restructured schedule set does not match the category enumeration.
    #[error("{side} schedules do not match the category set: missing {missing:?}, unexpected {unexpected:?}")]
    StructuralMismatch {
        side: String,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// A bracket schedule violates its construction invariants.
    #[error("invalid scale: {reason}")]
    InvalidScale { reason: String },

    /// YAML parsing failed.
    #[error("failed to parse YAML at {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// JSON parsing failed.
    #[error("failed to parse JSON at {path}: {source}")]
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A required file was not found.
    #[error("required file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The file extension does not identify a supported format.
    #[error("unsupported file format for {path} (expected .yaml, .yml or .json)")]
    UnsupportedFormat { path: PathBuf },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for parameter operations.
pub type ParamsResult<T> = Result<T, ParamsError>;

impl ParamsError {
    /// `KeyNotFound` listing the keys that were available instead.
    pub fn key_not_found<'a>(key: &str, available: impl Iterator<Item = &'a String>) -> Self {
        Self::KeyNotFound {
            key: key.to_string(),
            available: available.cloned().collect(),
        }
    }
}
