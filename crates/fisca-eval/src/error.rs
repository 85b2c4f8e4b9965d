//! Evaluation error types.
//!
//! Re-entry beyond a configured depth is not an error: the evaluator
//! substitutes the variable's default and carries on. [`EvalError::CycleDetected`]
//! is raised only for an exact `(variable, period)` cycle with no depth
//! configured at all.

use fisca_core::{CoreError, Period};
use fisca_params::ParamsError;
use thiserror::Error;

use crate::value::EntityKind;

/// Errors raised while registering or evaluating variables.
#[derive(Debug, Error)]
pub enum EvalError {
    /// No variable with this name is registered.
    #[error("unknown variable {name:?}")]
    UnknownVariable { name: String },

    /// A variable was registered twice.
    #[error("variable {name:?} is already registered")]
    DuplicateVariable { name: String },

    /// A `(variable, period)` pair was re-entered while already on the
    /// call stack and no re-entry depth was configured.
    #[error("circular definition: {name} at {period} depends on itself")]
    CycleDetected { name: String, period: Period },

    /// A value did not have the type the caller asked for.
    #[error("variable {name:?}: expected {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A value was computed or supplied for the wrong entity level.
    #[error("variable {name:?} is defined per {expected}, got a {found} value")]
    EntityMismatch {
        name: String,
        expected: EntityKind,
        found: EntityKind,
    },

    /// Household input refers to an unknown member or has the wrong length.
    #[error("invalid input for {name:?}: {reason}")]
    InvalidInput { name: String, reason: String },

    /// Legislation lookup failed.
    #[error(transparent)]
    Params(#[from] ParamsError),

    /// Core value construction failed.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type alias for evaluation.
pub type EvalResult<T> = Result<T, EvalError>;
