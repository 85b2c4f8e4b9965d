//! # Evaluation Context
//!
//! What a formula sees while it runs: the family being evaluated, other
//! variables at arbitrary periods, and legislation at arbitrary instants.
//!
//! The four required methods are implemented by
//! [`Simulation`](crate::Simulation). Everything else is a provided helper
//! that fetches a variable and converts or aggregates it, so formulas
//! read as one line per input.
//!
//! ## Bounded self-reference
//!
//! [`EvaluationContext::compute_bounded`] caps how many frames of the same
//! variable may be in flight on the call stack. With `max_reentry = 0` the
//! variable is computed only if it is not already being computed; otherwise
//! its declared default is returned. This is how two benefits that read
//! each other's previous-month value terminate.

use fisca_core::{Family, Instant, Period, Role};
use fisca_params::LegislationSnapshot;

use crate::aggregate::{self, RoleSplit};
use crate::error::{EvalError, EvalResult};
use crate::value::{EntityKind, Holder, Value};

/// Access to variables and legislation during evaluation.
pub trait EvaluationContext {
    /// The family being evaluated.
    fn family(&self) -> &Family;

    /// Value of `name` at `period`.
    fn compute(&self, name: &str, period: Period) -> EvalResult<Holder>;

    /// Value of `name` at `period`, or its default if `name` already has more
    /// than `max_reentry` frames in flight.
    fn compute_bounded(&self, name: &str, period: Period, max_reentry: usize)
        -> EvalResult<Holder>;

    /// Legislation in force at `instant`.
    fn legislation_at(&self, instant: Instant) -> EvalResult<&LegislationSnapshot>;

    // -----------------------------------------------------------------------
    // Legislation helpers
    // -----------------------------------------------------------------------

    /// Plain parameter value at `path`, in force at `instant`.
    fn param(&self, path: &str, instant: Instant) -> EvalResult<f64> {
        Ok(self.legislation_at(instant)?.value(path)?)
    }

    // -----------------------------------------------------------------------
    // Family-level helpers
    // -----------------------------------------------------------------------

    /// A family variable's value.
    fn family_value(&self, name: &str, period: Period) -> EvalResult<Value> {
        family_of(name, self.compute(name, period)?)
    }

    fn float(&self, name: &str, period: Period) -> EvalResult<f64> {
        let value = self.family_value(name, period)?;
        value.as_f64().ok_or_else(|| mismatch(name, "number", &value))
    }

    /// [`float`](Self::float) through
    /// [`compute_bounded`](Self::compute_bounded).
    fn float_bounded(&self, name: &str, period: Period, max_reentry: usize) -> EvalResult<f64> {
        let value = family_of(name, self.compute_bounded(name, period, max_reentry)?)?;
        value.as_f64().ok_or_else(|| mismatch(name, "number", &value))
    }

    fn flag(&self, name: &str, period: Period) -> EvalResult<bool> {
        let value = self.family_value(name, period)?;
        value.as_bool().ok_or_else(|| mismatch(name, "bool", &value))
    }

    fn int(&self, name: &str, period: Period) -> EvalResult<i64> {
        let value = self.family_value(name, period)?;
        value.as_i64().ok_or_else(|| mismatch(name, "int", &value))
    }

    /// A family variable holding a code (text or integer).
    fn code(&self, name: &str, period: Period) -> EvalResult<String> {
        let value = self.family_value(name, period)?;
        value.as_code().ok_or_else(|| mismatch(name, "code", &value))
    }

    // -----------------------------------------------------------------------
    // Member-level helpers
    // -----------------------------------------------------------------------

    /// An individual variable's values, in member order.
    fn members(&self, name: &str, period: Period) -> EvalResult<Vec<Value>> {
        match self.compute(name, period)? {
            Holder::Members(values) => Ok(values),
            Holder::Family(_) => Err(EvalError::EntityMismatch {
                name: name.to_string(),
                expected: EntityKind::Individual,
                found: EntityKind::Family,
            }),
        }
    }

    fn floats(&self, name: &str, period: Period) -> EvalResult<Vec<f64>> {
        self.members(name, period)?
            .iter()
            .map(|v| v.as_f64().ok_or_else(|| mismatch(name, "number", v)))
            .collect()
    }

    fn flags(&self, name: &str, period: Period) -> EvalResult<Vec<bool>> {
        self.members(name, period)?
            .iter()
            .map(|v| v.as_bool().ok_or_else(|| mismatch(name, "bool", v)))
            .collect()
    }

    fn ints(&self, name: &str, period: Period) -> EvalResult<Vec<i64>> {
        self.members(name, period)?
            .iter()
            .map(|v| v.as_i64().ok_or_else(|| mismatch(name, "int", v)))
            .collect()
    }

    /// Sum of an individual variable over members holding one of `roles`.
    fn sum_by_roles(&self, name: &str, period: Period, roles: &[Role]) -> EvalResult<f64> {
        let values = self.floats(name, period)?;
        Ok(aggregate::sum_by_roles(self.family(), &values, roles))
    }

    /// Sum of an individual variable over every member.
    fn sum_all(&self, name: &str, period: Period) -> EvalResult<f64> {
        Ok(aggregate::sum_all(&self.floats(name, period)?))
    }

    /// Whether any member holding one of `roles` has the flag set.
    fn any_by_roles(&self, name: &str, period: Period, roles: &[Role]) -> EvalResult<bool> {
        let values = self.flags(name, period)?;
        Ok(aggregate::any_by_roles(self.family(), &values, roles))
    }

    /// Numeric values split by role.
    fn split_floats(&self, name: &str, period: Period) -> EvalResult<RoleSplit<f64>> {
        let values = self.floats(name, period)?;
        Ok(aggregate::split_by_roles(self.family(), &values))
    }

    /// Flags split by role.
    fn split_flags(&self, name: &str, period: Period) -> EvalResult<RoleSplit<bool>> {
        let values = self.flags(name, period)?;
        Ok(aggregate::split_by_roles(self.family(), &values))
    }

    /// The head's value of an individual variable, as a family value.
    fn head_value(&self, name: &str, period: Period) -> EvalResult<Value> {
        let values = self.members(name, period)?;
        Ok(aggregate::split_by_roles(self.family(), &values).head)
    }
}

fn family_of(name: &str, holder: Holder) -> EvalResult<Value> {
    match holder {
        Holder::Family(value) => Ok(value),
        Holder::Members(_) => Err(EvalError::EntityMismatch {
            name: name.to_string(),
            expected: EntityKind::Family,
            found: EntityKind::Individual,
        }),
    }
}

fn mismatch(name: &str, expected: &'static str, found: &Value) -> EvalError {
    EvalError::TypeMismatch {
        name: name.to_string(),
        expected,
        found: found.type_name(),
    }
}
