//! # Simulation
//!
//! Evaluates variables for one family. A simulation owns the household's
//! supplied inputs and a memo of computed values, and shares the registry
//! and legislation with every other simulation.
//!
//! ## Call stack
//!
//! Every formula invocation pushes a `(variable, period)` frame for its
//! duration. Before pushing, the evaluator applies the re-entry policy:
//!
//! | `max_reentry` | frames of the variable in flight | outcome |
//! |---------------|----------------------------------|---------|
//! | `Some(n)`     | more than `n`                    | declared default, not memoized |
//! | `Some(n)`     | `n` or fewer                     | evaluate |
//! | `None`        | exact `(variable, period)` frame | [`EvalError::CycleDetected`] |
//! | `None`        | otherwise                        | evaluate |
//!
//! A substituted default taints every frame in flight at that moment.
//! Tainted frames return their value to the caller but are never memoized,
//! so a later query for the same `(variable, period)` evaluates it afresh
//! and results do not depend on query order.
//!
//! An explicit bound passed to [`EvaluationContext::compute_bounded`] takes
//! precedence over the simulation-wide default set with
//! [`Simulation::with_default_max_reentry`].
//!
//! A simulation is single-threaded (interior mutability through
//! `RefCell`). Independent households run in independent simulations.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use fisca_core::{Family, Instant, Period};
use fisca_params::{Legislation, LegislationSnapshot};

use crate::context::EvaluationContext;
use crate::error::{EvalError, EvalResult};
use crate::registry::{VariableDef, VariableRegistry};
use crate::value::{EntityKind, Holder, Value};

type Key = (String, Period);

/// One in-flight formula invocation.
#[derive(Debug)]
struct Frame {
    key: Key,
    /// Set when a re-entry default was substituted below this frame.
    tainted: bool,
}

/// Supplied values for one input variable.
#[derive(Debug, Clone, Default)]
struct InputSeries {
    /// Applies to every period without a specific value.
    constant: Option<Holder>,
    by_period: HashMap<Period, Holder>,
}

impl InputSeries {
    fn at(&self, period: Period) -> Option<&Holder> {
        self.by_period.get(&period).or(self.constant.as_ref())
    }
}

/// Per-family evaluator.
#[derive(Debug)]
pub struct Simulation {
    family: Family,
    registry: Arc<VariableRegistry>,
    legislation: Arc<Legislation>,
    inputs: HashMap<String, InputSeries>,
    memo: RefCell<HashMap<Key, Holder>>,
    stack: RefCell<Vec<Frame>>,
    default_max_reentry: Option<usize>,
}

impl Simulation {
    pub fn new(
        family: Family,
        registry: Arc<VariableRegistry>,
        legislation: Arc<Legislation>,
    ) -> Self {
        Self {
            family,
            registry,
            legislation,
            inputs: HashMap::new(),
            memo: RefCell::new(HashMap::new()),
            stack: RefCell::new(Vec::new()),
            default_max_reentry: None,
        }
    }

    /// Re-entry bound applied to [`EvaluationContext::compute`] calls.
    /// `None` makes exact cycles an error.
    pub fn with_default_max_reentry(mut self, max_reentry: Option<usize>) -> Self {
        self.default_max_reentry = max_reentry;
        self
    }

    pub fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    pub fn legislation(&self) -> &Legislation {
        &self.legislation
    }

    /// Supply `holder` as the value of `name` at `period`.
    ///
    /// # Errors
    ///
    /// [`EvalError::UnknownVariable`], or [`EvalError::EntityMismatch`] /
    /// [`EvalError::InvalidInput`] if the holder does not fit the variable
    /// and family.
    pub fn set_input(&mut self, name: &str, period: Period, holder: Holder) -> EvalResult<()> {
        self.check_shape(name, &holder)?;
        self.inputs
            .entry(name.to_string())
            .or_default()
            .by_period
            .insert(period, holder);
        self.memo.get_mut().clear();
        Ok(())
    }

    /// Supply `holder` as the value of `name` at every period that has no
    /// specific value.
    pub fn set_constant(&mut self, name: &str, holder: Holder) -> EvalResult<()> {
        self.check_shape(name, &holder)?;
        self.inputs.entry(name.to_string()).or_default().constant = Some(holder);
        self.memo.get_mut().clear();
        Ok(())
    }

    /// Number of frames currently in flight. Zero between top-level calls.
    pub fn stack_depth(&self) -> usize {
        self.stack.borrow().len()
    }

    fn check_shape(&self, name: &str, holder: &Holder) -> EvalResult<()> {
        let variable = self.registry.get(name)?;
        if holder.entity() != variable.entity() {
            return Err(EvalError::EntityMismatch {
                name: name.to_string(),
                expected: variable.entity(),
                found: holder.entity(),
            });
        }
        if let Holder::Members(values) = holder {
            if values.len() != self.family.len() {
                return Err(EvalError::InvalidInput {
                    name: name.to_string(),
                    reason: format!(
                        "{} values for a family of {}",
                        values.len(),
                        self.family.len()
                    ),
                });
            }
        }
        Ok(())
    }

    fn evaluate(&self, name: &str, period: Period, max_reentry: Option<usize>) -> EvalResult<Holder> {
        let variable = self.registry.get(name)?;

        if let Some(holder) = self.inputs.get(name).and_then(|s| s.at(period)) {
            return Ok(holder.clone());
        }
        let key = (name.to_string(), period);
        if let Some(holder) = self.memo.borrow().get(&key) {
            return Ok(holder.clone());
        }
        let Some(formula) = variable.formula() else {
            return Ok(variable.default_holder(self.family.len()));
        };

        if let Some(holder) = self.check_reentry(variable, period, max_reentry)? {
            return Ok(holder);
        }

        tracing::trace!(variable = name, %period, depth = self.stack_depth(), "enter");
        self.stack.borrow_mut().push(Frame {
            key: key.clone(),
            tainted: false,
        });
        let result = formula.compute(self, period);
        let tainted = self.stack.borrow_mut().pop().is_some_and(|f| f.tainted);
        let holder = result?;

        self.check_shape(name, &holder)?;
        if tainted {
            tracing::trace!(variable = name, %period, "computed under a re-entry default, not memoized");
        } else {
            self.memo.borrow_mut().insert(key, holder.clone());
        }
        Ok(holder)
    }

    /// `Some(default)` if the re-entry policy forbids evaluating now.
    fn check_reentry(
        &self,
        variable: &VariableDef,
        period: Period,
        max_reentry: Option<usize>,
    ) -> EvalResult<Option<Holder>> {
        let mut stack = self.stack.borrow_mut();
        match max_reentry.or(self.default_max_reentry) {
            Some(max) => {
                let in_flight = stack.iter().filter(|f| f.key.0 == variable.name()).count();
                if in_flight > max {
                    tracing::warn!(
                        variable = variable.name(),
                        %period,
                        in_flight,
                        max_reentry = max,
                        "re-entry cap reached, using declared default"
                    );
                    for frame in stack.iter_mut() {
                        frame.tainted = true;
                    }
                    return Ok(Some(variable.default_holder(self.family.len())));
                }
                Ok(None)
            }
            None => {
                if stack
                    .iter()
                    .any(|f| f.key.0 == variable.name() && f.key.1 == period)
                {
                    return Err(EvalError::CycleDetected {
                        name: variable.name().to_string(),
                        period,
                    });
                }
                Ok(None)
            }
        }
    }

    /// Computed values of every registered computed variable at `period`,
    /// by name. Used for reporting.
    pub fn compute_all(&self, period: Period) -> EvalResult<Vec<(String, Holder)>> {
        self.registry
            .computed_names()
            .map(|name| Ok((name.to_string(), self.compute(name, period)?)))
            .collect()
    }
}

impl EvaluationContext for Simulation {
    fn family(&self) -> &Family {
        &self.family
    }

    fn compute(&self, name: &str, period: Period) -> EvalResult<Holder> {
        self.evaluate(name, period, None)
    }

    fn compute_bounded(
        &self,
        name: &str,
        period: Period,
        max_reentry: usize,
    ) -> EvalResult<Holder> {
        self.evaluate(name, period, Some(max_reentry))
    }

    fn legislation_at(&self, instant: Instant) -> EvalResult<&LegislationSnapshot> {
        Ok(self.legislation.at(instant)?)
    }
}

impl Simulation {
    /// Supply one value per member, in member order.
    pub fn set_member_values(
        &mut self,
        name: &str,
        period: Period,
        values: Vec<impl Into<Value>>,
    ) -> EvalResult<()> {
        let holder = Holder::Members(values.into_iter().map(Into::into).collect());
        self.set_input(name, period, holder)
    }

    pub fn entity_of(&self, name: &str) -> EvalResult<EntityKind> {
        Ok(self.registry.get(name)?.entity())
    }
}
