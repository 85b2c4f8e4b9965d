//! # Variable Registry
//!
//! Every quantity the evaluator can produce is declared once as a
//! [`VariableDef`]: its name, the entity level it is defined at, the value
//! used when it is neither supplied nor computable (or when re-entry is
//! capped), and optionally a [`Formula`].
//!
//! Variables without a formula are inputs: their value comes from the
//! household description, or the default.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use fisca_core::Period;

use crate::context::EvaluationContext;
use crate::error::{EvalError, EvalResult};
use crate::value::{EntityKind, Holder, Value};

/// Computes one variable for one period.
///
/// Implemented for plain functions and closures with the matching
/// signature, so most formulas are registered as `fn` items.
pub trait Formula: Send + Sync {
    fn compute(&self, ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder>;
}

impl<F> Formula for F
where
    F: Fn(&dyn EvaluationContext, Period) -> EvalResult<Holder> + Send + Sync,
{
    fn compute(&self, ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
        self(ctx, period)
    }
}

/// Declaration of one variable.
#[derive(Clone)]
pub struct VariableDef {
    name: String,
    entity: EntityKind,
    default: Value,
    label: String,
    formula: Option<Arc<dyn Formula>>,
}

impl fmt::Debug for VariableDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableDef")
            .field("name", &self.name)
            .field("entity", &self.entity)
            .field("default", &self.default)
            .field("computed", &self.formula.is_some())
            .finish_non_exhaustive()
    }
}

impl VariableDef {
    /// An input variable: supplied by the household, else `default`.
    pub fn input(name: impl Into<String>, entity: EntityKind, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            entity,
            default: default.into(),
            label: String::new(),
            formula: None,
        }
    }

    /// A computed variable.
    pub fn computed(
        name: impl Into<String>,
        entity: EntityKind,
        default: impl Into<Value>,
        formula: impl Formula + 'static,
    ) -> Self {
        Self {
            formula: Some(Arc::new(formula)),
            ..Self::input(name, entity, default)
        }
    }

    /// Attach a human-readable label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    pub fn default_value(&self) -> Value {
        self.default.clone()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn formula(&self) -> Option<&dyn Formula> {
        self.formula.as_deref()
    }

    pub fn is_computed(&self) -> bool {
        self.formula.is_some()
    }

    /// The default as a holder for a family of `size` members.
    pub fn default_holder(&self, size: usize) -> Holder {
        Holder::filled(self.entity, self.default.clone(), size)
    }
}

/// Name-indexed set of variable declarations.
#[derive(Debug, Clone, Default)]
pub struct VariableRegistry {
    variables: BTreeMap<String, VariableDef>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration.
    ///
    /// # Errors
    ///
    /// [`EvalError::DuplicateVariable`] if the name is taken.
    pub fn register(&mut self, variable: VariableDef) -> EvalResult<()> {
        if self.variables.contains_key(variable.name()) {
            return Err(EvalError::DuplicateVariable {
                name: variable.name,
            });
        }
        self.variables.insert(variable.name.clone(), variable);
        Ok(())
    }

    /// Add or replace a declaration. Used to override a formula with a
    /// different one, e.g. in scenario tests.
    pub fn replace(&mut self, variable: VariableDef) -> Option<VariableDef> {
        self.variables.insert(variable.name.clone(), variable)
    }

    pub fn get(&self, name: &str) -> EvalResult<&VariableDef> {
        self.variables
            .get(name)
            .ok_or_else(|| EvalError::UnknownVariable {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Every declaration, by name.
    pub fn iter(&self) -> impl Iterator<Item = &VariableDef> {
        self.variables.values()
    }

    /// Names of computed variables, by name.
    pub fn computed_names(&self) -> impl Iterator<Item = &str> {
        self.variables
            .values()
            .filter(|v| v.is_computed())
            .map(VariableDef::name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always_one(_: &dyn EvaluationContext, _: Period) -> EvalResult<Holder> {
        Ok(Holder::from(1.0))
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = VariableRegistry::new();
        registry
            .register(VariableDef::input("rent", EntityKind::Family, 0.0))
            .unwrap();
        let err = registry
            .register(VariableDef::input("rent", EntityKind::Family, 0.0))
            .unwrap_err();
        assert!(matches!(err, EvalError::DuplicateVariable { ref name } if name == "rent"));
    }

    #[test]
    fn unknown_lookup_names_the_variable() {
        let registry = VariableRegistry::new();
        let err = registry.get("age").unwrap_err();
        assert_eq!(format!("{err}"), "unknown variable \"age\"");
    }

    #[test]
    fn computed_names_skip_inputs() {
        let mut registry = VariableRegistry::new();
        registry
            .register(VariableDef::input("age", EntityKind::Individual, 0i64))
            .unwrap();
        registry
            .register(VariableDef::computed(
                "one",
                EntityKind::Family,
                0.0,
                always_one,
            ))
            .unwrap();
        assert_eq!(registry.computed_names().collect::<Vec<_>>(), vec!["one"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn default_holder_shape() {
        let var = VariableDef::input("student", EntityKind::Individual, false);
        assert_eq!(
            var.default_holder(2),
            Holder::Members(vec![Value::Bool(false); 2])
        );
    }
}
