//! Household descriptions: a family plus its supplied input values.
//!
//! ```yaml
//! family:
//!   id: dupont
//!   members:
//!     - { id: anne, role: head }
//!     - { id: leo, role: child }
//! inputs:              # valid for every period
//!   rent: 450
//!   age: { anne: 34, leo: 6 }
//! periods:             # valid for one period only
//!   "2014-12":
//!     taxable_salary: { anne: 1200 }
//!   "2013":
//!     taxable_salary: { anne: 14400 }
//! ```
//!
//! An individual variable given a single value applies it to every member;
//! members missing from a per-member map take the variable's default.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use fisca_core::{Family, IndividualId, Period};
use fisca_params::Legislation;
use serde::{Deserialize, Serialize};

use crate::context::EvaluationContext;
use crate::error::{EvalError, EvalResult};
use crate::registry::{VariableDef, VariableRegistry};
use crate::simulation::Simulation;
use crate::value::{EntityKind, Holder, Value};

/// A supplied value, before it is matched against its variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Scalar(Value),
    PerMember(BTreeMap<String, Value>),
}

impl InputValue {
    fn to_holder(&self, variable: &VariableDef, family: &Family) -> EvalResult<Holder> {
        match (variable.entity(), self) {
            (EntityKind::Family, Self::Scalar(v)) => Ok(Holder::Family(v.clone())),
            (EntityKind::Family, Self::PerMember(_)) => Err(EvalError::EntityMismatch {
                name: variable.name().to_string(),
                expected: EntityKind::Family,
                found: EntityKind::Individual,
            }),
            (EntityKind::Individual, Self::Scalar(v)) => Ok(Holder::Members(vec![v.clone(); family.len()])),
            (EntityKind::Individual, Self::PerMember(by_id)) => {
                if let Some(stranger) = by_id
                    .keys()
                    .find(|id| family.position_of(&IndividualId((*id).clone())).is_none())
                {
                    return Err(EvalError::InvalidInput {
                        name: variable.name().to_string(),
                        reason: format!("{stranger:?} is not a member of family {}", family.id()),
                    });
                }
                Ok(Holder::Members(
                    family
                        .members()
                        .iter()
                        .map(|m| by_id.get(&m.id.0).cloned().unwrap_or_else(|| variable.default_value()))
                        .collect(),
                ))
            }
        }
    }
}

/// A family and its supplied inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Household {
    pub family: Family,
    #[serde(default)]
    pub inputs: BTreeMap<String, InputValue>,
    #[serde(default)]
    pub periods: HashMap<Period, BTreeMap<String, InputValue>>,
}

impl Household {
    /// Load from a YAML or JSON file.
    pub fn load(path: &Path) -> EvalResult<Self> {
        Ok(fisca_params::load_typed(path)?)
    }

    /// A simulation of this household with every input applied.
    ///
    /// # Errors
    ///
    /// [`EvalError::UnknownVariable`] for an input name the registry does
    /// not declare, and shape errors as for [`Simulation::set_input`].
    pub fn into_simulation(
        self,
        registry: Arc<VariableRegistry>,
        legislation: Arc<Legislation>,
    ) -> EvalResult<Simulation> {
        let mut holders = Vec::new();
        for (name, value) in &self.inputs {
            let variable = registry.get(name)?;
            holders.push((name.clone(), None, value.to_holder(variable, &self.family)?));
        }
        for (period, values) in &self.periods {
            for (name, value) in values {
                let variable = registry.get(name)?;
                holders.push((name.clone(), Some(*period), value.to_holder(variable, &self.family)?));
            }
        }

        let mut simulation = Simulation::new(self.family, registry, legislation);
        for (name, period, holder) in holders {
            match period {
                Some(period) => simulation.set_input(&name, period, holder)?,
                None => simulation.set_constant(&name, holder)?,
            }
        }
        tracing::debug!(family = %simulation.family().id(), "household inputs applied");
        Ok(simulation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUSEHOLD: &str = r#"
family:
  id: dupont
  members:
    - { id: anne, role: head }
    - { id: leo, role: child }
inputs:
  rent: 450
  age: { anne: 34, leo: 6 }
  student: false
periods:
  "2014-12":
    salary: { anne: 1200 }
"#;

    fn registry() -> Arc<VariableRegistry> {
        let mut r = VariableRegistry::new();
        r.register(VariableDef::input("rent", EntityKind::Family, 0.0)).unwrap();
        r.register(VariableDef::input("age", EntityKind::Individual, 0i64)).unwrap();
        r.register(VariableDef::input("student", EntityKind::Individual, false)).unwrap();
        r.register(VariableDef::input("salary", EntityKind::Individual, 0.0)).unwrap();
        Arc::new(r)
    }

    #[test]
    fn yaml_household_becomes_simulation() {
        let household: Household = serde_yaml::from_str(HOUSEHOLD).unwrap();
        let sim = household
            .into_simulation(registry(), Arc::new(Legislation::default()))
            .unwrap();
        let dec = Period::month(2014, 12).unwrap();
        let jan = Period::month(2015, 1).unwrap();

        assert_eq!(sim.float("rent", jan).unwrap(), 450.0);
        assert_eq!(sim.ints("age", jan).unwrap(), vec![34, 6]);
        assert_eq!(sim.flags("student", jan).unwrap(), vec![false, false]);
        assert_eq!(sim.floats("salary", dec).unwrap(), vec![1200.0, 0.0]);
        assert_eq!(sim.floats("salary", jan).unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn unknown_member_is_rejected() {
        let yaml = HOUSEHOLD.replace("leo: 6", "zoe: 6");
        let household: Household = serde_yaml::from_str(&yaml).unwrap();
        let err = household
            .into_simulation(registry(), Arc::new(Legislation::default()))
            .unwrap_err();
        assert!(matches!(err, EvalError::InvalidInput { ref name, .. } if name == "age"));
    }

    #[test]
    fn unknown_variable_is_rejected() {
        let yaml = HOUSEHOLD.replace("rent: 450", "loyer: 450");
        let household: Household = serde_yaml::from_str(&yaml).unwrap();
        let err = household
            .into_simulation(registry(), Arc::new(Legislation::default()))
            .unwrap_err();
        assert!(matches!(err, EvalError::UnknownVariable { ref name } if name == "loyer"));
    }

    #[test]
    fn per_member_map_for_family_variable_is_rejected() {
        let yaml = HOUSEHOLD.replace("rent: 450", "rent: { anne: 450 }");
        let household: Household = serde_yaml::from_str(&yaml).unwrap();
        let err = household
            .into_simulation(registry(), Arc::new(Legislation::default()))
            .unwrap_err();
        assert!(matches!(err, EvalError::EntityMismatch { .. }));
    }
}
