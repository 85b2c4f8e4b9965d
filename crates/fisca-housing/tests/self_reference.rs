//! The minimum-income benefit and the housing benefit reading each other.

mod common;

use common::{assert_close, march, registry, simulate_with};
use fisca_core::Period;
use fisca_eval::{EntityKind, EvalError, EvalResult, EvaluationContext, Holder, VariableDef};
use fisca_housing::formulas::*;
use fisca_housing::ZoneResolver;

const HOUSEHOLD: &str = r#"
family:
  id: f
  members:
    - { id: h, role: head }
inputs:
  age: 30
  individual_resources: 8000
  rent: 400
  occupancy_status: 4
periods:
  "2013":
    taxable_salary: 1000
"#;

/// A minimum income that tops up whatever the housing benefit leaves.
fn minimum_income(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    let housing = ctx.float(HOUSING_BENEFIT, period.this_month())?;
    Ok(Holder::from((500.0 - housing).max(0.0)))
}

fn co_dependent() -> fisca_eval::Simulation {
    let mut registry = registry(ZoneResolver::default());
    let previous = registry.replace(VariableDef::computed(
        MINIMUM_INCOME_BENEFIT,
        EntityKind::Family,
        0.0,
        minimum_income,
    ));
    assert!(previous.is_some());
    simulate_with(HOUSEHOLD, registry)
}

#[test]
fn housing_first_reads_last_month_minimum_income() {
    let sim = co_dependent();
    let m = march();

    let benefit = sim.float(HOUSING_BENEFIT, m).unwrap();
    // February's minimum income was computed one level down, where its own
    // lookback hit the cap and saw 0.
    assert_close(sim.float(MINIMUM_INCOME_BENEFIT, m.previous_month()).unwrap(), 420.40);
    assert_eq!(sim.float(HOUSING_NEUTRALIZATION, m).unwrap(), 900.0);
    assert_eq!(sim.float(HOUSING_RESOURCE_BASE, m).unwrap(), 7100.0);
    assert!(benefit > 79.60);
    assert_eq!(sim.stack_depth(), 0);
}

#[test]
fn minimum_income_first_gets_declared_default() {
    let sim = co_dependent();
    let m = march();

    // minimum income (Mar) -> housing (Mar) -> minimum income (Feb) is a
    // re-entry beyond depth 0, so this housing benefit saw no neutralization.
    assert_close(sim.float(MINIMUM_INCOME_BENEFIT, m).unwrap(), 420.40);
    // Nothing computed under that default was kept: asked directly, the
    // neutralization reads February's real minimum income.
    assert_eq!(sim.float(HOUSING_NEUTRALIZATION, m).unwrap(), 900.0);
    assert_eq!(sim.stack_depth(), 0);
}

#[test]
fn housing_benefit_does_not_depend_on_query_order() {
    let m = march();
    let fresh = co_dependent().float(HOUSING_BENEFIT, m).unwrap();

    let sim = co_dependent();
    sim.float(MINIMUM_INCOME_BENEFIT, m).unwrap();
    assert_eq!(sim.float(HOUSING_BENEFIT, m).unwrap(), fresh);
    assert_eq!(sim.float(HOUSING_RESOURCE_BASE, m).unwrap(), 7100.0);
}

#[test]
fn whole_report_terminates() {
    let sim = co_dependent();
    let all = sim.compute_all(march()).unwrap();
    assert!(all.iter().any(|(name, _)| name == MINIMUM_INCOME_BENEFIT));
    assert_eq!(sim.stack_depth(), 0);
}

#[test]
fn misshapen_minimum_income_is_reported() {
    let mut per_member = registry(ZoneResolver::default());
    per_member.replace(VariableDef::input(MINIMUM_INCOME_BENEFIT, EntityKind::Individual, 0.0));
    let sim = simulate_with(HOUSEHOLD, per_member);
    let err = sim.float(HOUSING_NEUTRALIZATION, march()).unwrap_err();
    assert!(
        matches!(err, EvalError::EntityMismatch { ref name, .. } if name == MINIMUM_INCOME_BENEFIT)
    );

    let mut boolean = registry(ZoneResolver::default());
    boolean.replace(VariableDef::input(MINIMUM_INCOME_BENEFIT, EntityKind::Family, false));
    let sim = simulate_with(HOUSEHOLD, boolean);
    let err = sim.float(HOUSING_NEUTRALIZATION, march()).unwrap_err();
    assert!(matches!(err, EvalError::TypeMismatch { ref name, .. } if name == MINIMUM_INCOME_BENEFIT));
}
