//! Termination of mutually dependent variables under the re-entry policy.

use std::sync::Arc;

use fisca_core::{Family, Period};
use fisca_eval::{
    EntityKind, EvalError, EvalResult, EvaluationContext, Holder, Simulation, VariableDef,
    VariableRegistry,
};
use fisca_params::Legislation;
use proptest::prelude::*;

fn march() -> Period {
    Period::month(2015, 3).unwrap()
}

fn simulation(vars: Vec<VariableDef>) -> Simulation {
    let mut registry = VariableRegistry::new();
    for v in vars {
        registry.register(v).unwrap();
    }
    Simulation::new(
        Family::single("f", "h"),
        Arc::new(registry),
        Arc::new(Legislation::default()),
    )
}

/// Housing aid reads last month's minimum income with re-entry capped at 0.
fn housing(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    let min_income_last_month = ctx
        .compute_bounded("min_income", period.previous_month(), 0)?
        .as_family()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    Ok(Holder::from(200.0 - 0.1 * min_income_last_month))
}

/// Minimum income depends on the housing aid of the same month.
fn min_income(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    Ok(Holder::from(500.0 - ctx.float("housing", period)?))
}

fn co_dependent() -> Simulation {
    simulation(vec![
        VariableDef::computed("housing", EntityKind::Family, 0.0, housing),
        VariableDef::computed("min_income", EntityKind::Family, 0.0, min_income),
    ])
}

#[test]
fn housing_first_terminates_one_level_down() {
    let sim = co_dependent();
    // housing(Feb) sees the default for min_income(Jan): 200.
    // min_income(Feb) = 300, so housing(Mar) = 200 - 30.
    assert_eq!(sim.float("housing", march()).unwrap(), 170.0);
    assert_eq!(sim.stack_depth(), 0);
}

#[test]
fn min_income_first_terminates_immediately() {
    let sim = co_dependent();
    // min_income(Mar) -> housing(Mar) -> min_income(Feb) is a re-entry.
    assert_eq!(sim.float("min_income", march()).unwrap(), 300.0);
}

#[test]
fn values_computed_under_a_default_are_not_cached() {
    let sim = co_dependent();
    // housing(Mar) is evaluated here with min_income(Feb) cut to its default.
    assert_eq!(sim.float("min_income", march()).unwrap(), 300.0);
    // Asked directly, housing(Mar) reads the real min_income(Feb).
    assert_eq!(sim.float("housing", march()).unwrap(), 170.0);
    assert_eq!(sim.stack_depth(), 0);
}

#[test]
fn query_order_does_not_change_results() {
    let fresh = co_dependent().float("housing", march()).unwrap();
    let sim = co_dependent();
    sim.float("min_income", march()).unwrap();
    sim.float("min_income", march().previous_month()).unwrap();
    assert_eq!(sim.float("housing", march()).unwrap(), fresh);
}

fn ping(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    ctx.compute("pong", period)
}

fn pong(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    ctx.compute("ping", period)
}

#[test]
fn exact_cycle_without_bound_is_reported() {
    let sim = simulation(vec![
        VariableDef::computed("ping", EntityKind::Family, 0.0, ping),
        VariableDef::computed("pong", EntityKind::Family, 0.0, pong),
    ]);
    let err = sim.compute("ping", march()).unwrap_err();
    match err {
        EvalError::CycleDetected { name, period } => {
            assert_eq!(name, "ping");
            assert_eq!(period, march());
        }
        other => panic!("expected CycleDetected, got {other:?}"),
    }
    assert_eq!(sim.stack_depth(), 0);
}

#[test]
fn exact_cycle_with_simulation_default_uses_declared_default() {
    let sim = simulation(vec![
        VariableDef::computed("ping", EntityKind::Family, 0.0, ping),
        VariableDef::computed("pong", EntityKind::Family, 42.0, pong),
    ])
    .with_default_max_reentry(Some(0));
    // ping -> pong -> ping (re-entry, default 0.0) -> pong returns 0.0.
    assert_eq!(sim.float("ping", march()).unwrap(), 0.0);
}

fn chain_variable(max_reentry: usize) -> VariableDef {
    VariableDef::computed(
        "chain",
        EntityKind::Family,
        0.0,
        move |ctx: &dyn EvaluationContext, period: Period| -> EvalResult<Holder> {
            let below = ctx
                .compute_bounded("chain", period.previous_month(), max_reentry)?
                .as_family()
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0);
            Ok(Holder::from(below + 1.0))
        },
    )
}

proptest! {
    #[test]
    fn bounded_chain_depth_is_bound_plus_one(max_reentry in 0usize..24) {
        let sim = simulation(vec![chain_variable(max_reentry)]);
        let depth = sim.float("chain", march()).unwrap();
        prop_assert_eq!(depth, (max_reentry + 1) as f64);
        prop_assert_eq!(sim.stack_depth(), 0);
    }
}
