#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use fisca_core::Period;
use fisca_eval::{Household, Simulation, VariableRegistry};
use fisca_housing::{housing_registry, ZoneResolver};
use fisca_params::{load_legislation, Legislation};

pub fn legislation() -> Legislation {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/legislation.yaml");
    load_legislation(&path).unwrap()
}

pub fn march() -> Period {
    Period::month(2015, 3).unwrap()
}

pub fn registry(zones: ZoneResolver) -> VariableRegistry {
    housing_registry(Arc::new(zones)).unwrap()
}

pub fn simulate_with(yaml: &str, registry: VariableRegistry) -> Simulation {
    let household: Household = serde_yaml::from_str(yaml).unwrap();
    household
        .into_simulation(Arc::new(registry), Arc::new(legislation()))
        .unwrap()
}

/// Every locality falls back to zone 2.
pub fn simulate(yaml: &str) -> Simulation {
    simulate_with(yaml, registry(ZoneResolver::default()))
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}
