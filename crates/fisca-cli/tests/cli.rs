//! Subcommand handlers against the fixtures and ad-hoc files.

use std::io::Write;
use std::path::{Path, PathBuf};

use fisca_cli::housing::{housing_report, HousingArgs};
use fisca_cli::ZoneTableArgs;
use fisca_core::Period;
use fisca_eval::{Holder, Value};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn household_file(yaml: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

fn args(household: &Path, variables: &[&str]) -> HousingArgs {
    HousingArgs {
        legislation: fixture("legislation.yaml"),
        household: household.to_path_buf(),
        period: Period::month(2015, 3).unwrap(),
        variables: variables.iter().map(|v| v.to_string()).collect(),
        max_reentry: None,
        zones: ZoneTableArgs {
            zones: Some(fixture("zones.yaml")),
            sublocalities: Some(fixture("sublocalities.json")),
        },
    }
}

#[test]
fn single_tenant_in_zone_two() {
    let file = household_file(
        r#"
family:
  id: solo
  members:
    - { id: h, role: head }
inputs:
  age: 30
  individual_resources: 8000
  rent: 400
  occupancy_status: 4
  locality_code: "69123"
"#,
    );
    let report = housing_report(&args(file.path(), &["housing_zone", "housing_benefit"])).unwrap();
    assert_eq!(report.values["housing_zone"], Holder::Family(Value::Int(2)));
    assert_eq!(report.values["housing_benefit"], Holder::Family(Value::Float(79.60)));
}

#[test]
fn owner_occupier_receives_nothing() {
    let file = household_file(
        r#"
family:
  id: owner
  members:
    - { id: h, role: head }
inputs:
  age: 50
  rent: 400
  occupancy_status: 2
"#,
    );
    let report = housing_report(&args(file.path(), &["housing_benefit", "housing_crds"])).unwrap();
    assert_eq!(report.values["housing_benefit"], Holder::Family(Value::Float(0.0)));
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["values"]["housing_crds"].to_string(), "0.0");
}

#[test]
fn input_for_stranger_is_rejected() {
    let file = household_file(
        r#"
family:
  id: f
  members:
    - { id: h, role: head }
inputs:
  age: { nobody: 30 }
"#,
    );
    let err = housing_report(&args(file.path(), &[])).unwrap_err();
    assert!(format!("{err:#}").contains("nobody"));
}

#[test]
fn missing_household_names_the_file() {
    let err = housing_report(&args(Path::new("/nonexistent/household.yaml"), &[])).unwrap_err();
    assert!(format!("{err:#}").contains("/nonexistent/household.yaml"));
}
