//! End-to-end restructuring of a realistic contribution section into
//! category schedules, both sides.

use std::collections::BTreeMap;

use fisca_core::{Category, Instant};
use fisca_params::contributions::{PATH_EMPLOYEE_SCHEDULES, PATH_EMPLOYER_SCHEDULES};
use fisca_params::{
    preprocess_all, preprocess_legislation, ContributionScheduleBuilder, ContributionSide,
    Legislation, LegislationSnapshot, ParameterNode, ParamsError, Scale, ScaleTree,
};
use serde_json::{json, Value};

const MONTHLY_CEILING: f64 = 3000.0;

fn flat(rate: f64) -> Value {
    json!({ "brackets": [{ "threshold": 0.0, "rate": rate }] })
}

fn two_brackets(low: f64, high: f64) -> Value {
    json!({ "brackets": [
        { "threshold": 0.0, "rate": low },
        { "threshold": 1.0, "rate": high }
    ] })
}

fn employer_raw() -> Value {
    json!({
        "commun": {
            "maladie": flat(0.128),
            "apprentissage": flat(0.0044),
            "apprentissage2": flat(0.0018),
            "vieillesseplaf": flat(0.084),
            "vieillessedeplaf": flat(0.016),
            "formprof": flat(0.0055),
            "chomfg": flat(0.003),
            "construction": flat(0.0045),
            "assedic": flat(0.04),
            "famille": flat(0.054),
            "csa": flat(0.003)
        },
        "noncadre": { "arrco": two_brackets(0.045, 0.12) },
        "cadre": { "agirc": two_brackets(0.0, 0.2) },
        "fonc": {
            "etat": { "pension": flat(0.6214), "rafp": flat(0.05) },
            "colloc": {
                "cnracl": flat(0.2725),
                "rafp": flat(0.05),
                "territoriale": { "cnfpt": flat(0.01) },
                "hospitaliere": { "feh": flat(0.004) }
            },
            "contract": { "ircantec": two_brackets(0.035, 0.12) }
        }
    })
}

fn employee_raw() -> Value {
    json!({
        "commun": {
            "vieillesse": flat(0.068),
            "arrco": flat(0.03),
            "assedic": flat(0.024),
            "csg": flat(0.075)
        },
        "noncadre": { "agff": flat(0.008) },
        "cadre": { "agirc": two_brackets(0.0, 0.077) },
        "fonc": {
            "commun": { "solidarite": flat(0.01) },
            "etat": { "pension": flat(0.0785) },
            "colloc": { "cnracl": flat(0.0785) },
            "contract": { "ircantec": two_brackets(0.0225, 0.0595) }
        }
    })
}

fn tree(value: Value) -> ScaleTree {
    serde_json::from_value(value).unwrap()
}

fn snapshot_with(pat: Value, sal: Value) -> LegislationSnapshot {
    let root: BTreeMap<String, ParameterNode> = serde_json::from_value(json!({
        "cotsoc": {
            "gen": { "plaf_ss": MONTHLY_CEILING },
            "pat": pat,
            "sal": sal
        }
    }))
    .unwrap();
    LegislationSnapshot::new(Instant::from_ymd(2014, 1, 1).unwrap(), root)
}

fn builder() -> ContributionScheduleBuilder {
    ContributionScheduleBuilder::from_monthly_ceiling(MONTHLY_CEILING)
}

fn keys(tree: &ScaleTree) -> Vec<&str> {
    tree.keys().map(String::as_str).collect()
}

// ---------------------------------------------------------------------------
// Employer side
// ---------------------------------------------------------------------------

#[test]
fn employer_schedules_cover_every_category() {
    let schedules = builder().build_employer(&tree(employer_raw())).unwrap();
    let categories: Vec<Category> = schedules.iter().map(|(c, _)| c).collect();
    assert_eq!(categories, Category::all().to_vec());
    for (category, schedule) in schedules.iter() {
        assert!(!schedule.is_empty(), "{category} has no items");
    }
}

#[test]
fn private_categories_include_common_items() {
    let schedules = builder().build_employer(&tree(employer_raw())).unwrap();

    let non_exec = schedules.get(Category::PrivateNonExecutive);
    assert!(non_exec.contains_key("arrco"));
    assert!(non_exec.contains_key("maladie"));
    assert!(non_exec.contains_key("assedic"));
    assert!(!non_exec.contains_key("agirc"));

    let exec = schedules.get(Category::PrivateExecutive);
    assert!(exec.contains_key("agirc"));
    assert!(exec.contains_key("famille"));
    assert!(!exec.contains_key("arrco"));
}

#[test]
fn thresholds_are_scaled_by_the_annual_ceiling() {
    let schedules = builder().build_employer(&tree(employer_raw())).unwrap();
    let arrco: &Scale = schedules
        .get(Category::PrivateNonExecutive)
        .scale("arrco")
        .unwrap();
    assert_eq!(arrco.brackets()[1].threshold, 36_000.0);
    let due = arrco.calc(40_000.0);
    assert!((due - (36_000.0 * 0.045 + 4_000.0 * 0.12)).abs() < 1e-6);
}

#[test]
fn tenured_state_excludes_private_only_items_and_rafp() {
    let schedules = builder().build_employer(&tree(employer_raw())).unwrap();
    let state = schedules.get(Category::PublicTenuredState);
    assert_eq!(keys(state), vec!["csa", "famille", "pension"]);
}

#[test]
fn non_tenured_keeps_health_but_not_training_items() {
    let schedules = builder().build_employer(&tree(employer_raw())).unwrap();
    let contract = schedules.get(Category::PublicNonTenured);
    assert!(contract.contains_key("ircantec"));
    assert!(contract.contains_key("maladie"));
    assert!(contract.contains_key("vieillesseplaf"));
    for excluded in ["apprentissage", "apprentissage2", "formprof", "chomfg", "construction", "assedic"] {
        assert!(!contract.contains_key(excluded), "{excluded} should be excluded");
    }
}

#[test]
fn territorial_and_hospital_keep_only_their_own_items() {
    let schedules = builder().build_employer(&tree(employer_raw())).unwrap();

    let territorial = schedules.get(Category::PublicTenuredTerritorial);
    let hospital = schedules.get(Category::PublicTenuredHospital);
    assert_eq!(keys(territorial), vec!["cnfpt", "cnracl", "csa", "famille", "rafp"]);
    assert_eq!(keys(hospital), vec!["cnracl", "csa", "famille", "feh", "rafp"]);
}

#[test]
fn derived_categories_are_independent() {
    let mut schedules = builder().build_employer(&tree(employer_raw())).unwrap();
    let territorial_before = schedules.get(Category::PublicTenuredTerritorial).clone();
    let state_before = schedules.get(Category::PublicTenuredState).clone();

    schedules
        .get_mut(Category::PublicTenuredHospital)
        .insert("cnracl", Scale::flat(0.5).unwrap());
    schedules
        .get_mut(Category::PublicTenuredMilitary)
        .insert("extra", Scale::flat(0.1).unwrap());

    assert_eq!(schedules.get(Category::PublicTenuredTerritorial), &territorial_before);
    assert_eq!(schedules.get(Category::PublicTenuredState), &state_before);
}

#[test]
fn military_mirrors_state() {
    let schedules = builder().build_employer(&tree(employer_raw())).unwrap();
    assert_eq!(
        schedules.get(Category::PublicTenuredMilitary),
        schedules.get(Category::PublicTenuredState)
    );
}

#[test]
fn raw_tree_is_not_modified() {
    let raw = tree(employer_raw());
    let before = raw.clone();
    builder().build_employer(&raw).unwrap();
    assert_eq!(raw, before);
}

#[test]
fn leftover_section_is_a_structural_mismatch() {
    let mut raw = employer_raw();
    raw["divers"] = json!({ "transport": flat(0.02) });
    let err = builder().build_employer(&tree(raw)).unwrap_err();
    match err {
        ParamsError::StructuralMismatch {
            side,
            missing,
            unexpected,
        } => {
            assert_eq!(side, "employer");
            assert!(missing.is_empty());
            assert_eq!(unexpected, vec!["divers".to_string()]);
        }
        other => panic!("expected StructuralMismatch, got {other:?}"),
    }
}

#[test]
fn leftover_public_section_is_a_structural_mismatch() {
    let mut raw = employer_raw();
    raw["fonc"]["magistrature"] = json!({ "x": flat(0.01) });
    let err = builder().build_employer(&tree(raw)).unwrap_err();
    assert!(matches!(
        err,
        ParamsError::StructuralMismatch { ref unexpected, .. } if unexpected == &vec!["fonc".to_string()]
    ));
}

#[test]
fn missing_excluded_item_is_key_not_found() {
    let mut raw = employer_raw();
    raw["commun"]
        .as_object_mut()
        .unwrap()
        .remove("construction");
    let err = builder().build_employer(&tree(raw)).unwrap_err();
    match err {
        ParamsError::KeyNotFound { key, .. } => assert_eq!(key, "construction"),
        other => panic!("expected KeyNotFound, got {other:?}"),
    }
}

#[test]
fn missing_section_is_key_not_found() {
    let mut raw = employer_raw();
    raw.as_object_mut().unwrap().remove("cadre");
    let err = builder().build_employer(&tree(raw)).unwrap_err();
    assert!(matches!(err, ParamsError::KeyNotFound { ref key, .. } if key == "cadre"));
}

// ---------------------------------------------------------------------------
// Employee side
// ---------------------------------------------------------------------------

#[test]
fn employee_schedules_cover_every_category() {
    let schedules = builder().build_employee(&tree(employee_raw())).unwrap();
    assert_eq!(schedules.iter().count(), Category::all().len());
}

#[test]
fn solidarity_surcharge_applies_to_public_categories_only() {
    let schedules = builder().build_employee(&tree(employee_raw())).unwrap();
    for (category, schedule) in schedules.iter() {
        assert_eq!(
            schedule.contains_key("excep_solidarite"),
            category.is_public(),
            "{category}"
        );
        assert!(!schedule.contains_key("solidarite"), "{category}");
    }
}

#[test]
fn non_tenured_employee_replaces_private_pension_and_unemployment() {
    let schedules = builder().build_employee(&tree(employee_raw())).unwrap();
    let contract = schedules.get(Category::PublicNonTenured);
    assert_eq!(
        keys(contract),
        vec!["csg", "excep_solidarite", "ircantec", "vieillesse"]
    );
}

#[test]
fn tenured_employee_schedules_do_not_receive_common_items() {
    let schedules = builder().build_employee(&tree(employee_raw())).unwrap();
    let state = schedules.get(Category::PublicTenuredState);
    assert_eq!(keys(state), vec!["excep_solidarite", "pension"]);
    assert_eq!(
        schedules.get(Category::PublicTenuredHospital),
        schedules.get(Category::PublicTenuredTerritorial)
    );
}

#[test]
fn missing_solidarity_is_key_not_found() {
    let mut raw = employee_raw();
    raw["fonc"]["commun"] = json!({});
    let err = builder().build_employee(&tree(raw)).unwrap_err();
    assert!(matches!(err, ParamsError::KeyNotFound { ref key, .. } if key == "solidarite"));
}

#[test]
fn leftover_employee_section_names_the_side() {
    let mut raw = employee_raw();
    raw["divers"] = json!({ "x": flat(0.01) });
    let err = builder().build_employee(&tree(raw)).unwrap_err();
    assert!(matches!(
        err,
        ParamsError::StructuralMismatch { ref side, .. } if side == "employee"
    ));
}

// ---------------------------------------------------------------------------
// Legislation preprocessing
// ---------------------------------------------------------------------------

#[test]
fn preprocessing_publishes_both_sides() {
    let snapshot = snapshot_with(employer_raw(), employee_raw());
    let processed = preprocess_legislation(&snapshot).unwrap();

    let agirc = processed
        .scale(&format!("{PATH_EMPLOYER_SCHEDULES}.prive_cadre.agirc"))
        .unwrap();
    assert_eq!(agirc.brackets()[1].threshold, 36_000.0);
    processed
        .scale(&format!(
            "{PATH_EMPLOYEE_SCHEDULES}.public_titulaire_militaire.excep_solidarite"
        ))
        .unwrap();

    // The input snapshot is untouched.
    assert!(snapshot.lookup(PATH_EMPLOYER_SCHEDULES).is_err());
    assert_eq!(
        ContributionSide::Employee.schedules_path(),
        PATH_EMPLOYEE_SCHEDULES
    );
}

#[test]
fn preprocessing_requires_the_monthly_ceiling() {
    let mut root = snapshot_with(employer_raw(), employee_raw()).root().clone();
    if let Some(ParameterNode::Tree(cotsoc)) = root.get_mut("cotsoc") {
        cotsoc.remove("gen");
    }
    let snapshot = LegislationSnapshot::new(Instant::MIN, root);
    let err = preprocess_legislation(&snapshot).unwrap_err();
    assert!(matches!(err, ParamsError::ParameterNotFound { ref path, .. } if path == "cotsoc.gen.plaf_ss"));
}

#[test]
fn preprocessing_every_version() {
    let first = snapshot_with(employer_raw(), employee_raw());
    let legislation = Legislation::new(vec![first]);
    let processed = preprocess_all(&legislation).unwrap();
    assert_eq!(processed.versions().len(), 1);
    processed
        .lookup(
            &format!("{PATH_EMPLOYER_SCHEDULES}.public_non_titulaire.ircantec"),
            Instant::from_ymd(2015, 6, 1).unwrap(),
        )
        .unwrap();
}
