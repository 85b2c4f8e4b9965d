//! # Contribution Schedule Builder
//!
//! Legislation publishes social-contribution scales by legislative section:
//!
//! ```text
//! cotsoc.pat / cotsoc.sal
//! ├── commun          shared by several sectors
//! ├── noncadre        private sector, non-executive
//! ├── cadre           private sector, executive
//! └── fonc            public sector
//!     ├── commun      (employee side) public-only items, incl. `solidarite`
//!     ├── etat        tenured state employees
//!     ├── colloc      tenured local-authority employees
//!     │   ├── territoriale   items specific to territorial staff
//!     │   └── hospitaliere   items specific to hospital staff
//!     └── contract    non-tenured public employees
//! ```
//!
//! Salary computations need the opposite view: for a given employment
//! [`Category`], every scale that applies. [`ContributionScheduleBuilder`]
//! restructures the raw sections into one [`ScaleTree`] per category, for
//! the employer side and the employee side.
//!
//! ## Invariants
//!
//! - The output key set is exactly the seven categories; any leftover
//!   section or missing category is a [`ParamsError::StructuralMismatch`]
//!   and no partial schedule is returned.
//! - Every category owns its tree. Categories derived from the same source
//!   section (territorial/hospital, state/military) are independent copies.
//! - Inputs are never mutated: the raw tree is borrowed and scaled into a
//!   fresh tree before restructuring.

use std::collections::BTreeSet;
use std::fmt;

use fisca_core::Category;
use serde::{Deserialize, Serialize};

use crate::error::{ParamsError, ParamsResult};
use crate::legislation::{Legislation, LegislationSnapshot, ParameterNode};
use crate::tree::ScaleTree;

// ---------------------------------------------------------------------------
// Raw legislation layout
// ---------------------------------------------------------------------------

/// Monthly social-security ceiling.
pub const PATH_MONTHLY_CEILING: &str = "cotsoc.gen.plaf_ss";
/// Raw employer scales.
pub const PATH_EMPLOYER_RAW: &str = "cotsoc.pat";
/// Raw employee scales.
pub const PATH_EMPLOYEE_RAW: &str = "cotsoc.sal";
/// Where preprocessed employer schedules are published.
pub const PATH_EMPLOYER_SCHEDULES: &str = "cotsoc.cotisations_patronales";
/// Where preprocessed employee schedules are published.
pub const PATH_EMPLOYEE_SCHEDULES: &str = "cotsoc.cotisations_salariales";

const COMMON: &str = "commun";
const NON_EXECUTIVE: &str = "noncadre";
const EXECUTIVE: &str = "cadre";
const PUBLIC: &str = "fonc";
const PUBLIC_COMMON: &str = "commun";
const STATE: &str = "etat";
const LOCAL_AUTHORITY: &str = "colloc";
const CONTRACT: &str = "contract";
const TERRITORIAL_OWN: &str = "territoriale";
const HOSPITAL_OWN: &str = "hospitaliere";

/// Supplementary public pension fund; not levied on tenured state staff.
const SUPPLEMENTARY_PENSION_FUND: &str = "rafp";
const SOLIDARITY: &str = "solidarite";
const SOLIDARITY_SURCHARGE: &str = "excep_solidarite";

/// Employer items of the common section that do not apply to tenured
/// public employees.
const EMPLOYER_NOT_FOR_TENURED: [&str; 9] = [
    "maladie",
    "apprentissage",
    "apprentissage2",
    "vieillesseplaf",
    "vieillessedeplaf",
    "formprof",
    "chomfg",
    "construction",
    "assedic",
];

/// Employer items that do not apply to non-tenured public contracts.
const EMPLOYER_NOT_FOR_CONTRACT: [&str; 6] = [
    "apprentissage",
    "apprentissage2",
    "formprof",
    "chomfg",
    "construction",
    "assedic",
];

/// Employee items of the common section replaced by the public
/// non-tenured scheme (complementary pension, unemployment insurance).
const EMPLOYEE_NOT_FOR_NON_TENURED: [&str; 2] = ["arrco", "assedic"];

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Which party pays the contributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionSide {
    Employer,
    Employee,
}

impl ContributionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employer => "employer",
            Self::Employee => "employee",
        }
    }

    /// Legislation path where this side's schedules are published.
    pub fn schedules_path(&self) -> &'static str {
        match self {
            Self::Employer => PATH_EMPLOYER_SCHEDULES,
            Self::Employee => PATH_EMPLOYEE_SCHEDULES,
        }
    }
}

impl fmt::Display for ContributionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One exclusively-owned schedule per [`Category`].
///
/// A struct with one field per category rather than a keyed map: building
/// one without every category is a compile error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySchedules {
    #[serde(rename = "prive_non_cadre")]
    pub private_non_executive: ScaleTree,
    #[serde(rename = "prive_cadre")]
    pub private_executive: ScaleTree,
    #[serde(rename = "public_titulaire_etat")]
    pub public_tenured_state: ScaleTree,
    #[serde(rename = "public_titulaire_militaire")]
    pub public_tenured_military: ScaleTree,
    #[serde(rename = "public_titulaire_territoriale")]
    pub public_tenured_territorial: ScaleTree,
    #[serde(rename = "public_titulaire_hospitaliere")]
    pub public_tenured_hospital: ScaleTree,
    #[serde(rename = "public_non_titulaire")]
    pub public_non_tenured: ScaleTree,
}

impl CategorySchedules {
    /// Convert a restructured tree whose top-level keys must be exactly the
    /// category identifiers.
    ///
    /// # Errors
    ///
    /// [`ParamsError::StructuralMismatch`] listing missing and unexpected
    /// keys; [`ParamsError::UnexpectedNode`] if a category key holds a
    /// scale instead of a subtree.
    pub fn from_tree(side: ContributionSide, mut tree: ScaleTree) -> ParamsResult<Self> {
        let expected: BTreeSet<&str> = Category::all().iter().map(|c| c.as_str()).collect();
        let actual: BTreeSet<&str> = tree.keys().map(String::as_str).collect();
        if expected != actual {
            return Err(ParamsError::StructuralMismatch {
                side: side.to_string(),
                missing: expected.difference(&actual).map(|s| s.to_string()).collect(),
                unexpected: actual.difference(&expected).map(|s| s.to_string()).collect(),
            });
        }

        let mut take = |c: Category| tree.take_subtree(c.as_str());
        Ok(Self {
            private_non_executive: take(Category::PrivateNonExecutive)?,
            private_executive: take(Category::PrivateExecutive)?,
            public_tenured_state: take(Category::PublicTenuredState)?,
            public_tenured_military: take(Category::PublicTenuredMilitary)?,
            public_tenured_territorial: take(Category::PublicTenuredTerritorial)?,
            public_tenured_hospital: take(Category::PublicTenuredHospital)?,
            public_non_tenured: take(Category::PublicNonTenured)?,
        })
    }

    pub fn get(&self, category: Category) -> &ScaleTree {
        match category {
            Category::PrivateNonExecutive => &self.private_non_executive,
            Category::PrivateExecutive => &self.private_executive,
            Category::PublicTenuredState => &self.public_tenured_state,
            Category::PublicTenuredMilitary => &self.public_tenured_military,
            Category::PublicTenuredTerritorial => &self.public_tenured_territorial,
            Category::PublicTenuredHospital => &self.public_tenured_hospital,
            Category::PublicNonTenured => &self.public_non_tenured,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut ScaleTree {
        match category {
            Category::PrivateNonExecutive => &mut self.private_non_executive,
            Category::PrivateExecutive => &mut self.private_executive,
            Category::PublicTenuredState => &mut self.public_tenured_state,
            Category::PublicTenuredMilitary => &mut self.public_tenured_military,
            Category::PublicTenuredTerritorial => &mut self.public_tenured_territorial,
            Category::PublicTenuredHospital => &mut self.public_tenured_hospital,
            Category::PublicNonTenured => &mut self.public_non_tenured,
        }
    }

    /// Schedules in canonical category order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &ScaleTree)> {
        Category::all().iter().map(move |c| (*c, self.get(*c)))
    }

    /// Back to a keyed tree (category identifier → schedule).
    pub fn to_scale_tree(&self) -> ScaleTree {
        self.iter()
            .map(|(c, tree)| (c.as_str().to_string(), tree.clone().into()))
            .collect()
    }
}

/// Employer and employee schedules for one legislation version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionScheduleSet {
    pub employer: CategorySchedules,
    pub employee: CategorySchedules,
}

impl ContributionScheduleSet {
    pub fn side(&self, side: ContributionSide) -> &CategorySchedules {
        match side {
            ContributionSide::Employer => &self.employer,
            ContributionSide::Employee => &self.employee,
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Restructures raw legislative sections into category-indexed schedules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContributionScheduleBuilder {
    annual_ceiling: f64,
}

impl ContributionScheduleBuilder {
    /// `annual_ceiling` converts ceiling-relative thresholds to amounts.
    pub fn new(annual_ceiling: f64) -> Self {
        Self { annual_ceiling }
    }

    /// From the legislated monthly ceiling (annual = 12 × monthly).
    pub fn from_monthly_ceiling(monthly_ceiling: f64) -> Self {
        Self::new(12.0 * monthly_ceiling)
    }

    pub fn annual_ceiling(&self) -> f64 {
        self.annual_ceiling
    }

    /// Build the employer-side schedules.
    pub fn build_employer(&self, raw: &ScaleTree) -> ParamsResult<CategorySchedules> {
        let mut pat = raw.scaled(self.annual_ceiling)?;

        let common = pat.take_subtree(COMMON)?;
        let private_non_executive = pat.take_subtree(NON_EXECUTIVE)?.merge(&common);
        let private_executive = pat.take_subtree(EXECUTIVE)?.merge(&common);

        let mut public = pat.take_subtree(PUBLIC)?;
        let public_non_tenured = public
            .take_subtree(CONTRACT)?
            .merge(&common)
            .without(&EMPLOYER_NOT_FOR_CONTRACT)?;

        let tenured_common = common.without(&EMPLOYER_NOT_FOR_TENURED)?;
        let public_tenured_state = public
            .take_subtree(STATE)?
            .merge(&tenured_common)
            .without(&[SUPPLEMENTARY_PENSION_FUND])?;
        let local_authority = public.take_subtree(LOCAL_AUTHORITY)?.merge(&tenured_common);
        let (public_tenured_territorial, public_tenured_hospital) =
            split_local_authority(local_authority)?;
        let public_tenured_military = public_tenured_state.deep_copy();

        let schedules = assemble(
            ContributionSide::Employer,
            pat,
            public,
            [
                (Category::PrivateNonExecutive, private_non_executive),
                (Category::PrivateExecutive, private_executive),
                (Category::PublicTenuredState, public_tenured_state),
                (Category::PublicTenuredMilitary, public_tenured_military),
                (Category::PublicTenuredTerritorial, public_tenured_territorial),
                (Category::PublicTenuredHospital, public_tenured_hospital),
                (Category::PublicNonTenured, public_non_tenured),
            ],
        )?;
        log_schedules(ContributionSide::Employer, &schedules);
        Ok(schedules)
    }

    /// Build the employee-side schedules.
    pub fn build_employee(&self, raw: &ScaleTree) -> ParamsResult<CategorySchedules> {
        let mut sal = raw.scaled(self.annual_ceiling)?;

        let common = sal.take_subtree(COMMON)?;
        let private_non_executive = sal.take_subtree(NON_EXECUTIVE)?.merge(&common);
        let private_executive = sal.take_subtree(EXECUTIVE)?.merge(&common);

        let mut public = sal.take_subtree(PUBLIC)?;
        let mut public_common = public.take_subtree(PUBLIC_COMMON)?;
        let solidarity = public_common.remove(SOLIDARITY)?;
        let with_solidarity = |tree: ScaleTree| tree.with_entry(SOLIDARITY_SURCHARGE, solidarity.clone());

        let public_tenured_state = with_solidarity(public.take_subtree(STATE)?);
        let local_authority = with_solidarity(public.take_subtree(LOCAL_AUTHORITY)?);
        let (public_tenured_territorial, public_tenured_hospital) =
            split_local_authority(local_authority)?;
        let public_non_tenured = with_solidarity(public.take_subtree(CONTRACT)?)
            .merge(&common)
            .without(&EMPLOYEE_NOT_FOR_NON_TENURED)?;
        let public_tenured_military = public_tenured_state.deep_copy();

        let schedules = assemble(
            ContributionSide::Employee,
            sal,
            public,
            [
                (Category::PrivateNonExecutive, private_non_executive),
                (Category::PrivateExecutive, private_executive),
                (Category::PublicTenuredState, public_tenured_state),
                (Category::PublicTenuredMilitary, public_tenured_military),
                (Category::PublicTenuredTerritorial, public_tenured_territorial),
                (Category::PublicTenuredHospital, public_tenured_hospital),
                (Category::PublicNonTenured, public_non_tenured),
            ],
        )?;
        log_schedules(ContributionSide::Employee, &schedules);
        Ok(schedules)
    }

    /// Build both sides from a legislation snapshot.
    pub fn build_from_snapshot(
        snapshot: &LegislationSnapshot,
    ) -> ParamsResult<ContributionScheduleSet> {
        let builder = Self::from_monthly_ceiling(snapshot.value(PATH_MONTHLY_CEILING)?);
        Ok(ContributionScheduleSet {
            employer: builder.build_employer(&snapshot.scale_tree(PATH_EMPLOYER_RAW)?)?,
            employee: builder.build_employee(&snapshot.scale_tree(PATH_EMPLOYEE_RAW)?)?,
        })
    }
}

/// The territorial and hospital categories share the local-authority
/// structure. Hospital is an independent copy; each keeps only its own
/// nested items, lifted to the top level.
fn split_local_authority(local_authority: ScaleTree) -> ParamsResult<(ScaleTree, ScaleTree)> {
    let hospital = local_authority
        .deep_copy()
        .lift(HOSPITAL_OWN)?
        .discard(TERRITORIAL_OWN);
    let territorial = local_authority
        .lift(TERRITORIAL_OWN)?
        .discard(HOSPITAL_OWN);
    Ok((territorial, hospital))
}

/// Put the category schedules next to whatever is left of the raw tree and
/// check the result against the category enumeration.
fn assemble(
    side: ContributionSide,
    mut leftovers: ScaleTree,
    public_leftovers: ScaleTree,
    schedules: [(Category, ScaleTree); 7],
) -> ParamsResult<CategorySchedules> {
    if !public_leftovers.is_empty() {
        leftovers.insert(PUBLIC, public_leftovers);
    }
    for (category, tree) in schedules {
        leftovers.insert(category.as_str(), tree);
    }
    CategorySchedules::from_tree(side, leftovers)
}

fn log_schedules(side: ContributionSide, schedules: &CategorySchedules) {
    for (category, tree) in schedules.iter() {
        tracing::debug!(
            %side,
            %category,
            items = ?tree.keys().collect::<Vec<_>>(),
            "contribution schedule built"
        );
    }
}

// ---------------------------------------------------------------------------
// Legislation preprocessing
// ---------------------------------------------------------------------------

/// A copy of `snapshot` that additionally publishes the category schedules
/// under [`PATH_EMPLOYER_SCHEDULES`] and [`PATH_EMPLOYEE_SCHEDULES`].
pub fn preprocess_legislation(snapshot: &LegislationSnapshot) -> ParamsResult<LegislationSnapshot> {
    let set = ContributionScheduleBuilder::build_from_snapshot(snapshot)?;
    let next = snapshot
        .with_node(
            PATH_EMPLOYER_SCHEDULES,
            ParameterNode::from(set.employer.to_scale_tree()),
        )?
        .with_node(
            PATH_EMPLOYEE_SCHEDULES,
            ParameterNode::from(set.employee.to_scale_tree()),
        )?;
    tracing::info!(
        valid_from = %snapshot.valid_from(),
        "contribution schedules published"
    );
    Ok(next)
}

/// Apply [`preprocess_legislation`] to every version.
pub fn preprocess_all(legislation: &Legislation) -> ParamsResult<Legislation> {
    legislation.try_map(preprocess_legislation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::Scale;

    fn flat(rate: f64) -> Scale {
        Scale::flat(rate).unwrap()
    }

    #[test]
    fn from_tree_reports_missing_and_unexpected() {
        let tree = ScaleTree::new()
            .with_entry("prive_cadre", ScaleTree::new())
            .with_entry("fonc", ScaleTree::new());
        let err = CategorySchedules::from_tree(ContributionSide::Employer, tree).unwrap_err();
        match err {
            ParamsError::StructuralMismatch {
                side,
                missing,
                unexpected,
            } => {
                assert_eq!(side, "employer");
                assert_eq!(missing.len(), 6);
                assert_eq!(unexpected, vec!["fonc".to_string()]);
            }
            other => panic!("expected StructuralMismatch, got {other:?}"),
        }
    }

    #[test]
    fn from_tree_accepts_exact_category_set() {
        let tree: ScaleTree = Category::all()
            .iter()
            .map(|c| {
                (
                    c.as_str().to_string(),
                    ScaleTree::new().with_entry("x", flat(0.1)).into(),
                )
            })
            .collect();
        let schedules = CategorySchedules::from_tree(ContributionSide::Employee, tree).unwrap();
        assert_eq!(schedules.iter().count(), 7);
        assert_eq!(schedules.to_scale_tree().len(), 7);
    }

    #[test]
    fn split_local_authority_keeps_own_items_only() {
        let local = ScaleTree::new()
            .with_entry("shared", flat(0.1))
            .with_entry(TERRITORIAL_OWN, ScaleTree::new().with_entry("cnfpt", flat(0.01)))
            .with_entry(HOSPITAL_OWN, ScaleTree::new().with_entry("feh", flat(0.02)));
        let (territorial, hospital) = split_local_authority(local).unwrap();

        assert!(territorial.contains_key("cnfpt"));
        assert!(!territorial.contains_key("feh"));
        assert!(hospital.contains_key("feh"));
        assert!(!hospital.contains_key("cnfpt"));
        for tree in [&territorial, &hospital] {
            assert!(tree.contains_key("shared"));
            assert!(!tree.contains_key(TERRITORIAL_OWN));
            assert!(!tree.contains_key(HOSPITAL_OWN));
        }
    }

    #[test]
    fn builder_from_monthly_ceiling() {
        let b = ContributionScheduleBuilder::from_monthly_ceiling(3170.0);
        assert_eq!(b.annual_ceiling(), 38_040.0);
    }
}
