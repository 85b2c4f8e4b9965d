//! # Housing Variables
//!
//! Registers the housing benefit's inputs and formulas with a
//! [`VariableRegistry`]. Every formula normalizes its period to the month
//! containing it, gathers its inputs from the [`EvaluationContext`], and
//! delegates the arithmetic to [`crate::stages`].
//!
//! ## Periods read
//!
//! | Input | Period |
//! |-------|--------|
//! | composition, rent, status, resources | evaluated month |
//! | wages for the flat-rate channel, disabled-adult allowance | previous month |
//! | unemployment benefit | each of the two previous months |
//! | wages, pensions, collective income | reference year `n-2` |
//! | minimum-income benefit | previous month, re-entry capped at 0 |
//!
//! ## Self-reference
//!
//! The minimum-income benefit may itself depend on the housing benefit.
//! [`HOUSING_NEUTRALIZATION`] reads it with a re-entry bound of 0, so a
//! household whose two benefits reference each other sees the declared
//! default (0) instead of recursing.

use std::sync::Arc;

use fisca_core::{round_to, Instant, Period, Role};
use fisca_eval::{
    EntityKind, EvalError, EvalResult, EvaluationContext, Holder, VariableDef,
    VariableRegistry,
};

use crate::error::ZoneError;
use crate::occupancy::OccupancyStatus;
use crate::params::{
    ChargeAllowance, HousingParams, ParticipationParams, ReferenceIncomeParams, RentCeilings,
    RentRateSlopes, SituationRates, ZoneCeilings, PATH_CRDS_RATE, PATH_MINIMUM_PAYMENT,
};
use crate::stages::{self, Composition};
use crate::zone::{Zone, ZoneResolver};

// ---------------------------------------------------------------------------
// Variable names
// ---------------------------------------------------------------------------

// Individual inputs.
pub const AGE: &str = "age";
pub const FINANCIALLY_INDEPENDENT: &str = "financially_independent";
pub const INCAPACITY_RATE: &str = "incapacity_rate";
pub const UNABLE_TO_WORK: &str = "unable_to_work";
pub const INDIVIDUAL_RESOURCES: &str = "individual_resources";
pub const TAXABLE_SALARY: &str = "taxable_salary";
pub const UNEMPLOYMENT_NET: &str = "unemployment_net";
pub const UNEMPLOYMENT_TAXABLE: &str = "unemployment_taxable";
pub const RETIREMENT_TAXABLE: &str = "retirement_taxable";
pub const ACTIVITY: &str = "activity";
pub const DISABLED_ADULT_ALLOWANCE: &str = "disabled_adult_allowance";
pub const STUDENT: &str = "student";
pub const SCHOLARSHIP_HOLDER: &str = "scholarship_holder";
pub const SELF_EMPLOYED: &str = "self_employed";
pub const COLLECTIVE_INCOME: &str = "collective_income";
pub const PREGNANT: &str = "pregnant";

// Family inputs.
pub const DUAL_EARNER: &str = "dual_earner";
pub const RENT: &str = "rent";
pub const OCCUPANCY_STATUS: &str = "occupancy_status";
pub const CO_TENANCY: &str = "co_tenancy";
pub const SINGLE_ROOM: &str = "single_room";
pub const LOCALITY_CODE: &str = "locality_code";
pub const OWNER_IS_CLOSE_RELATIVE: &str = "owner_is_close_relative";
/// Supplied by the minimum-income program; an input unless that program
/// registers a formula for it.
pub const MINIMUM_INCOME_BENEFIT: &str = "minimum_income_benefit";

// Computed.
pub const IN_COUPLE: &str = "in_couple";
pub const HOUSING_COUPLE_SCALE: &str = "housing_couple_scale";
pub const HOUSING_DEPENDENTS: &str = "housing_dependents";
pub const HOUSING_RESOURCES_FLAT_RATE: &str = "housing_resources_flat_rate";
pub const HOUSING_UNEMPLOYMENT_ABATEMENT: &str = "housing_unemployment_abatement";
pub const HOUSING_RETIREMENT_ABATEMENT: &str = "housing_retirement_abatement";
pub const HOUSING_NEUTRALIZATION: &str = "housing_minimum_income_neutralization";
pub const HOUSING_RESOURCES_DEFAULT: &str = "housing_resources_default";
pub const HOUSING_RESOURCE_BASE: &str = "housing_resource_base";
pub const HOUSING_ZONE: &str = "housing_zone";
pub const HOUSING_RETAINED_RENT: &str = "housing_retained_rent";
pub const HOUSING_ELIGIBLE_EXPENSE: &str = "housing_eligible_expense";
pub const HOUSING_PERSONAL_PARTICIPATION: &str = "housing_personal_participation";
pub const HOUSING_BENEFIT_GROSS: &str = "housing_benefit_gross";
pub const HOUSING_CRDS: &str = "housing_crds";
pub const HOUSING_BENEFIT_AMOUNT: &str = "housing_benefit_amount";
pub const FAMILY_HOUSING_ALLOWANCE: &str = "family_housing_allowance";
pub const SOCIAL_HOUSING_ALLOWANCE_NON_STUDENT: &str = "social_housing_allowance_non_student";
pub const SOCIAL_HOUSING_ALLOWANCE_STUDENT: &str = "social_housing_allowance_student";
pub const SOCIAL_HOUSING_ALLOWANCE: &str = "social_housing_allowance";
pub const PERSONALIZED_HOUSING_AID: &str = "personalized_housing_aid";
pub const HOUSING_BENEFIT_NOT_COMPUTABLE: &str = "housing_benefit_not_computable";
pub const HOUSING_BENEFIT: &str = "housing_benefit";

// ---------------------------------------------------------------------------
// Statutory constants
// ---------------------------------------------------------------------------

/// Incapacity rate above which an adult counts as disabled.
const DISABILITY_INCAPACITY_RATE: f64 = 0.8;
/// Multiple of the elderly-solidarity single ceiling used for dependent
/// resources.
const DEPENDENT_RESOURCE_FACTOR: f64 = 1.25;
const RETIREMENT_ABATEMENT_RATE: f64 = 0.3;
/// Hours of minimum wage credited to self-employed households.
const SELF_EMPLOYED_WAGE_HOURS: f64 = 1500.0;
/// Hours of minimum wage above which the flat-rate channel does not apply.
const FLAT_RATE_CEILING_HOURS: f64 = 1015.0;
const YOUNG_AGE: f64 = 25.0;
/// `activity` code for retirees.
const RETIRED: i64 = 3;

const ALL_ROLES: [Role; 3] = [Role::Head, Role::Partner, Role::Child];

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Register every housing input and formula.
///
/// # Errors
///
/// [`EvalError::DuplicateVariable`] if `registry` already declares one of
/// the names.
pub fn register_housing_variables(
    registry: &mut VariableRegistry,
    zones: Arc<ZoneResolver>,
) -> EvalResult<()> {
    for variable in inputs().into_iter().chain(computed(zones)) {
        registry.register(variable)?;
    }
    Ok(())
}

/// A registry holding only the housing variables.
pub fn housing_registry(zones: Arc<ZoneResolver>) -> EvalResult<VariableRegistry> {
    let mut registry = VariableRegistry::new();
    register_housing_variables(&mut registry, zones)?;
    Ok(registry)
}

fn inputs() -> Vec<VariableDef> {
    use EntityKind::{Family, Individual};
    vec![
        VariableDef::input(AGE, Individual, 0_i64),
        VariableDef::input(FINANCIALLY_INDEPENDENT, Individual, false),
        VariableDef::input(INCAPACITY_RATE, Individual, 0.0),
        VariableDef::input(UNABLE_TO_WORK, Individual, false),
        VariableDef::input(INDIVIDUAL_RESOURCES, Individual, 0.0)
            .with_label("Resources counted for family benefits"),
        VariableDef::input(TAXABLE_SALARY, Individual, 0.0),
        VariableDef::input(UNEMPLOYMENT_NET, Individual, 0.0),
        VariableDef::input(UNEMPLOYMENT_TAXABLE, Individual, 0.0),
        VariableDef::input(RETIREMENT_TAXABLE, Individual, 0.0),
        VariableDef::input(ACTIVITY, Individual, 0_i64).with_label("Activity code (3 = retired)"),
        VariableDef::input(DISABLED_ADULT_ALLOWANCE, Individual, 0.0),
        VariableDef::input(STUDENT, Individual, false),
        VariableDef::input(SCHOLARSHIP_HOLDER, Individual, false),
        VariableDef::input(SELF_EMPLOYED, Individual, false),
        VariableDef::input(COLLECTIVE_INCOME, Individual, 0.0),
        VariableDef::input(PREGNANT, Individual, false),
        VariableDef::input(DUAL_EARNER, Family, false),
        VariableDef::input(RENT, Family, 0.0).with_label("Monthly rent"),
        VariableDef::input(OCCUPANCY_STATUS, Family, 0_i64),
        VariableDef::input(CO_TENANCY, Family, false),
        VariableDef::input(SINGLE_ROOM, Family, false),
        VariableDef::input(LOCALITY_CODE, Family, ""),
        VariableDef::input(OWNER_IS_CLOSE_RELATIVE, Family, false),
        VariableDef::input(MINIMUM_INCOME_BENEFIT, Family, 0.0),
    ]
}

fn computed(zones: Arc<ZoneResolver>) -> Vec<VariableDef> {
    use EntityKind::{Family, Individual};
    let zone = move |ctx: &dyn EvaluationContext, period: Period| -> EvalResult<Holder> {
        let code = ctx.code(LOCALITY_CODE, period.this_month())?;
        let zone = zones.zone_of(&code).map_err(zone_error)?;
        Ok(Holder::from(i64::from(zone.number())))
    };

    vec![
        VariableDef::computed(IN_COUPLE, Family, false, in_couple),
        VariableDef::computed(HOUSING_COUPLE_SCALE, Family, false, housing_couple_scale),
        VariableDef::computed(HOUSING_DEPENDENTS, Family, 0_i64, housing_dependents)
            .with_label("Dependents for the housing benefit"),
        VariableDef::computed(HOUSING_RESOURCES_FLAT_RATE, Family, 0.0, resources_flat_rate)
            .with_label("Flat-rate evaluation of resources"),
        VariableDef::computed(HOUSING_UNEMPLOYMENT_ABATEMENT, Individual, 0.0, unemployment_abatement),
        VariableDef::computed(HOUSING_RETIREMENT_ABATEMENT, Individual, 0.0, retirement_abatement),
        VariableDef::computed(HOUSING_NEUTRALIZATION, Family, 0.0, minimum_income_neutralization)
            .with_label("Neutralization of n-2 income for minimum-income recipients"),
        VariableDef::computed(HOUSING_RESOURCES_DEFAULT, Family, 0.0, resources_default),
        VariableDef::computed(HOUSING_RESOURCE_BASE, Family, 0.0, resource_base)
            .with_label("Housing benefit resource base"),
        VariableDef::computed(HOUSING_ZONE, Family, i64::from(Zone::DEFAULT.number()), zone),
        VariableDef::computed(HOUSING_RETAINED_RENT, Family, 0.0, retained_rent),
        VariableDef::computed(HOUSING_ELIGIBLE_EXPENSE, Family, 0.0, eligible_expense),
        VariableDef::computed(HOUSING_PERSONAL_PARTICIPATION, Family, 0.0, personal_participation),
        VariableDef::computed(HOUSING_BENEFIT_GROSS, Family, 0.0, benefit_gross)
            .with_label("Rental housing benefit before CRDS"),
        VariableDef::computed(HOUSING_CRDS, Family, 0.0, housing_crds),
        VariableDef::computed(HOUSING_BENEFIT_AMOUNT, Family, 0.0, benefit_amount)
            .with_label("Housing benefit net of CRDS"),
        VariableDef::computed(FAMILY_HOUSING_ALLOWANCE, Family, 0.0, family_allowance),
        VariableDef::computed(
            SOCIAL_HOUSING_ALLOWANCE_NON_STUDENT,
            Family,
            0.0,
            social_allowance_non_student,
        ),
        VariableDef::computed(SOCIAL_HOUSING_ALLOWANCE_STUDENT, Family, 0.0, social_allowance_student),
        VariableDef::computed(SOCIAL_HOUSING_ALLOWANCE, Family, 0.0, social_allowance),
        VariableDef::computed(PERSONALIZED_HOUSING_AID, Family, 0.0, personalized_aid),
        VariableDef::computed(HOUSING_BENEFIT_NOT_COMPUTABLE, Family, 0_i64, not_computable),
        VariableDef::computed(HOUSING_BENEFIT, Family, 0.0, housing_benefit)
            .with_label("Housing benefit (any variant)"),
    ]
}

fn zone_error(err: ZoneError) -> EvalError {
    match err {
        ZoneError::Load(source) => EvalError::Params(source),
        other => EvalError::InvalidInput {
            name: HOUSING_ZONE.to_string(),
            reason: other.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

fn in_couple(ctx: &dyn EvaluationContext, _period: Period) -> EvalResult<Holder> {
    Ok(Holder::from(ctx.family().has_partner()))
}

/// Couples, and pregnant single persons, use the couple tables.
fn housing_couple_scale(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    let period = period.this_month();
    let couple = ctx.flag(IN_COUPLE, period)?;
    let pregnant = ctx.any_by_roles(PREGNANT, period, &Role::PARENTS)?;
    Ok(Holder::from(couple || pregnant))
}

fn housing_dependents(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    let period = period.this_month();
    let start = period.start();
    let age_max = ctx.param("fam.cf.age2", start)?;
    let age_min = ctx.param("fam.af.age1", start)?;
    let resource_ceiling = elderly_ceiling(ctx, period)?;

    let ages = ctx.floats(AGE, period)?;
    let independent = ctx.flags(FINANCIALLY_INDEPENDENT, period)?;
    let incapacity = ctx.floats(INCAPACITY_RATE, period)?;
    let unable = ctx.flags(UNABLE_TO_WORK, period)?;
    let resources = ctx.floats(INDIVIDUAL_RESOURCES, period)?;

    let children = ctx
        .family()
        .members()
        .iter()
        .zip(ages.iter().zip(&independent))
        .filter(|(member, (age, independent))| {
            member.role == Role::Child && **age >= age_min && **age < age_max && !**independent
        })
        .count();

    let disabled_adults = ages
        .iter()
        .zip(incapacity.iter().zip(&unable))
        .zip(&resources)
        .filter(|((age, (incapacity, unable)), resources)| {
            (**incapacity > DISABILITY_INCAPACITY_RATE || **unable)
                && **age >= age_max
                && **resources <= resource_ceiling
        })
        .count();

    Ok(Holder::from((children + disabled_adults) as i64))
}

/// 1.25 × the elderly-solidarity single ceiling at the end of year `n-2`.
fn elderly_ceiling(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<f64> {
    Ok(DEPENDENT_RESOURCE_FACTOR * ctx.param("minim.aspa.plaf_seul", period.n_2().stop())?)
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

fn professional_expense_rate(ctx: &dyn EvaluationContext, start: Instant) -> EvalResult<f64> {
    ctx.param("ir.tspr.abatpro.taux", start)
}

fn resources_flat_rate(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    let period = period.this_month();
    let start = period.start();

    let wages = 12.0 * ctx.sum_by_roles(TAXABLE_SALARY, period.previous_month(), &Role::PARENTS)?;
    let abatement = round_to(
        (ctx.param("ir.tspr.abatpro.taux", start)? * wages)
            .max(ctx.param("ir.tspr.abatpro.min", start)?)
            .min(ctx.param("ir.tspr.abatpro.max", start)?),
        0,
    );
    let salaried = (wages - abatement).max(0.0);

    let self_employed = if ctx.any_by_roles(SELF_EMPLOYED, period, &ALL_ROLES)? {
        SELF_EMPLOYED_WAGE_HOURS * ctx.param("cotsoc.gen.smic_h_b", start.last_july_first())?
    } else {
        0.0
    };

    Ok(Holder::from(salaried.max(self_employed)))
}

/// Share of `n-2` wages of members indemnified in both of the last two
/// months.
fn unemployment_abatement(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    let period = period.this_month();
    let start = period.start();
    let rate = ctx.param("al.ressources.abattement_chomage_indemnise", start)?;
    let kept = 1.0 - professional_expense_rate(ctx, start)?;

    let last_month = ctx.floats(UNEMPLOYMENT_NET, period.offset(-1))?;
    let month_before = ctx.floats(UNEMPLOYMENT_NET, period.offset(-2))?;
    let wages = ctx.floats(TAXABLE_SALARY, period.n_2())?;

    let abatements: Vec<f64> = last_month
        .iter()
        .zip(&month_before)
        .zip(&wages)
        .map(|((m1, m2), wages)| {
            if *m1 > 0.0 && *m2 > 0.0 {
                round_to(kept * rate * wages, 0)
            } else {
                0.0
            }
        })
        .collect();
    Ok(Holder::from(abatements))
}

/// Share of `n-2` wages of members retired since, with no `n-2` pension.
fn retirement_abatement(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    let period = period.this_month();
    let kept = 1.0 - professional_expense_rate(ctx, period.start())?;

    let activity = ctx.ints(ACTIVITY, period)?;
    let wages = ctx.floats(TAXABLE_SALARY, period.n_2())?;
    let pensions = ctx.floats(RETIREMENT_TAXABLE, period.n_2())?;

    let abatements: Vec<f64> = activity
        .iter()
        .zip(wages.iter().zip(&pensions))
        .map(|(activity, (wages, pension))| {
            if *activity == RETIRED && *pension == 0.0 {
                round_to(kept * RETIREMENT_ABATEMENT_RATE * wages, 0)
            } else {
                0.0
            }
        })
        .collect();
    Ok(Holder::from(abatements))
}

/// `n-2` wages and unemployment benefit, if the household received the
/// minimum-income benefit last month.
fn minimum_income_neutralization(
    ctx: &dyn EvaluationContext,
    period: Period,
) -> EvalResult<Holder> {
    let period = period.this_month();
    let received = ctx.float_bounded(MINIMUM_INCOME_BENEFIT, period.previous_month(), 0)? > 0.0;
    if !received {
        return Ok(Holder::from(0.0));
    }

    let n_2 = period.n_2();
    let income = ctx.sum_all(TAXABLE_SALARY, n_2)? + ctx.sum_all(UNEMPLOYMENT_TAXABLE, n_2)?;
    let kept = 1.0 - professional_expense_rate(ctx, period.start())?;
    Ok(Holder::from(round_to(kept * income, 0)))
}

fn resources_default(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    let period = period.this_month();
    let parents = &Role::PARENTS;

    let parent_resources = ctx.sum_by_roles(INDIVIDUAL_RESOURCES, period, parents)?;
    let child_threshold = elderly_ceiling(ctx, period)?;
    let child_resources: f64 = ctx
        .split_floats(INDIVIDUAL_RESOURCES, period)?
        .children
        .iter()
        .map(|r| (r - child_threshold).max(0.0))
        .sum();
    let collective = ctx.sum_all(COLLECTIVE_INCOME, period.n_2())?;

    let abatements = ctx.sum_by_roles(HOUSING_UNEMPLOYMENT_ABATEMENT, period, parents)?
        + ctx.sum_by_roles(HOUSING_RETIREMENT_ABATEMENT, period, parents)?
        + ctx.float(HOUSING_NEUTRALIZATION, period)?;

    let dual_earner = if ctx.flag(DUAL_EARNER, period)? {
        ctx.param("al.ressources.dar_1", period.start())?
    } else {
        0.0
    };

    let resources = parent_resources + child_resources + collective - abatements;
    Ok(Holder::from((resources - dual_earner).max(0.0)))
}

/// Default or flat-rate channel, then the student floor, rounded up to 100.
fn resource_base(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    let period = period.this_month();
    let start = period.start();
    let previous = period.previous_month();
    let parents = &Role::PARENTS;

    let default = ctx.float(HOUSING_RESOURCES_DEFAULT, period)?;
    let flat_rate = ctx.float(HOUSING_RESOURCES_FLAT_RATE, period)?;
    let couple = ctx.flag(IN_COUPLE, period)?;

    let ages = ctx.split_floats(AGE, period)?;
    let wages_last_month = ctx.sum_by_roles(TAXABLE_SALARY, previous, parents)?;
    let young_ceiling = if couple {
        ctx.param("al.ressources.dar_9", start)?
    } else {
        ctx.param("al.ressources.dar_8", start)?
    };
    let young = ages.head < YOUNG_AGE || (couple && ages.partner.is_some_and(|a| a < YOUNG_AGE));
    let young_low_earning = young && wages_last_month < young_ceiling;

    let minimum_wage_n_2 = ctx.param("cotsoc.gen.smic_h_b", period.n_2().stop())?;
    let disabled_allowance = ctx.sum_by_roles(DISABLED_ADULT_ALLOWANCE, previous, parents)?;
    let flat_rate_applies = default <= FLAT_RATE_CEILING_HOURS * minimum_wage_n_2
        && flat_rate > 0.0
        && disabled_allowance == 0.0
        && !young_low_earning;
    let resources = if flat_rate_applies { flat_rate } else { default };

    // Only the head's student status counts.
    let student = ctx.split_flags(STUDENT, period)?.head;
    let scholarship = ctx.split_flags(SCHOLARSHIP_HOLDER, period)?.head;
    let mut student_floor = 0.0;
    if student {
        student_floor += ctx.param("al.ressources.dar_4", start)?;
    }
    if scholarship {
        student_floor -= ctx.param("al.ressources.dar_5", start)?;
    }

    tracing::trace!(
        family = %ctx.family().id(),
        %period,
        default,
        flat_rate,
        flat_rate_applies,
        "housing resource channel"
    );
    Ok(Holder::from(stages::round_resource_base(
        resources.max(student_floor.max(0.0)),
    )))
}

// ---------------------------------------------------------------------------
// Rental benefit
// ---------------------------------------------------------------------------

fn occupancy(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<OccupancyStatus> {
    Ok(OccupancyStatus::from_code(ctx.int(OCCUPANCY_STATUS, period)?))
}

fn dependents(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<u32> {
    let count = ctx.int(HOUSING_DEPENDENTS, period)?;
    Ok(u32::try_from(count.max(0)).unwrap_or(u32::MAX))
}

fn composition(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Composition> {
    Ok(Composition {
        couple: ctx.flag(HOUSING_COUPLE_SCALE, period)?,
        dependents: dependents(ctx, period)?,
    })
}

fn zone(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Zone> {
    let raw_zone = ctx.int(HOUSING_ZONE, period)?;
    u8::try_from(raw_zone)
        .ok()
        .and_then(Zone::from_number)
        .ok_or_else(|| EvalError::InvalidInput {
            name: HOUSING_ZONE.to_string(),
            reason: format!("{raw_zone} is not a zone"),
        })
}

/// Every stage below reads its predecessor as a variable, so each group of
/// parameters is looked up once per month.
fn retained_rent(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    let period = period.this_month();
    let ceilings = RentCeilings::read(ctx.legislation_at(period.start())?)?;
    let ceiling = stages::rent_ceiling(
        &ceilings,
        zone(ctx, period)?,
        composition(ctx, period)?,
        ctx.flag(SINGLE_ROOM, period)?,
        ctx.flag(CO_TENANCY, period)?,
    );
    let furnished = occupancy(ctx, period)?.is_furnished();
    Ok(Holder::from(stages::retained_rent(
        ctx.float(RENT, period)?,
        furnished,
        ceiling,
    )))
}

fn eligible_expense(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    let period = period.this_month();
    let allowance = ChargeAllowance::read(ctx.legislation_at(period.start())?)?;
    let charges = stages::flat_charges(
        &allowance,
        composition(ctx, period)?,
        ctx.flag(CO_TENANCY, period)?,
    );
    Ok(Holder::from(stages::eligible_expense(
        ctx.float(HOUSING_RETAINED_RENT, period)?,
        charges,
    )))
}

fn personal_participation(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    let period = period.this_month();
    let start = period.start();
    let current = ctx.legislation_at(start)?;
    let earlier = ctx.legislation_at(HousingParams::two_years_before(start))?;
    let composition = composition(ctx, period)?;

    let reference_income =
        stages::reference_income(&ReferenceIncomeParams::read(current, earlier)?, composition);
    let resource_index =
        stages::resource_index(ctx.float(HOUSING_RESOURCE_BASE, period)?, reference_income);
    let situation_rate = stages::situation_rate(&SituationRates::read(current)?, composition);
    let reference_rent =
        stages::reference_rent(&ZoneCeilings::read(current, Zone::Two)?, composition);
    let rent_rate = stages::rent_rate(
        &RentRateSlopes::read(current)?,
        ctx.float(HOUSING_RETAINED_RENT, period)?,
        reference_rent,
    );

    Ok(Holder::from(stages::personal_participation(
        &ParticipationParams::read(current)?,
        ctx.float(HOUSING_ELIGIBLE_EXPENSE, period)?,
        situation_rate,
        rent_rate,
        resource_index,
    )))
}

/// Tenants only. First-time buyers are a zero-valued branch.
fn benefit_gross(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    let period = period.this_month();
    let eligible_expense = ctx.float(HOUSING_ELIGIBLE_EXPENSE, period)?;
    let participation = ctx.float(HOUSING_PERSONAL_PARTICIPATION, period)?;
    let tenant = occupancy(ctx, period)?.is_tenant();
    let minimum = ctx.param(PATH_MINIMUM_PAYMENT, period.start())?;
    let gross = stages::apply_minimum_payment(
        stages::raw_benefit(eligible_expense, participation, tenant),
        minimum,
    );
    tracing::debug!(
        family = %ctx.family().id(),
        %period,
        eligible_expense,
        participation,
        gross,
        "rental benefit computed"
    );
    Ok(Holder::from(gross))
}

fn housing_crds(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    let period = period.this_month();
    let gross = ctx.float(HOUSING_BENEFIT_GROSS, period)?;
    let rate = ctx.param(PATH_CRDS_RATE, period.start())?;
    Ok(Holder::from(stages::crds(gross, rate)))
}

fn benefit_amount(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    let period = period.this_month();
    let gross = ctx.float(HOUSING_BENEFIT_GROSS, period)?;
    let crds = ctx.float(HOUSING_CRDS, period)?;
    Ok(Holder::from(round_to(gross + crds, 2)))
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

/// Gating shared by the family and social allowances.
fn allowance_base(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<(u32, f64)> {
    let status = occupancy(ctx, period)?;
    let close_relative = ctx.flag(OWNER_IS_CLOSE_RELATIVE, period)?;
    let amount = if status != OccupancyStatus::SubsidizedTenant && !close_relative {
        ctx.float(HOUSING_BENEFIT_AMOUNT, period)?
    } else {
        0.0
    };
    Ok((dependents(ctx, period)?, amount))
}

fn family_allowance(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    let (dependents, amount) = allowance_base(ctx, period.this_month())?;
    Ok(Holder::from(if dependents >= 1 { amount } else { 0.0 }))
}

fn couple_has_student(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<bool> {
    let students = ctx.split_flags(STUDENT, period)?;
    Ok(students.head || students.partner_or(false))
}

fn social_allowance_non_student(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    let period = period.this_month();
    let (dependents, amount) = allowance_base(ctx, period)?;
    let applies = dependents == 0 && !couple_has_student(ctx, period)?;
    Ok(Holder::from(if applies { amount } else { 0.0 }))
}

fn social_allowance_student(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    let period = period.this_month();
    let (dependents, amount) = allowance_base(ctx, period)?;
    let applies = dependents == 0 && couple_has_student(ctx, period)?;
    Ok(Holder::from(if applies { amount } else { 0.0 }))
}

fn social_allowance(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    let period = period.this_month();
    Ok(Holder::from(
        ctx.float(SOCIAL_HOUSING_ALLOWANCE_NON_STUDENT, period)?
            + ctx.float(SOCIAL_HOUSING_ALLOWANCE_STUDENT, period)?,
    ))
}

fn personalized_aid(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    let period = period.this_month();
    Ok(Holder::from(
        if occupancy(ctx, period)? == OccupancyStatus::SubsidizedTenant {
            ctx.float(HOUSING_BENEFIT_AMOUNT, period)?
        } else {
            0.0
        },
    ))
}

fn not_computable(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    Ok(Holder::from(
        occupancy(ctx, period.this_month())?.not_computable_code(),
    ))
}

/// The variants are mutually exclusive; the maximum selects the one that
/// applies.
fn housing_benefit(ctx: &dyn EvaluationContext, period: Period) -> EvalResult<Holder> {
    let period = period.this_month();
    let personalized = ctx.float(PERSONALIZED_HOUSING_AID, period)?;
    let social = ctx.float(SOCIAL_HOUSING_ALLOWANCE, period)?;
    let family = ctx.float(FAMILY_HOUSING_ALLOWANCE, period)?;
    Ok(Holder::from(personalized.max(social).max(family)))
}
