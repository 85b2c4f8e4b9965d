//! # Rental Benefit Stages
//!
//! The arithmetic of the rental housing benefit, as pure functions of
//! legislated parameters and an already-assembled household situation.
//! Formulas in [`crate::formulas`] gather the situation from the evaluator;
//! everything numeric happens here.
//!
//! ```text
//! rent ──► retained rent ──┐
//!                          ├─► eligible expense ──┐
//! composition ─► charges ──┘                      ├─► participation ─► raw ─► floor ─► CRDS
//! resource base ─► resource index ─► × (situation rate + rent rate) ┘
//! ```
//!
//! Negative intermediate values are clamped, never raised as errors.

use fisca_core::{ceil_to_multiple, round_to};
use serde::{Deserialize, Serialize};

use crate::params::{
    ChargeAllowance, HousingParams, ParticipationParams, ReferenceIncomeParams, RentCeilings,
    RentRateSlopes, SituationRates, ZoneCeilings,
};
use crate::zone::Zone;

/// Rent-to-reference ratio where the rent rate starts rising.
pub const RENT_RATIO_LOW_BREAKPOINT: f64 = 0.45;
/// Rent-to-reference ratio where the steeper slope takes over.
pub const RENT_RATIO_HIGH_BREAKPOINT: f64 = 0.75;
/// Resource bases are rounded up to a multiple of this.
pub const RESOURCE_ROUNDING_STEP: f64 = 100.0;
/// Furnished rents count for two thirds.
pub const FURNISHED_RENT_SHARE: f64 = 2.0 / 3.0;

/// Household composition as the benefit tables see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composition {
    /// Couple tables apply (couples, and pregnant single persons).
    pub couple: bool,
    pub dependents: u32,
}

impl Composition {
    pub fn single(dependents: u32) -> Self {
        Self {
            couple: false,
            dependents,
        }
    }

    pub fn couple(dependents: u32) -> Self {
        Self {
            couple: true,
            dependents,
        }
    }

    fn alone(&self) -> bool {
        !self.couple && self.dependents == 0
    }

    fn pair(&self) -> bool {
        self.couple && self.dependents == 0
    }

    fn dependents_beyond(&self, n: u32) -> f64 {
        f64::from(self.dependents.saturating_sub(n))
    }
}

// ---------------------------------------------------------------------------
// Stages 3-4: rent and expense
// ---------------------------------------------------------------------------

/// Ceiling on the rent taken into account.
///
/// Single-room tenants use the single-person table whatever their
/// composition; the result is then reduced for single rooms or, failing
/// that, for co-tenancy, and rounded to cents.
pub fn rent_ceiling(
    ceilings: &RentCeilings,
    zone: Zone,
    composition: Composition,
    single_room: bool,
    co_tenancy: bool,
) -> f64 {
    let table = ceilings.for_zone(zone);
    let base = if composition.alone() || single_room {
        table.single
    } else if composition.dependents > 0 {
        table.one_dependent + composition.dependents_beyond(1) * table.per_extra_dependent
    } else {
        table.couple
    };
    let rate = if single_room {
        ceilings.single_room_rate
    } else if co_tenancy {
        ceilings.co_tenancy_rate
    } else {
        1.0
    };
    round_to(base * rate, 2)
}

/// Actual rent (two thirds if furnished, rounded to units), capped.
pub fn retained_rent(rent: f64, furnished: bool, ceiling: f64) -> f64 {
    let share = if furnished { FURNISHED_RENT_SHARE } else { 1.0 };
    round_to(rent * share, 0).min(ceiling)
}

/// Flat charge component. Co-tenants who are single get half the base.
pub fn flat_charges(charges: &ChargeAllowance, composition: Composition, co_tenancy: bool) -> f64 {
    let base_share = if co_tenancy && !composition.couple {
        0.5
    } else {
        1.0
    };
    base_share * charges.base + f64::from(composition.dependents) * charges.per_dependent
}

pub fn eligible_expense(retained_rent: f64, charges: f64) -> f64 {
    retained_rent + charges
}

// ---------------------------------------------------------------------------
// Stage 5: resource index
// ---------------------------------------------------------------------------

/// Reference income `R0`, rounded to units.
pub fn reference_income(params: &ReferenceIncomeParams, composition: Composition) -> f64 {
    let [alone, pair, one, two_plus, extra] = params.composition_rates;
    let d = composition.dependents;
    let flag = |b: bool| if b { 1.0 } else { 0.0 };

    let r1 = params.minimum_income
        * (alone * flag(composition.alone())
            + pair * flag(composition.pair())
            + one * flag(d == 1)
            + two_plus * flag(d >= 2)
            + extra * composition.dependents_beyond(2));
    let [large_two_plus, large_extra] = params.large_family_rates;
    let r2 = params.family_base_allowance
        * (large_two_plus * flag(d >= 2) + large_extra * composition.dependents_beyond(2));

    round_to(12.0 * (r1 - r2) * (1.0 - params.wage_abatement), 0)
}

/// Resources above the reference income, floored at 0.
pub fn resource_index(resource_base: f64, reference_income: f64) -> f64 {
    (resource_base - reference_income).max(0.0)
}

/// Round a resource base up to the next multiple of 100.
pub fn round_resource_base(base: f64) -> f64 {
    ceil_to_multiple(base, RESOURCE_ROUNDING_STEP)
}

// ---------------------------------------------------------------------------
// Stage 6: rates
// ---------------------------------------------------------------------------

pub fn situation_rate(rates: &SituationRates, composition: Composition) -> f64 {
    let [alone, pair, one, two, three, four_plus, extra] = rates.0;
    match (composition.dependents, composition.couple) {
        (0, false) => alone,
        (0, true) => pair,
        (1, _) => one,
        (2, _) => two,
        (3, _) => three,
        _ => four_plus + extra * composition.dependents_beyond(4),
    }
}

/// Reference rent for the rent ratio, always from the zone 2 table.
pub fn reference_rent(zone2: &ZoneCeilings, composition: Composition) -> f64 {
    if composition.dependents == 0 {
        if composition.couple {
            zone2.couple
        } else {
            zone2.single
        }
    } else {
        zone2.one_dependent + composition.dependents_beyond(1) * zone2.per_extra_dependent
    }
}

/// Piecewise-linear rate in the ratio of retained rent to reference rent.
pub fn rent_rate(slopes: &RentRateSlopes, retained_rent: f64, reference_rent: f64) -> f64 {
    if reference_rent <= 0.0 {
        return 0.0;
    }
    let ratio = retained_rent / reference_rent;
    let middle = (slopes.low * (ratio - RENT_RATIO_LOW_BREAKPOINT)).max(0.0);
    let upper = slopes.high * (ratio - RENT_RATIO_HIGH_BREAKPOINT)
        + slopes.low * (RENT_RATIO_HIGH_BREAKPOINT - RENT_RATIO_LOW_BREAKPOINT);
    middle.max(upper)
}

// ---------------------------------------------------------------------------
// Stages 7-10: participation and benefit
// ---------------------------------------------------------------------------

pub fn personal_participation(
    minimum: &ParticipationParams,
    eligible_expense: f64,
    situation_rate: f64,
    rent_rate: f64,
    resource_index: f64,
) -> f64 {
    let floor = (minimum.rate * eligible_expense).max(minimum.floor);
    floor + (situation_rate + rent_rate) * resource_index
}

/// Expense not covered by the household's participation. Zero for
/// non-tenants.
pub fn raw_benefit(eligible_expense: f64, participation: f64, tenant: bool) -> f64 {
    if !tenant {
        return 0.0;
    }
    (eligible_expense - participation).max(0.0)
}

/// Amounts below `minimum` are not paid at all.
pub fn apply_minimum_payment(amount: f64, minimum: f64) -> f64 {
    if amount < minimum {
        0.0
    } else {
        amount
    }
}

/// The social debt levy on a gross benefit (a non-positive amount).
pub fn crds(gross: f64, rate: f64) -> f64 {
    // Subtracting from 0.0 keeps a zero levy at +0.0.
    0.0 - gross * rate
}

/// Gross benefit after the levy, rounded to cents.
pub fn net_of_crds(gross: f64, rate: f64) -> f64 {
    round_to(gross + crds(gross, rate), 2)
}

// ---------------------------------------------------------------------------
// Assembled
// ---------------------------------------------------------------------------

/// Household situation for one month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RentalSituation {
    pub composition: Composition,
    pub zone: Zone,
    pub rent: f64,
    pub furnished: bool,
    pub single_room: bool,
    pub co_tenancy: bool,
    pub tenant: bool,
    /// Already rounded.
    pub resource_base: f64,
}

/// Every intermediate of one rental benefit computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenefitBreakdown {
    pub rent_ceiling: f64,
    pub retained_rent: f64,
    pub charges: f64,
    pub eligible_expense: f64,
    pub reference_income: f64,
    pub resource_index: f64,
    pub situation_rate: f64,
    pub rent_rate: f64,
    pub personal_participation: f64,
    /// After the minimum-payment floor, before CRDS.
    pub gross: f64,
}

/// Stages 3 to 9.
pub fn rental_benefit(params: &HousingParams, situation: &RentalSituation) -> BenefitBreakdown {
    let composition = situation.composition;
    let rent_ceiling = rent_ceiling(
        &params.rent_ceilings,
        situation.zone,
        composition,
        situation.single_room,
        situation.co_tenancy,
    );
    let retained_rent = retained_rent(situation.rent, situation.furnished, rent_ceiling);
    let charges = flat_charges(&params.charges, composition, situation.co_tenancy);
    let eligible_expense = eligible_expense(retained_rent, charges);

    let reference_income = reference_income(&params.reference_income, composition);
    let resource_index = resource_index(situation.resource_base, reference_income);
    let situation_rate = situation_rate(&params.situation_rates, composition);
    let reference_rent = reference_rent(&params.rent_ceilings.zone2, composition);
    let rent_rate = rent_rate(&params.rent_rate, retained_rent, reference_rent);

    let personal_participation = personal_participation(
        &params.participation,
        eligible_expense,
        situation_rate,
        rent_rate,
        resource_index,
    );
    let raw = raw_benefit(eligible_expense, personal_participation, situation.tenant);
    let gross = apply_minimum_payment(raw, params.minimum_payment);

    BenefitBreakdown {
        rent_ceiling,
        retained_rent,
        charges,
        eligible_expense,
        reference_income,
        resource_index,
        situation_rate,
        rent_rate,
        personal_participation,
        gross,
    }
}
