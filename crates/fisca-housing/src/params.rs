//! Legislated housing-benefit parameters, extracted once per evaluation
//! from the legislation in force.
//!
//! Rent ceilings, charge allowances, reference-income and rate tables are
//! read at the start of the evaluated month. The family base allowance used
//! in the large-family reference income is read two years earlier.

use fisca_core::Instant;
use fisca_params::{LegislationSnapshot, ParamsResult};
use serde::{Deserialize, Serialize};

use crate::zone::Zone;

/// Amounts below this are not paid.
pub const PATH_MINIMUM_PAYMENT: &str = "al.autres.nv_seuil";
/// Social debt levy rate.
pub const PATH_CRDS_RATE: &str = "fam.af.crds";

/// Rent ceilings for one zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneCeilings {
    /// Single person without dependents.
    pub single: f64,
    /// Couple without dependents.
    pub couple: f64,
    /// Household with one dependent.
    pub one_dependent: f64,
    /// Added per dependent beyond the first.
    pub per_extra_dependent: f64,
}

impl ZoneCeilings {
    pub fn read(snapshot: &LegislationSnapshot, zone: Zone) -> ParamsResult<Self> {
        let zone = zone.number();
        let at = |n: u8| snapshot.value(&format!("al.loyers_plafond.zone{zone}.L{n}"));
        Ok(Self {
            single: at(1)?,
            couple: at(2)?,
            one_dependent: at(3)?,
            per_extra_dependent: at(4)?,
        })
    }
}

/// Rent ceilings by zone, with the reductions for single rooms and
/// co-tenancy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RentCeilings {
    pub zone1: ZoneCeilings,
    pub zone2: ZoneCeilings,
    pub zone3: ZoneCeilings,
    pub single_room_rate: f64,
    pub co_tenancy_rate: f64,
}

impl RentCeilings {
    pub fn read(snapshot: &LegislationSnapshot) -> ParamsResult<Self> {
        Ok(Self {
            zone1: ZoneCeilings::read(snapshot, Zone::One)?,
            zone2: ZoneCeilings::read(snapshot, Zone::Two)?,
            zone3: ZoneCeilings::read(snapshot, Zone::Three)?,
            single_room_rate: snapshot.value("al.loyers_plafond.chambre")?,
            co_tenancy_rate: snapshot.value("al.loyers_plafond.colocation")?,
        })
    }

    pub fn for_zone(&self, zone: Zone) -> &ZoneCeilings {
        match zone {
            Zone::One => &self.zone1,
            Zone::Two => &self.zone2,
            Zone::Three => &self.zone3,
        }
    }
}

/// Flat charge allowance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChargeAllowance {
    pub base: f64,
    pub per_dependent: f64,
}

impl ChargeAllowance {
    pub fn read(snapshot: &LegislationSnapshot) -> ParamsResult<Self> {
        Ok(Self {
            base: snapshot.value("al.forfait_charges.fc1")?,
            per_dependent: snapshot.value("al.forfait_charges.fc2")?,
        })
    }
}

/// Inputs of the reference income `R0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceIncomeParams {
    /// Minimum-income amount the first term is expressed in.
    pub minimum_income: f64,
    /// Multipliers: single, couple, one dependent, two or more dependents,
    /// per dependent beyond two.
    pub composition_rates: [f64; 5],
    /// Family base allowance two years before the evaluated month.
    pub family_base_allowance: f64,
    /// Large-family multipliers: two or more dependents, per dependent
    /// beyond two.
    pub large_family_rates: [f64; 2],
    /// Flat wage abatement applied to the annualized difference.
    pub wage_abatement: f64,
}

impl ReferenceIncomeParams {
    /// `two_years_before` supplies the family base allowance.
    pub fn read(
        current: &LegislationSnapshot,
        two_years_before: &LegislationSnapshot,
    ) -> ParamsResult<Self> {
        let v = |path: &str| current.value(path);
        Ok(Self {
            minimum_income: v("al.rmi")?,
            composition_rates: [
                v("al.R1.taux1")?,
                v("al.R1.taux2")?,
                v("al.R1.taux3")?,
                v("al.R1.taux4")?,
                v("al.R1.taux5")?,
            ],
            family_base_allowance: two_years_before.value("fam.af.bmaf")?,
            large_family_rates: [v("al.R2.taux4")?, v("al.R2.taux5")?],
            wage_abatement: v("al.autres.abat_sal")?,
        })
    }
}

/// Situation rates by composition: single, couple, then 1, 2, 3 and 4+
/// dependents, then the increment per dependent beyond four.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SituationRates(pub [f64; 7]);

impl SituationRates {
    pub fn read(snapshot: &LegislationSnapshot) -> ParamsResult<Self> {
        let mut rates = [0.0; 7];
        for (i, rate) in rates.iter_mut().enumerate() {
            *rate = snapshot.value(&format!("al.TF.taux{}", i + 1))?;
        }
        Ok(Self(rates))
    }
}

/// Slopes of the rent-ratio rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RentRateSlopes {
    /// Between the two breakpoints.
    pub low: f64,
    /// Beyond the upper breakpoint.
    pub high: f64,
}

impl RentRateSlopes {
    pub fn read(snapshot: &LegislationSnapshot) -> ParamsResult<Self> {
        Ok(Self {
            low: snapshot.value("al.TL.taux2")?,
            high: snapshot.value("al.TL.taux3")?,
        })
    }
}

/// Minimum personal participation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticipationParams {
    /// Share of the eligible expense.
    pub rate: f64,
    /// Floor in currency units.
    pub floor: f64,
}

impl ParticipationParams {
    pub fn read(snapshot: &LegislationSnapshot) -> ParamsResult<Self> {
        Ok(Self {
            rate: snapshot.value("al.pp.taux")?,
            floor: snapshot.value("al.pp.min")?,
        })
    }
}

/// Everything the rental benefit stages read from legislation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HousingParams {
    pub rent_ceilings: RentCeilings,
    pub charges: ChargeAllowance,
    pub reference_income: ReferenceIncomeParams,
    pub situation_rates: SituationRates,
    pub rent_rate: RentRateSlopes,
    pub participation: ParticipationParams,
    /// Amounts below this are not paid.
    pub minimum_payment: f64,
    /// Social debt levy rate.
    pub crds_rate: f64,
}

impl HousingParams {
    /// Read from `current` (in force at the evaluated month) and
    /// `two_years_before` (in force two years earlier).
    pub fn from_legislation(
        current: &LegislationSnapshot,
        two_years_before: &LegislationSnapshot,
    ) -> ParamsResult<Self> {
        Ok(Self {
            rent_ceilings: RentCeilings::read(current)?,
            charges: ChargeAllowance::read(current)?,
            reference_income: ReferenceIncomeParams::read(current, two_years_before)?,
            situation_rates: SituationRates::read(current)?,
            rent_rate: RentRateSlopes::read(current)?,
            participation: ParticipationParams::read(current)?,
            minimum_payment: current.value(PATH_MINIMUM_PAYMENT)?,
            crds_rate: current.value(PATH_CRDS_RATE)?,
        })
    }

    /// Instant at which the family base allowance is read for a month
    /// starting at `start`.
    pub fn two_years_before(start: Instant) -> Instant {
        start.offset_years(-2)
    }
}
