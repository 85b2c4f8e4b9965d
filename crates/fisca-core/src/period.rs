//! # Periods and Instants
//!
//! Benefit formulas are evaluated over half-open calendar intervals. A
//! [`Period`] is either one calendar month or one calendar year; an
//! [`Instant`] is a single day at which legislation is looked up.
//!
//! ## Shifts used by the formulas
//!
//! - [`Period::this_month()`]: normalisation applied at every formula entry.
//! - [`Period::previous_month()`] / [`Period::offset()`]: prior-month inputs.
//! - [`Period::n_2()`]: the calendar year two years before the period's
//!   start, whose [`start()`](Period::start) / [`stop()`](Period::stop)
//!   instants are used for reference-year income and ceilings.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

// ---------------------------------------------------------------------------
// Instant
// ---------------------------------------------------------------------------

/// A calendar day at which legislation parameters are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instant(NaiveDate);

impl Instant {
    /// The earliest representable instant. Versions of legislation without
    /// an explicit start date are valid from here.
    pub const MIN: Instant = Instant(NaiveDate::MIN);

    /// Build an instant from a year, month and day.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, CoreError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| CoreError::InvalidPeriod {
                input: format!("{year:04}-{month:02}-{day:02}"),
                reason: "not a valid calendar day".to_string(),
            })
    }

    /// Wrap an existing `NaiveDate`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parse an ISO `YYYY-MM-DD` string.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|e| CoreError::InvalidPeriod {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }

    /// Access the inner date.
    pub fn as_date(&self) -> &NaiveDate {
        &self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Shift by whole years, keeping month and day. February 29 maps to
    /// February 28 in non-leap target years.
    pub fn offset_years(&self, years: i32) -> Self {
        let year = self.year() + years;
        NaiveDate::from_ymd_opt(year, self.month(), self.day())
            .or_else(|| NaiveDate::from_ymd_opt(year, self.month(), 28))
            .map(Self)
            .unwrap_or(*self)
    }

    /// The most recent July 1st on or before this instant.
    ///
    /// The hourly minimum wage is revalued every July; several ceilings are
    /// pinned to the rate in force at that date.
    pub fn last_july_first(&self) -> Self {
        let year = if self.month() >= 7 {
            self.year()
        } else {
            self.year() - 1
        };
        Self(first_day(year, 7))
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

// ---------------------------------------------------------------------------
// Period
// ---------------------------------------------------------------------------

/// Granularity of a [`Period`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodUnit {
    Month,
    Year,
}

/// A half-open calendar interval: one month or one calendar year.
///
/// Serialized as `"YYYY-MM"` (month) or `"YYYY"` (year).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    unit: PeriodUnit,
    year: i32,
    /// Always 1 for yearly periods.
    month: u32,
}

impl Period {
    /// The calendar month `year-month`.
    pub fn month(year: i32, month: u32) -> Result<Self, CoreError> {
        check_year(year, &format!("{year}-{month:02}"))?;
        if !(1..=12).contains(&month) {
            return Err(CoreError::InvalidPeriod {
                input: format!("{year}-{month:02}"),
                reason: "month out of range".to_string(),
            });
        }
        Ok(Self {
            unit: PeriodUnit::Month,
            year,
            month,
        })
    }

    /// The calendar year `year`.
    pub fn year(year: i32) -> Result<Self, CoreError> {
        check_year(year, &year.to_string())?;
        Ok(Self {
            unit: PeriodUnit::Year,
            year,
            month: 1,
        })
    }

    pub fn unit(&self) -> PeriodUnit {
        self.unit
    }

    /// First day of the period.
    pub fn start(&self) -> Instant {
        Instant(first_day(self.year, self.month))
    }

    /// Last day of the period (inclusive).
    pub fn stop(&self) -> Instant {
        let next = self.offset(1);
        let date = first_day(next.year, next.month);
        Instant(date.pred_opt().unwrap_or(date))
    }

    /// Whether `instant` falls inside this period.
    pub fn contains(&self, instant: Instant) -> bool {
        self.start() <= instant && instant <= self.stop()
    }

    /// The month containing this period's start.
    pub fn this_month(&self) -> Self {
        Self {
            unit: PeriodUnit::Month,
            year: self.year,
            month: self.month,
        }
    }

    /// The month before this period's start month.
    pub fn previous_month(&self) -> Self {
        self.this_month().offset(-1)
    }

    /// Shift by `n` units of this period's own granularity.
    pub fn offset(&self, n: i32) -> Self {
        match self.unit {
            PeriodUnit::Month => {
                let index = self.year * 12 + (self.month as i32 - 1) + n;
                Self {
                    unit: PeriodUnit::Month,
                    year: index.div_euclid(12),
                    month: index.rem_euclid(12) as u32 + 1,
                }
            }
            PeriodUnit::Year => Self {
                unit: PeriodUnit::Year,
                year: self.year + n,
                month: 1,
            },
        }
    }

    /// Reference year `n-2`: the calendar year two years before this
    /// period's start.
    pub fn n_2(&self) -> Self {
        Self {
            unit: PeriodUnit::Year,
            year: self.year - 2,
            month: 1,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            PeriodUnit::Month => write!(f, "{:04}-{:02}", self.year, self.month),
            PeriodUnit::Year => write!(f, "{:04}", self.year),
        }
    }
}

impl FromStr for Period {
    type Err = CoreError;

    /// Parse `"YYYY-MM"` or `"YYYY"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CoreError::InvalidPeriod {
            input: s.to_string(),
            reason: reason.to_string(),
        };
        let trimmed = s.trim();
        match trimmed.split_once('-') {
            Some((y, m)) => {
                let year = y.parse::<i32>().map_err(|_| invalid("year is not a number"))?;
                let month = m.parse::<u32>().map_err(|_| invalid("month is not a number"))?;
                Self::month(year, month)
            }
            None => {
                let year = trimmed
                    .parse::<i32>()
                    .map_err(|_| invalid("year is not a number"))?;
                Self::year(year)
            }
        }
    }
}

impl TryFrom<String> for Period {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

fn check_year(year: i32, input: &str) -> Result<(), CoreError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(CoreError::InvalidPeriod {
            input: input.to_string(),
            reason: format!("year must be within {MIN_YEAR}..={MAX_YEAR}"),
        })
    }
}

/// First day of a month. `month` is always 1..=12 here; only years pushed
/// outside chrono's range by extreme offsets fall back to `NaiveDate::MIN`.
fn first_day(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn offset_is_invertible(year in 1900i32..2100, month in 1u32..=12, n in -240i32..240) {
            let p = Period::month(year, month).unwrap();
            prop_assert_eq!(p.offset(n).offset(-n), p);
        }

        #[test]
        fn stop_is_before_next_start(year in 1900i32..2100, month in 1u32..=12) {
            let p = Period::month(year, month).unwrap();
            prop_assert!(p.stop() < p.offset(1).start());
            prop_assert!(p.start() <= p.stop());
        }
    }
}
