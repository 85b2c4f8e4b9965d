//! # Scale — Piecewise Bracket Schedules
//!
//! A [`Scale`] maps an earnings base to a contribution (or benefit) through
//! marginal rates applied per bracket. Thresholds start at 0 and strictly
//! increase; an optional ceiling caps the base before brackets apply.
//!
//! Contribution scales are legislated with thresholds expressed as multiples
//! of the social-security ceiling; [`Scale::scaled()`] turns them into
//! currency amounts once the annual ceiling is known.

use serde::{Deserialize, Serialize};

use crate::error::{ParamsError, ParamsResult};

/// One bracket: `rate` applies to the part of the base at or above
/// `threshold` and below the next bracket's threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub threshold: f64,
    pub rate: f64,
}

impl Bracket {
    pub fn new(threshold: f64, rate: f64) -> Self {
        Self { threshold, rate }
    }
}

/// An immutable, validated bracket schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScale")]
pub struct Scale {
    brackets: Vec<Bracket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ceiling: Option<f64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScale {
    brackets: Vec<Bracket>,
    #[serde(default)]
    ceiling: Option<f64>,
}

impl TryFrom<RawScale> for Scale {
    type Error = ParamsError;

    fn try_from(raw: RawScale) -> Result<Self, Self::Error> {
        Scale::new(raw.brackets, raw.ceiling)
    }
}

impl Scale {
    /// Validate and build a scale.
    ///
    /// # Errors
    ///
    /// [`ParamsError::InvalidScale`] if there are no brackets, the first
    /// threshold is not 0, thresholds are not strictly increasing, any
    /// number is not finite, or the ceiling is negative.
    pub fn new(brackets: Vec<Bracket>, ceiling: Option<f64>) -> ParamsResult<Self> {
        let invalid = |reason: String| ParamsError::InvalidScale { reason };

        let first = brackets
            .first()
            .ok_or_else(|| invalid("a scale needs at least one bracket".to_string()))?;
        if first.threshold != 0.0 {
            return Err(invalid(format!(
                "first threshold must be 0, got {}",
                first.threshold
            )));
        }
        if let Some(b) = brackets
            .iter()
            .find(|b| !b.threshold.is_finite() || !b.rate.is_finite())
        {
            return Err(invalid(format!("non-finite bracket {b:?}")));
        }
        if let Some(pair) = brackets
            .windows(2)
            .find(|pair| pair[1].threshold <= pair[0].threshold)
        {
            return Err(invalid(format!(
                "thresholds must be strictly increasing ({} then {})",
                pair[0].threshold, pair[1].threshold
            )));
        }
        if let Some(c) = ceiling {
            if !c.is_finite() || c < 0.0 {
                return Err(invalid(format!("ceiling must be a non-negative number, got {c}")));
            }
        }

        Ok(Self { brackets, ceiling })
    }

    /// A single-bracket scale: `rate` on the whole base.
    pub fn flat(rate: f64) -> ParamsResult<Self> {
        Self::new(vec![Bracket::new(0.0, rate)], None)
    }

    pub fn brackets(&self) -> &[Bracket] {
        &self.brackets
    }

    pub fn ceiling(&self) -> Option<f64> {
        self.ceiling
    }

    /// Multiply every threshold (and the ceiling) by `factor`.
    ///
    /// Rates are unchanged. `factor` must be strictly positive so that
    /// thresholds stay strictly increasing.
    pub fn scaled(&self, factor: f64) -> ParamsResult<Self> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(ParamsError::InvalidScale {
                reason: format!("scaling factor must be positive, got {factor}"),
            });
        }
        Ok(Self {
            brackets: self
                .brackets
                .iter()
                .map(|b| Bracket::new(b.threshold * factor, b.rate))
                .collect(),
            ceiling: self.ceiling.map(|c| c * factor),
        })
    }

    /// Contribution owed on `base`: the sum over brackets of the marginal
    /// rate times the slice of the (ceiling-capped) base in that bracket.
    pub fn calc(&self, base: f64) -> f64 {
        let base = match self.ceiling {
            Some(c) => base.min(c),
            None => base,
        };
        if base <= 0.0 {
            return 0.0;
        }
        self.brackets
            .iter()
            .enumerate()
            .map(|(i, bracket)| {
                let upper = self
                    .brackets
                    .get(i + 1)
                    .map_or(base, |next| next.threshold.min(base));
                (upper - bracket.threshold).max(0.0) * bracket.rate
            })
            .sum()
    }

    /// Marginal rate applying to the last unit of `base`.
    pub fn marginal_rate(&self, base: f64) -> f64 {
        self.brackets
            .iter()
            .take_while(|b| b.threshold <= base)
            .last()
            .map_or(0.0, |b| b.rate)
    }
}
