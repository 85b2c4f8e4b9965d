//! # Housing Subcommand
//!
//! Evaluates the housing variables of one household for one month.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use fisca_core::Period;
use fisca_eval::{EvalResult, EvaluationContext, Holder, Household};
use fisca_housing::{housing_registry, ZoneResolver};
use serde::Serialize;

use crate::ZoneTableArgs;

/// Arguments for `fisca housing`.
#[derive(Args, Debug)]
pub struct HousingArgs {
    /// Legislation file (YAML or JSON).
    #[arg(long)]
    pub legislation: PathBuf,

    /// Household description (YAML or JSON).
    #[arg(long)]
    pub household: PathBuf,

    /// Month to evaluate (YYYY-MM).
    #[arg(long)]
    pub period: Period,

    /// Only report these variables. Repeatable; default is every computed
    /// housing variable.
    #[arg(long = "variable", short = 'V')]
    pub variables: Vec<String>,

    /// Re-entry bound for calls that do not set one. Overrides
    /// `FISCA_MAX_REENTRY_DEPTH`.
    #[arg(long)]
    pub max_reentry: Option<usize>,

    #[command(flatten)]
    pub zones: ZoneTableArgs,
}

/// What `fisca housing` prints.
#[derive(Debug, Serialize)]
pub struct HousingReport {
    pub family: String,
    pub period: Period,
    pub values: BTreeMap<String, Holder>,
}

/// Execute the housing subcommand.
pub fn run_housing(args: &HousingArgs) -> Result<u8> {
    let report = housing_report(args)?;
    crate::print_json(&serde_json::to_value(&report)?)?;
    Ok(0)
}

/// Evaluate the requested variables.
pub fn housing_report(args: &HousingArgs) -> Result<HousingReport> {
    let config = args.zones.config()?;
    let max_reentry = args.max_reentry.or(config.max_reentry_depth);

    let legislation = Arc::new(crate::load(&args.legislation)?);
    let household = Household::load(&args.household)
        .with_context(|| format!("loading household from {}", args.household.display()))?;
    let zones = Arc::new(ZoneResolver::new(config.zone_source()));
    let registry = Arc::new(housing_registry(zones)?);

    let simulation = household
        .into_simulation(registry, legislation)?
        .with_default_max_reentry(max_reentry);
    let family = simulation.family().id().to_string();
    tracing::info!(%family, period = %args.period, "evaluating housing variables");

    let values = if args.variables.is_empty() {
        simulation.compute_all(args.period)?
    } else {
        args.variables
            .iter()
            .map(|name| Ok((name.clone(), simulation.compute(name, args.period)?)))
            .collect::<EvalResult<Vec<_>>>()?
    };

    Ok(HousingReport {
        family,
        period: args.period,
        values: values.into_iter().collect(),
    })
}
