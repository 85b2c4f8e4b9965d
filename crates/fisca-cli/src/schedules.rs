//! # Schedules Subcommand
//!
//! Builds the employer and employee contribution schedules from the
//! legislation version in force at a date and prints them by category.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use fisca_core::Instant;
use fisca_params::{ContributionScheduleBuilder, ContributionSide};

/// Arguments for `fisca schedules`.
#[derive(Args, Debug)]
pub struct SchedulesArgs {
    /// Legislation file (YAML or JSON).
    #[arg(long)]
    pub legislation: PathBuf,

    /// Date the legislation must be in force at (YYYY-MM-DD).
    #[arg(long, value_parser = Instant::parse)]
    pub at: Instant,

    /// Print only one side.
    #[arg(long, value_enum)]
    pub side: Option<Side>,
}

/// Contribution side as a command-line value.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Employer,
    Employee,
}

impl From<Side> for ContributionSide {
    fn from(side: Side) -> Self {
        match side {
            Side::Employer => ContributionSide::Employer,
            Side::Employee => ContributionSide::Employee,
        }
    }
}

/// Execute the schedules subcommand.
pub fn run_schedules(args: &SchedulesArgs) -> Result<u8> {
    let output = schedules_json(&args.legislation, args.at, args.side)?;
    crate::print_json(&output)?;
    Ok(0)
}

/// Schedules in force at `at`, as JSON keyed by category.
pub fn schedules_json(
    legislation: &Path,
    at: Instant,
    side: Option<Side>,
) -> Result<serde_json::Value> {
    let legislation = crate::load(legislation)?;
    let snapshot = legislation.at(at)?;
    let set = ContributionScheduleBuilder::build_from_snapshot(snapshot)
        .with_context(|| format!("building contribution schedules in force at {at}"))?;
    let value = match side {
        Some(side) => serde_json::to_value(set.side(side.into()))?,
        None => serde_json::to_value(&set)?,
    };
    Ok(value)
}
