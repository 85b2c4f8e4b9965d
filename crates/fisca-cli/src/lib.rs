//! # fisca-cli — Command-Line Interface
//!
//! Provides the `fisca` binary over the library crates.
//!
//! ## Subcommands
//!
//! - `fisca schedules`: category contribution schedules in force at a date.
//! - `fisca housing`: every housing variable for one household and month.
//! - `fisca zone`: the housing-cost zone of a locality code.
//!
//! ```bash
//! fisca schedules --legislation legislation.yaml --at 2015-01-01 --side employer
//! fisca housing --legislation legislation.yaml --household dupont.yaml --period 2015-03
//! fisca zone 75101 --zones zones.yaml --sublocalities sublocalities.json
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in the subcommand modules; handlers delegate to
//!   the library crates and only format their results.
//! - Every handler has a pure variant returning JSON, so output is testable
//!   without capturing stdout.

pub mod housing;
pub mod schedules;
pub mod zone;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use fisca_housing::HousingConfig;
use fisca_params::{load_legislation, Legislation};

/// Zone table locations. Flags override `FISCA_ZONE_TABLE` and
/// `FISCA_SUBLOCALITY_TABLE`.
#[derive(Args, Debug, Clone, Default)]
pub struct ZoneTableArgs {
    /// Locality → zone table (YAML or JSON).
    #[arg(long)]
    pub zones: Option<PathBuf>,

    /// Sub-locality → parent locality table (YAML or JSON).
    #[arg(long)]
    pub sublocalities: Option<PathBuf>,
}

impl ZoneTableArgs {
    /// Environment configuration with these flags applied on top.
    pub fn config(&self) -> Result<HousingConfig> {
        let mut config = HousingConfig::from_env().context("invalid housing configuration")?;
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut HousingConfig) {
        if let Some(path) = &self.zones {
            config.zone_table = Some(path.clone());
        }
        if let Some(path) = &self.sublocalities {
            config.sublocality_table = Some(path.clone());
        }
    }
}

/// Load a legislation file, naming it in the error.
pub fn load(path: &Path) -> Result<Legislation> {
    load_legislation(path).with_context(|| format!("loading legislation from {}", path.display()))
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
