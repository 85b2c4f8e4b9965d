//! # fisca CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fisca_cli::housing::{run_housing, HousingArgs};
use fisca_cli::schedules::{run_schedules, SchedulesArgs};
use fisca_cli::zone::{run_zone, ZoneArgs};

/// Social-contribution schedules and housing benefit computation.
#[derive(Parser, Debug)]
#[command(name = "fisca", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Per-category contribution schedules in force at a date.
    Schedules(SchedulesArgs),

    /// Housing benefit variables for one household and month.
    Housing(HousingArgs),

    /// Housing-cost zone of a locality code.
    Zone(ZoneArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Schedules(args) => run_schedules(&args),
        Commands::Housing(args) => run_housing(&args),
        Commands::Zone(args) => run_zone(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
