//! # fisca-housing — Housing Benefit
//!
//! The rental housing benefit for one household and one month: resource
//! base, rent retained under a zone ceiling, personal participation,
//! minimum-payment floor, CRDS levy, and attribution to one of three
//! benefit variants.
//!
//! ## Modules
//!
//! - [`stages`]: the arithmetic, as pure functions of parameters and a
//!   [`RentalSituation`].
//! - [`formulas`]: variables registered with the evaluator; gathers the
//!   situation from household inputs at the right periods.
//! - [`params`]: legislated values read once per evaluation.
//! - [`zone`]: locality → zone tables, loaded once on first use.
//! - [`config`]: environment configuration.
//!
//! ## Usage
//!
//! ```ignore
//! let config = HousingConfig::from_env()?;
//! let zones = Arc::new(ZoneResolver::new(config.zone_source()));
//! let registry = Arc::new(housing_registry(zones)?);
//! let simulation = household.into_simulation(registry, legislation)?
//!     .with_default_max_reentry(config.max_reentry_depth);
//! let benefit = simulation.float(HOUSING_BENEFIT, period)?;
//! ```

pub mod config;
pub mod error;
pub mod formulas;
pub mod occupancy;
pub mod params;
pub mod stages;
pub mod zone;

pub use config::HousingConfig;
pub use error::{ConfigError, ZoneError};
pub use formulas::{housing_registry, register_housing_variables, HOUSING_BENEFIT};
pub use occupancy::OccupancyStatus;
pub use params::HousingParams;
pub use stages::{rental_benefit, BenefitBreakdown, Composition, RentalSituation};
pub use zone::{Zone, ZoneResolver, ZoneSource, ZoneTable};
