//! # fisca-params — Legislated Parameters
//!
//! Everything that comes from legislation data rather than from a
//! household: plain values, marginal-rate [`Scale`]s, nested
//! [`ScaleTree`]s of scales, and dated [`Legislation`] versions that
//! resolve dotted paths such as `al.pp.taux` at an [`Instant`].
//!
//! ## Modules
//!
//! - [`scale`]: bracket schedules and their evaluation.
//! - [`tree`]: keyed trees of scales with non-mutating rewrites.
//! - [`legislation`]: versioned parameter snapshots and path lookup.
//! - [`parser`]: YAML/JSON loading with file-path-carrying errors.
//! - [`contributions`]: restructures raw contribution sections into one
//!   schedule per employment [`Category`](fisca_core::Category).
//!
//! ## Crate Policy
//!
//! - Depends only on `fisca-core` among workspace crates.
//! - Every lookup failure is an error value; nothing falls back silently.
//!
//! [`Instant`]: fisca_core::Instant

pub mod contributions;
pub mod error;
pub mod legislation;
pub mod parser;
pub mod scale;
pub mod tree;

pub use contributions::{
    preprocess_all, preprocess_legislation, CategorySchedules, ContributionScheduleBuilder,
    ContributionScheduleSet, ContributionSide,
};
pub use error::{ParamsError, ParamsResult};
pub use legislation::{Legislation, LegislationSnapshot, ParameterNode};
pub use parser::{load_json_typed, load_legislation, load_typed, load_yaml_typed};
pub use scale::{Bracket, Scale};
pub use tree::{ScaleNode, ScaleTree};
