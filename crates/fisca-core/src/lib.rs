//! # fisca-core — Foundational Types for the fisca Rule Stack
//!
//! Leaf crate of the workspace. It defines the vocabulary every other crate
//! speaks: when a value applies ([`Period`], [`Instant`]), which employment
//! class a contribution schedule belongs to ([`Category`]), and who a value
//! belongs to inside a household ([`Family`], [`Role`]).
//!
//! ## Key Design Principles
//!
//! 1. **Single `Category` enum.** Seven variants, exhaustive `match`
//!    everywhere. A schedule set that forgets a category does not compile.
//!
//! 2. **Month-granular periods.** Benefit formulas are evaluated per month;
//!    annual reference periods (the `n-2` reference year) are derived from a
//!    month, never constructed ad hoc from raw dates.
//!
//! 3. **Validated households.** A [`Family`] always has exactly one head and
//!    at most one partner; role aggregation can rely on it.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `fisca-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod category;
pub mod entity;
pub mod error;
pub mod period;
pub mod rounding;

pub use category::{Category, CATEGORY_COUNT};
pub use entity::{Family, FamilyId, IndividualId, Member, Role};
pub use error::CoreError;
pub use period::{Instant, Period, PeriodUnit};
pub use rounding::{ceil_to_multiple, round_to};
