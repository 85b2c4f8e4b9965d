//! # fisca-eval — Variable Evaluation
//!
//! A small dependency-driven evaluator. Benefit formulas are registered as
//! variables and pull what they need from an [`EvaluationContext`]: other
//! variables at shifted periods, role aggregates over the family, and
//! legislation parameters at chosen instants. Nothing is computed that no
//! formula asks for.
//!
//! ## Key Design Principles
//!
//! 1. **Explicit call stack.** [`Simulation`] records every `(variable,
//!    period)` frame in flight. Mutually dependent programs terminate
//!    through a per-call re-entry bound that substitutes the variable's
//!    declared default, never through unbounded recursion.
//!
//! 2. **Typed entity levels.** A variable is per individual or per family
//!    ([`EntityKind`]); supplying or computing the wrong shape is an error,
//!    not a silent broadcast.
//!
//! 3. **Shared, immutable inputs.** Registry and legislation are behind
//!    `Arc` and shared across simulations; each simulation owns only its
//!    household's inputs and memo.

pub mod aggregate;
pub mod context;
pub mod error;
pub mod household;
pub mod registry;
pub mod simulation;
pub mod value;

pub use aggregate::RoleSplit;
pub use context::EvaluationContext;
pub use error::{EvalError, EvalResult};
pub use household::{Household, InputValue};
pub use registry::{Formula, VariableDef, VariableRegistry};
pub use simulation::Simulation;
pub use value::{EntityKind, Holder, Value};
