//! The constraint compiler and solver driver.
//!
//! **Architecture Overview:**
//! ```text
//! JSON constraints + type table
//!          |
//!    compile (dispatch walk)
//!     |            |
//! translators   symbols/coerce
//!     |            |
//!     +-----+------+
//!           |
//!   SolveCtx (side-constraints, registries)
//!           |
//!    driver (conjunction -> Z3)
//!           |
//!    model (assignments + types)
//! ```
//!
//! Every compile routine threads a `&mut SolveCtx`: the registries the
//! reference implementation kept in process globals live for exactly one
//! `solve` call here, so back-to-back solves cannot contaminate each other.
//! Z3 terms never escape this module tree: the driver returns host-level
//! JSON values only.

pub mod coerce;
pub mod compile;
pub mod context;
pub mod driver;
pub mod model;
pub mod regex;
pub mod symbols;
pub mod translators;
pub mod value;

pub use context::{SolveCtx, SolverConfig};
pub use driver::{solve, Solution, SolveOutcome};
pub use value::SymValue;
