//! Error taxonomy for the constraint compiler.
//!
//! Only conditions that abort the current solve are errors. Identifiers the
//! compiler cannot type are not errors; they are collected in the solve
//! context's unsolvable set and pinned to the empty string. Unsatisfiable or
//! unknown solver outcomes are reported as `SolveOutcome::NoSolution`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SolverError>;

#[derive(Error, Debug)]
pub enum SolverError {
    /// The trace uses a construct the modelling cannot express (complex
    /// object bases, array concat, call/apply/bind, arrays of unknown
    /// length, non-static slice indices, ...).
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The constraint tree is structurally invalid for the operation it
    /// records (missing operands, non-numeric accessor, ...).
    #[error("malformed constraint: {0}")]
    Malformed(String),

    /// The input document could not be deserialized.
    #[error("invalid input: {0}")]
    Input(#[from] serde_json::Error),

    /// The SMT backend misbehaved (e.g. sat without a model).
    #[error("solver failure: {0}")]
    Solver(String),
}
