//! Constraint-solving backend for a taint-driven postMessage exploitation
//! pipeline.
//!
//! Upstream, a dynamic taint analyzer records the chain of operations an
//! untrusted input (`event`, `event.data`, `event.origin`) traverses inside a
//! web program and emits the path conditions as JSON. This crate lifts that
//! trace into a typed Z3 expression graph (strings, integers, booleans and
//! Int->String arrays), solves the conjunction, and turns a satisfying model
//! into a concrete payload assignment for every tainted identifier.

pub mod constraint; // Serde data model of the recorded trace
pub mod error;
pub mod regex_parser; // JS-like regex literals -> tagged parse tree
pub mod solver; // Compilation, coercion, solving, model extraction
pub mod types; // Input type table and flattening

pub use constraint::SolveRequest;
pub use error::SolverError;
pub use solver::{solve, Solution, SolveOutcome, SolverConfig};
