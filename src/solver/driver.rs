//! Top-level solve: assemble the conjunction, run Z3, classify the outcome.

use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;
use z3::ast::{Ast, Bool, String as ZString};
use z3::{SatResult, Solver};

use crate::constraint::Constraint;
use crate::error::{Result, SolverError};
use crate::types::TypeTable;

use super::compile;
use super::context::{SolveCtx, SolverConfig};
use super::model;
use super::symbols::type_symbol;
use super::value::z3_string;

/// A satisfying assignment: one host-level value per referenced identifier,
/// plus the observable type of every tagged operand. The wire spelling
/// `assignements` is the upstream pipeline's.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    #[serde(rename = "assignements")]
    pub assignments: BTreeMap<String, serde_json::Value>,
    pub types: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Solution(Solution),
    /// Unsat and unknown are reported uniformly: there is no payload.
    NoSolution,
}

pub fn solve(
    constraints: &[Constraint],
    types: &TypeTable,
    config: SolverConfig,
) -> Result<SolveOutcome> {
    let mut ctx = SolveCtx::new(config);
    types.flatten_into(&mut ctx.inferred_types);
    debug!("seeded types: {:?}", ctx.inferred_types);

    let mut conjuncts: Vec<Bool> = Vec::new();

    // path constraints, truthy-coerced
    for constraint in constraints {
        match compile::compile_condition(&mut ctx, constraint)? {
            Some(condition) => {
                debug!("path constraint: {condition}");
                conjuncts.push(condition);
            }
            None => debug!("constraint carries no condition, skipping"),
        }
    }

    // helper side-constraints accumulated during compilation
    for side in std::mem::take(&mut ctx.side_constraints) {
        debug!("side constraint: {side}");
        conjuncts.push(side);
    }

    // type tags: every inferred type pins its observable type variable
    let inferred: Vec<(String, String)> = ctx
        .inferred_types
        .iter()
        .map(|(name, ty)| (name.clone(), ty.clone()))
        .collect();
    for (name, ty) in inferred {
        let tag = type_symbol(&mut ctx, &name)._eq(&z3_string(&ty)?);
        debug!("type tag: {tag}");
        conjuncts.push(tag);
    }

    // unsolvable identifiers are pinned to the empty string
    for name in &ctx.unsolvable {
        let pin = ZString::new_const(name.as_str())._eq(&ZString::from(""));
        debug!("unsolvable pin: {pin}");
        conjuncts.push(pin);
    }

    let solver = Solver::new();
    for conjunct in &conjuncts {
        solver.assert(conjunct);
    }
    match solver.check() {
        SatResult::Unsat => {
            debug!("unsat");
            Ok(SolveOutcome::NoSolution)
        }
        SatResult::Unknown => {
            debug!("solver returned unknown");
            Ok(SolveOutcome::NoSolution)
        }
        SatResult::Sat => {
            let z3_model = solver
                .get_model()
                .ok_or_else(|| SolverError::Solver("sat result without a model".into()))?;
            Ok(SolveOutcome::Solution(model::extract(&ctx, &z3_model)?))
        }
    }
}
