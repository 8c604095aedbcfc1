//! Model extraction: Z3 model -> host-level JSON values.
//!
//! Only tracked symbols are read back, so solver-internal declarations never
//! leak. `__ignore_` helpers are dropped, `type:` symbols feed the types
//! map, and every identifier the compilation ever touched gets an entry,
//! defaulting to the empty string.

use std::collections::BTreeMap;

use serde_json::Value;
use z3::ast::{Ast, Dynamic, Int};
use z3::{Model, SortKind};

use crate::error::{Result, SolverError};

use super::context::SolveCtx;
use super::driver::Solution;

pub fn extract(ctx: &SolveCtx, model: &Model) -> Result<Solution> {
    let mut assignments = BTreeMap::new();
    let mut types = BTreeMap::new();

    for (name, term) in &ctx.symbols {
        if name == "event" || name.starts_with("__ignore_") || name.starts_with("type:") {
            continue;
        }
        assignments.insert(name.clone(), concretize(model, term)?);
    }

    for operand in &ctx.type_symbols {
        if let Some(term) = ctx.symbols.get(&format!("type:{operand}")) {
            if let Value::String(ty) = concretize(model, term)? {
                types.insert(operand.clone(), ty);
            }
        }
    }

    for identifier in &ctx.identifiers {
        if identifier == "event" {
            continue;
        }
        assignments
            .entry(identifier.clone())
            .or_insert_with(|| Value::String(String::new()));
    }

    Ok(Solution { assignments, types })
}

fn concretize(model: &Model, term: &Dynamic) -> Result<Value> {
    if term.sort_kind() == SortKind::Array {
        let arr = term.as_array().ok_or_else(|| {
            SolverError::Solver("array-sorted term is not an array".into())
        })?;
        // the model represents arrays as functions; three low indices is
        // the agreed projection, the true length is not recoverable
        let mut items = Vec::with_capacity(3);
        for i in 0..3 {
            items.push(scalar(model, &arr.select(&Int::from_i64(i)))?);
        }
        return Ok(Value::Array(items));
    }
    scalar(model, term)
}

fn scalar(model: &Model, term: &Dynamic) -> Result<Value> {
    let evaluated = model
        .eval(term, true)
        .ok_or_else(|| SolverError::Solver(format!("model has no value for {term}")))?;
    if let Some(s) = evaluated.as_string() {
        return s
            .as_string()
            .map(Value::String)
            .ok_or_else(|| SolverError::Solver(format!("non-constant string value {s}")));
    }
    if let Some(i) = evaluated.as_int() {
        return Ok(match i.as_i64() {
            Some(n) => Value::from(n),
            // beyond i64: keep the decimal text
            None => Value::String(i.to_string()),
        });
    }
    if let Some(b) = evaluated.as_bool() {
        if let Some(v) = b.as_bool() {
            return Ok(Value::Bool(v));
        }
    }
    Err(SolverError::Solver(format!(
        "cannot concretize model value {evaluated}"
    )))
}
