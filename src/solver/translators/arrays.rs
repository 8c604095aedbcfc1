//! The array-operation library.
//!
//! Arrays only exist as bounded fabrications (split results, constant
//! lists), so the library is small: `pop` reads the last recorded element.
//! Mutating operations are not modelled.

use z3::ast::{Array, Int, String as ZString};

use crate::constraint::Operand;
use crate::error::{Result, SolverError};

use super::super::context::SolveCtx;
use super::super::value::SymValue;

pub fn handles(name: &str) -> bool {
    name == "pop"
}

pub fn apply(
    ctx: &mut SolveCtx,
    name: &str,
    var: SymValue,
    _args: &[Operand],
) -> Result<SymValue> {
    match name {
        "pop" => pop(ctx, var),
        other => Err(SolverError::Unsupported(format!(
            "array function '{other}' is not modelled"
        ))),
    }
}

fn pop(ctx: &mut SolveCtx, var: SymValue) -> Result<SymValue> {
    let name = match &var {
        SymValue::Array(_, name) => name,
        other => {
            return Err(SolverError::Unsupported(format!(
                "pop on {}",
                other.describe()
            )))
        }
    };
    let last = ctx
        .array_elems
        .get(name)
        .and_then(|elems| elems.last())
        .cloned()
        .ok_or_else(|| {
            SolverError::Unsupported("pop on an array with unknown elements".into())
        })?;
    Ok(SymValue::Str(last, None))
}

/// Read one string-sorted slot of an array term.
pub fn select_str(arr: &Array, index: i64) -> Result<ZString> {
    arr.select(&Int::from_i64(index))
        .as_string()
        .ok_or_else(|| SolverError::Solver("array select did not produce a string term".into()))
}
