//! Unary operator translation.

use z3::ast::Int;

use crate::error::{Result, SolverError};

use super::super::context::SolveCtx;
use super::super::symbols::type_symbol;
use super::super::value::SymValue;

pub fn apply(ctx: &mut SolveCtx, op: &str, var: SymValue) -> Result<SymValue> {
    match op {
        "!" => {
            let t = var
                .truthy()
                .ok_or_else(|| SolverError::Malformed("negation of a null value".into()))?;
            Ok(SymValue::Bool(t.not(), None))
        }
        // JS ~x is -(x+1)
        "~" => {
            let i = var.expect_int()?;
            Ok(SymValue::Int(
                Int::unary_minus(&Int::add(&[&i, &Int::from_i64(1)])),
                None,
            ))
        }
        "-" => {
            let i = var.expect_int()?;
            Ok(SymValue::Int(Int::unary_minus(&i), None))
        }
        "+" => {
            if var.is_int() {
                Ok(var)
            } else {
                Err(SolverError::Unsupported(format!(
                    "unary plus on {}",
                    var.describe()
                )))
            }
        }
        // the sole observable type variable of the operand
        "typeof" => {
            let name = var
                .symbol_name()
                .map(str::to_string)
                .unwrap_or_else(|| var.describe());
            let t = type_symbol(ctx, &name);
            Ok(SymValue::Str(t, Some(format!("type:{name}"))))
        }
        other => Err(SolverError::Malformed(format!(
            "unknown unary operator '{other}'"
        ))),
    }
}
