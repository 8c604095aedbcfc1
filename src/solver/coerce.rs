//! Type inference and coercion.
//!
//! Before a binary operator is applied, the running chain value and the
//! recorded operand are normalised against each other: lazy short-circuit
//! shapes are forced when the other side is not boolean, an untyped symbol
//! takes the sort of a concretely-sorted operand (recording the inference
//! for the final type tags), and literals are promoted across the
//! integer/string duality. Comparing against the empty string is special:
//! it is a non-emptiness probe, not evidence the symbol is a string.

use z3::ast::{Ast, Bool, Int, String as ZString};

use crate::constraint::{Op, Operand};
use crate::error::Result;
use crate::error::SolverError;

use super::context::SolveCtx;
use super::symbols::{bool_symbol, int_symbol, string_symbol};
use super::value::{z3_string, SymValue};

pub fn coerce(
    ctx: &mut SolveCtx,
    var: SymValue,
    other: SymValue,
) -> Result<(SymValue, SymValue)> {
    let mut var = var;
    let mut other = other;
    if other.is_lazy() && !var.is_bool_like() {
        other = other.reduce(ctx)?;
    }
    if var.is_lazy() && !other.is_bool_like() {
        var = var.reduce(ctx)?;
    }

    if let Some(name) = var.symbol_name().map(str::to_string) {
        // boolean beats integer beats string
        if other.is_bool() && !var.is_bool() {
            if ctx.record_inferred(&name, "boolean") {
                let b = bool_symbol(ctx, &name);
                return Ok((SymValue::Bool(b, Some(name)), other));
            }
            return Ok((var, other));
        }
        if other.is_string() && !var.is_string() {
            if other.as_literal_str().as_deref() == Some("") {
                // non-emptiness probe: rewrite the literal instead
                if var.is_bool() {
                    return Ok((var, SymValue::Bool(Bool::from_bool(false), None)));
                }
                if var.is_int() {
                    return Ok((var, SymValue::Int(Int::from_i64(0), None)));
                }
                return Ok((var, other));
            }
            if ctx.record_inferred(&name, "string") {
                let s = string_symbol(ctx, &name);
                return Ok((SymValue::Str(s, Some(name)), other));
            }
            return promote_literal(var, other);
        }
        if other.is_int() && !var.is_int() {
            if ctx.record_inferred(&name, "number") {
                let i = int_symbol(ctx, &name);
                return Ok((SymValue::Int(i, Some(name)), other));
            }
            return promote_literal(var, other);
        }
        return Ok((var, other));
    }

    promote_literal(var, other)
}

/// Integer/string duality for literal operands against a concretely-sorted
/// left side: `"x" + 5` sees `"5"`, `len == "3"` sees `3`.
fn promote_literal(var: SymValue, other: SymValue) -> Result<(SymValue, SymValue)> {
    if var.is_string() {
        if let Some(n) = other.as_literal_int() {
            return Ok((var, SymValue::Str(z3_string(&n.to_string())?, None)));
        }
    }
    if var.is_int() {
        if let Some(s) = other.as_literal_str() {
            let n: i64 = s.trim().parse().map_err(|_| {
                SolverError::Unsupported(format!("cannot interpret {s:?} as an integer"))
            })?;
            return Ok((var, SymValue::Int(Int::from_i64(n), None)));
        }
    }
    Ok((var, other))
}

/// typeof-vs-string-literal widening: a comparison between a `type:` symbol
/// and a string literal also accepts the literal "JSON", so payloads routed
/// through `JSON.parse` stay compatible with both outcomes. Equality widens
/// disjunctively, inequality takes the conjunctive analogue.
pub fn typeof_widening(op: &Op, var: &SymValue, other: &SymValue) -> Option<SymValue> {
    let op_name = op.op.as_deref()?;
    let eq = matches!(op_name, "==" | "===");
    let ne = matches!(op_name, "!=" | "!==");
    if !eq && !ne {
        return None;
    }
    if !matches!(op.val, Some(Operand::Str(_))) {
        return None;
    }
    let is_type_symbol = |v: &SymValue| {
        matches!(v, SymValue::Str(_, Some(name)) if name.starts_with("type:"))
    };
    let (type_side, other_side) = if is_type_symbol(var) {
        (var, other)
    } else if is_type_symbol(other) {
        (other, var)
    } else {
        return None;
    };
    let (t, o) = match (type_side, other_side) {
        (SymValue::Str(t, _), SymValue::Str(o, _)) => (t, o),
        _ => return None,
    };
    let lit_eq = t._eq(o);
    let json_eq = t._eq(&ZString::from("JSON"));
    Some(SymValue::Bool(
        if eq {
            Bool::or(&[&lit_eq, &json_eq])
        } else {
            Bool::and(&[&lit_eq, &json_eq])
        },
        None,
    ))
}
