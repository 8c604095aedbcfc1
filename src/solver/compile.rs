//! The recursive dispatch walk over constraint trees.
//!
//! A leaf seeds its value from a literal or the symbol factory and folds
//! every recorded op over it in order; an internal node compiles its
//! children and combines them. Parent-element access resolves through the
//! substitution map so every accessor chain agrees on the parent's concrete
//! value.

use log::debug;
use z3::ast::{Ast, Bool, Int, String as ZString};

use crate::constraint::{Constraint, Identifier, Op, OpKind, Operand, Side};
use crate::error::{Result, SolverError};

use super::coerce;
use super::context::SolveCtx;
use super::symbols::{string_symbol, symbol_for_identifier, value_from_literal};
use super::translators::arrays::{self, select_str};
use super::translators::{binary, strings, unary};
use super::value::{z3_string, SymValue};

/// Compile a top-level constraint into its path condition. `None` means the
/// constraint carries no condition at all (e.g. a bare null).
pub fn compile_condition(ctx: &mut SolveCtx, constraint: &Constraint) -> Result<Option<Bool>> {
    let value = compile_constraint(ctx, constraint)?;
    Ok(value.truthy())
}

pub fn compile_operand(ctx: &mut SolveCtx, operand: &Operand) -> Result<SymValue> {
    match operand {
        Operand::Node(node) => compile_constraint(ctx, node),
        Operand::Str(s) => Ok(SymValue::Str(z3_string(s)?, None)),
        Operand::Bool(b) => Ok(SymValue::Bool(Bool::from_bool(*b), None)),
        Operand::Int(n) => Ok(SymValue::Int(Int::from_i64(*n), None)),
        Operand::Null => Ok(SymValue::Nil),
        Operand::List(_) => Err(SolverError::Malformed(
            "list literal outside a base or real-value position".into(),
        )),
    }
}

pub fn compile_constraint(ctx: &mut SolveCtx, constraint: &Constraint) -> Result<SymValue> {
    if let Some(kind) = constraint.kind {
        return compile_internal(ctx, constraint, kind);
    }

    let mut var = if constraint.is_real_value {
        let literal = constraint
            .value
            .as_ref()
            .or(constraint.val.as_ref())
            .ok_or_else(|| {
                SolverError::Malformed("real-value marker without a value".into())
            })?;
        value_from_literal(ctx, literal)?
    } else if let Some(identifier) = &constraint.identifier {
        symbol_for_identifier(ctx, identifier)?
    } else {
        // the empty object, e.g. the fallback of `x || {}`
        return Ok(SymValue::Nil);
    };

    for op in &constraint.ops {
        var = apply_op(ctx, constraint, op, var)?;
    }
    Ok(var)
}

fn compile_internal(ctx: &mut SolveCtx, c: &Constraint, kind: OpKind) -> Result<SymValue> {
    let op_name = |c: &Constraint| {
        c.op.clone()
            .ok_or_else(|| SolverError::Malformed("internal node without an operator".into()))
    };
    match kind {
        OpKind::Logical => {
            let left = compile_operand(ctx, required(&c.l_val, "l_val")?)?;
            let right = compile_operand(ctx, required(&c.r_val, "r_val")?)?;
            make_logical(&op_name(c)?, left, right)
        }
        OpKind::Binary => {
            let left = compile_operand(ctx, required(&c.l_val, "l_val")?)?;
            let right = compile_operand(ctx, required(&c.r_val, "r_val")?)?;
            binary::apply(ctx, &op_name(c)?, left, right)
        }
        OpKind::Unary => {
            let value = compile_operand(ctx, required(&c.val, "val")?)?;
            unary::apply(ctx, &op_name(c)?, value)
        }
        other => Err(SolverError::Malformed(format!(
            "unexpected constraint node type {other:?}"
        ))),
    }
}

fn required<'a>(operand: &'a Option<Operand>, what: &str) -> Result<&'a Operand> {
    operand
        .as_ref()
        .ok_or_else(|| SolverError::Malformed(format!("internal node missing {what}")))
}

/// Combine two compiled sides under JS short-circuit semantics. A side that
/// carries no constraint propagates the other one.
pub fn make_logical(op: &str, left: SymValue, right: SymValue) -> Result<SymValue> {
    let left_nil = matches!(left, SymValue::Nil);
    let right_nil = matches!(right, SymValue::Nil);
    if left_nil && right_nil {
        return Ok(SymValue::Nil);
    }
    if left_nil || right_nil {
        let side = if left_nil { right } else { left };
        return Ok(match side.truthy() {
            Some(b) => SymValue::Bool(b, None),
            None => SymValue::Nil,
        });
    }
    if op == "&&" {
        let guard = left
            .truthy()
            .ok_or_else(|| SolverError::Malformed("null guard in &&".into()))?;
        Ok(SymValue::GuardedAnd(guard, Box::new(right)))
    } else {
        Ok(SymValue::TruthyOr(Box::new(left), Box::new(right)))
    }
}

fn apply_op(ctx: &mut SolveCtx, c: &Constraint, op: &Op, var: SymValue) -> Result<SymValue> {
    match op.kind {
        OpKind::OpsOnParent => parent_access(ctx, c, op, var),
        OpKind::MemberFunction => member_function(ctx, op, var),
        OpKind::Binary => binary_op(ctx, op, var),
        OpKind::Unary => {
            let name = op
                .op
                .as_deref()
                .ok_or_else(|| SolverError::Malformed("unary op without an operator".into()))?;
            unary::apply(ctx, name, var)
        }
        OpKind::Iterator => iterator_access(op, var),
        OpKind::ExternalFunction => external_function(ctx, c, op, var),
        OpKind::Logical => logical_op(ctx, op, var),
        OpKind::Unknown => {
            debug!("skipping op of unsupported kind");
            Ok(var)
        }
    }
}

fn member_function(ctx: &mut SolveCtx, op: &Op, var: SymValue) -> Result<SymValue> {
    let var = var.reduce(ctx)?;
    let name = op
        .function_name
        .as_deref()
        .ok_or_else(|| SolverError::Malformed("member call without a function name".into()))?;
    if strings::handles(name) {
        strings::apply(ctx, name, var, &op.args)
    } else if arrays::handles(name) {
        arrays::apply(ctx, name, var, &op.args)
    } else if matches!(name, "call" | "apply" | "bind") {
        Err(SolverError::Unsupported(
            "calls through function pointers are not modelled".into(),
        ))
    } else {
        Err(SolverError::Unsupported(format!(
            "member function '{name}' is not modelled"
        )))
    }
}

fn binary_op(ctx: &mut SolveCtx, op: &Op, var: SymValue) -> Result<SymValue> {
    let op_name = op
        .op
        .as_deref()
        .ok_or_else(|| SolverError::Malformed("binary op without an operator".into()))?;
    let other = match &op.val {
        Some(operand) => compile_operand(ctx, operand)?,
        // the recorder omits the operand for comparisons against ""
        None => SymValue::Str(ZString::from(""), None),
    };

    if matches!(other, SymValue::Nil) {
        // comparison against null: truthiness negation or assertion
        return match op_name {
            "==" | "===" => {
                let t = var.truthy().ok_or_else(|| {
                    SolverError::Malformed("null compared against null".into())
                })?;
                Ok(SymValue::Bool(t.not(), None))
            }
            "!=" | "!==" => {
                let t = var.truthy().ok_or_else(|| {
                    SolverError::Malformed("null compared against null".into())
                })?;
                Ok(SymValue::Bool(t, None))
            }
            _ => Ok(var),
        };
    }

    let (var, other) = coerce::coerce(ctx, var, other)?;
    if let Some(widened) = coerce::typeof_widening(op, &var, &other) {
        return Ok(widened);
    }
    // `side: right` records the chain value on the right of the original
    // expression
    let (lhs, rhs) = if op.side == Some(Side::Right) {
        (other, var)
    } else {
        (var, other)
    };
    binary::apply(ctx, op_name, lhs, rhs)
}

fn logical_op(ctx: &mut SolveCtx, op: &Op, var: SymValue) -> Result<SymValue> {
    let op_name = op
        .op
        .as_deref()
        .ok_or_else(|| SolverError::Malformed("logical op without an operator".into()))?;
    let other = match &op.val {
        Some(operand) => compile_operand(ctx, operand)?,
        None => SymValue::Str(ZString::from(""), None),
    };
    let (left, right) = match op.side {
        Some(Side::Right) => (other, var),
        _ => (var, other),
    };
    make_logical(op_name, left, right)
}

fn iterator_access(op: &Op, var: SymValue) -> Result<SymValue> {
    match var {
        SymValue::Array(arr, _) => {
            let index = op.accessed_elem.ok_or_else(|| {
                SolverError::Malformed("iterator access without an element index".into())
            })?;
            Ok(SymValue::Str(select_str(&arr, index)?, None))
        }
        other => Err(SolverError::Malformed(format!(
            "iterator access on non-array {}",
            other.describe()
        ))),
    }
}

fn external_function(
    ctx: &mut SolveCtx,
    c: &Constraint,
    op: &Op,
    var: SymValue,
) -> Result<SymValue> {
    let name = op.function_name.as_deref().unwrap_or("");
    if name == "JSON.parse" {
        // re-type the source as a JSON carrier under its own name; the
        // typeof widening keeps both outcomes satisfiable
        let path = match &c.identifier {
            Some(Identifier::Path(path)) => path.clone(),
            _ => {
                return Err(SolverError::Malformed(
                    "JSON.parse recorded on a non-path base".into(),
                ))
            }
        };
        ctx.force_inferred(&path, "JSON");
        let s = string_symbol(ctx, &path);
        return Ok(SymValue::Str(s, Some(path)));
    }
    debug!("skipping unmodelled external function '{name}'");
    Ok(var)
}

fn parent_access(ctx: &mut SolveCtx, c: &Constraint, op: &Op, var: SymValue) -> Result<SymValue> {
    let parent = match resolve_parent(ctx, op)? {
        Some(parent) => parent,
        // bare parents resolve through the child's own accessor path
        None => return Ok(var),
    };
    let accessor = match &c.identifier {
        Some(Identifier::Path(path)) => path
            .rsplit('.')
            .next()
            .unwrap_or(path.as_str())
            .to_string(),
        _ => {
            return Err(SolverError::Malformed(
                "parent access on a non-path identifier".into(),
            ))
        }
    };

    match parent {
        SymValue::Array(arr, name) => {
            if accessor == "length" {
                return Err(SolverError::Unsupported(
                    "array length is not representable (arrays are modelled as functions)".into(),
                ));
            }
            let mut index: i64 = accessor.parse().map_err(|_| {
                SolverError::Malformed(format!("array accessor '{accessor}' is not an index"))
            })?;
            if index < 0 {
                if let Some(len) = ctx.array_lengths.get(&name) {
                    index += len;
                }
            }
            Ok(SymValue::Str(select_str(&arr, index)?, None))
        }
        parent => {
            // materialise: pin the parent's value to a substitute symbol
            // name and key the child off that name
            let parent_term = parent.expect_string()?;
            let key = parent_term.to_string();
            let name = match ctx.substitutions.get(&key) {
                Some(existing) => existing.clone(),
                None => {
                    let fresh = ctx.fresh_substitute();
                    ctx.substitutions.insert(key, fresh.clone());
                    fresh
                }
            };
            ctx.push_side(parent_term._eq(&z3_string(&name)?));
            if accessor == "length" {
                let base = string_symbol(ctx, &name);
                Ok(SymValue::Int(base.length(), None))
            } else {
                let child = format!("{name}.{accessor}");
                let s = string_symbol(ctx, &child);
                Ok(SymValue::Str(s, Some(child)))
            }
        }
    }
}

/// Compile the parent chain of an `ops_on_parent_element` access. `None`
/// means the parent contributes nothing (no ops, or a bare symbol).
fn resolve_parent(ctx: &mut SolveCtx, op: &Op) -> Result<Option<SymValue>> {
    if op.old_ops.is_empty() {
        return Ok(None);
    }
    let parent = Constraint {
        identifier: op.old_identifier.clone(),
        ops: op.old_ops.clone(),
        ..Default::default()
    };
    let value = compile_constraint(ctx, &parent)?;
    if matches!(value, SymValue::Nil) {
        return Ok(None);
    }
    if matches!(value, SymValue::Array(..)) {
        return Ok(Some(value));
    }
    if value.symbol_name().is_some() {
        return Ok(None);
    }
    Ok(Some(value.reduce(ctx)?))
}
