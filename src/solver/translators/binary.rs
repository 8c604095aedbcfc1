//! Binary operator translation.
//!
//! Operands arrive already coerced (§ coercion module); this module maps an
//! operator string onto the matching Z3 construction, including the two
//! special forms `instanceof` (undefined probe through the operand's type
//! variable) and `in` (synthesized member symbol asserted non-empty).

use z3::ast::{Ast, Bool, Int, String as ZString};

use crate::error::{Result, SolverError};

use super::super::context::SolveCtx;
use super::super::symbols::{string_symbol, type_symbol};
use super::super::value::SymValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    InstanceOf,
    In,
}

impl BinaryOp {
    pub fn parse(op: &str) -> Result<Self> {
        Ok(match op {
            "==" | "===" => BinaryOp::Eq,
            "!=" | "!==" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            ">" => BinaryOp::Gt,
            "<=" => BinaryOp::Le,
            ">=" => BinaryOp::Ge,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            "<<" => BinaryOp::Shl,
            ">>" => BinaryOp::Shr,
            "&" => BinaryOp::BitAnd,
            "|" => BinaryOp::BitOr,
            "^" => BinaryOp::BitXor,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            "instanceof" => BinaryOp::InstanceOf,
            "in" => BinaryOp::In,
            other => {
                return Err(SolverError::Malformed(format!(
                    "unknown binary operator '{other}'"
                )))
            }
        })
    }
}

pub fn apply(ctx: &mut SolveCtx, op: &str, lhs: SymValue, rhs: SymValue) -> Result<SymValue> {
    match BinaryOp::parse(op)? {
        BinaryOp::Eq => Ok(SymValue::Bool(equality(&lhs, &rhs)?, None)),
        BinaryOp::Ne => Ok(SymValue::Bool(equality(&lhs, &rhs)?.not(), None)),
        op @ (BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge) => {
            Ok(SymValue::Bool(compare(op, &lhs, &rhs)?, None))
        }
        BinaryOp::Add => add(&lhs, &rhs),
        op @ (BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem) => {
            arithmetic(op, &lhs, &rhs)
        }
        op @ (BinaryOp::And | BinaryOp::Or) => short_circuit(op, &lhs, &rhs),
        op @ (BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor) => bitwise(op, &lhs, &rhs),
        BinaryOp::Shl | BinaryOp::Shr => Err(SolverError::Unsupported(
            "shift operators on symbolic integers".into(),
        )),
        BinaryOp::InstanceOf => instance_of(ctx, &lhs, &rhs),
        BinaryOp::In => member_in(ctx, &lhs, &rhs),
    }
}

/// Equality over matching sorts. Lazy short-circuit shapes compare through
/// their boolean projection.
fn equality(lhs: &SymValue, rhs: &SymValue) -> Result<Bool> {
    let lhs = boolean_view(lhs)?;
    let rhs = boolean_view(rhs)?;
    match (&lhs, &rhs) {
        (SymValue::Str(a, _), SymValue::Str(b, _)) => Ok(a._eq(b)),
        (SymValue::Int(a, _), SymValue::Int(b, _)) => Ok(a._eq(b)),
        (SymValue::Bool(a, _), SymValue::Bool(b, _)) => Ok(a._eq(b)),
        (SymValue::Array(a, _), SymValue::Array(b, _)) => Ok(a._eq(b)),
        _ => Err(SolverError::Unsupported(format!(
            "cannot compare {} against {}",
            lhs.describe(),
            rhs.describe()
        ))),
    }
}

fn boolean_view(v: &SymValue) -> Result<SymValue> {
    if v.is_lazy() {
        let b = v
            .truthy()
            .ok_or_else(|| SolverError::Malformed("short-circuit over null operands".into()))?;
        return Ok(SymValue::Bool(b, None));
    }
    Ok(v.clone())
}

fn compare(op: BinaryOp, lhs: &SymValue, rhs: &SymValue) -> Result<Bool> {
    match (lhs, rhs) {
        (SymValue::Int(a, _), SymValue::Int(b, _)) => Ok(match op {
            BinaryOp::Lt => a.lt(b),
            BinaryOp::Gt => a.gt(b),
            BinaryOp::Le => a.le(b),
            _ => a.ge(b),
        }),
        // lexicographic string order
        (SymValue::Str(a, _), SymValue::Str(b, _)) => Ok(match op {
            BinaryOp::Lt => a.str_lt(b),
            BinaryOp::Gt => a.str_gt(b),
            BinaryOp::Le => a.str_le(b),
            _ => a.str_ge(b),
        }),
        _ => Err(SolverError::Unsupported(format!(
            "cannot order {} against {}",
            lhs.describe(),
            rhs.describe()
        ))),
    }
}

/// JS `+` is addition on numbers and concatenation on strings.
fn add(lhs: &SymValue, rhs: &SymValue) -> Result<SymValue> {
    match (lhs, rhs) {
        (SymValue::Int(a, _), SymValue::Int(b, _)) => Ok(SymValue::Int(Int::add(&[a, b]), None)),
        (SymValue::Str(a, _), SymValue::Str(b, _)) => {
            Ok(SymValue::Str(ZString::concat(&[a, b]), None))
        }
        _ => Err(SolverError::Unsupported(format!(
            "cannot add {} and {}",
            lhs.describe(),
            rhs.describe()
        ))),
    }
}

fn arithmetic(op: BinaryOp, lhs: &SymValue, rhs: &SymValue) -> Result<SymValue> {
    let a = lhs.expect_int()?;
    let b = rhs.expect_int()?;
    Ok(SymValue::Int(
        match op {
            BinaryOp::Sub => Int::sub(&[&a, &b]),
            BinaryOp::Mul => Int::mul(&[&a, &b]),
            BinaryOp::Div => a.div(&b),
            _ => a.rem(&b),
        },
        None,
    ))
}

fn short_circuit(op: BinaryOp, lhs: &SymValue, rhs: &SymValue) -> Result<SymValue> {
    let a = lhs
        .truthy()
        .ok_or_else(|| SolverError::Malformed("null operand in a boolean operator".into()))?;
    let b = rhs
        .truthy()
        .ok_or_else(|| SolverError::Malformed("null operand in a boolean operator".into()))?;
    Ok(SymValue::Bool(
        if op == BinaryOp::And {
            Bool::and(&[&a, &b])
        } else {
            Bool::or(&[&a, &b])
        },
        None,
    ))
}

fn bitwise(op: BinaryOp, lhs: &SymValue, rhs: &SymValue) -> Result<SymValue> {
    match (lhs, rhs) {
        (SymValue::Bool(a, _), SymValue::Bool(b, _)) => Ok(SymValue::Bool(
            match op {
                BinaryOp::BitAnd => Bool::and(&[a, b]),
                BinaryOp::BitOr => Bool::or(&[a, b]),
                _ => a.xor(b),
            },
            None,
        )),
        _ => Err(SolverError::Unsupported(
            "bitwise operators on non-boolean operands".into(),
        )),
    }
}

/// `x instanceof <empty>` is how the recorder spells "x is undefined": the
/// observable type variable of `x` is pinned to the literal "undefined".
fn instance_of(ctx: &mut SolveCtx, lhs: &SymValue, rhs: &SymValue) -> Result<SymValue> {
    let undefined_marker = rhs.as_literal_str().as_deref() == Some("");
    match lhs.symbol_name() {
        Some(name) if undefined_marker => {
            let name = name.to_string();
            let t = type_symbol(ctx, &name);
            Ok(SymValue::Bool(t._eq(&ZString::from("undefined")), None))
        }
        Some(_) => Err(SolverError::Unsupported(
            "instanceof against anything but the undefined marker".into(),
        )),
        None => Err(SolverError::Unsupported(
            "instanceof on a composed left-hand side".into(),
        )),
    }
}

/// `"key" in obj`: synthesize a member symbol `obj.key` and require it to be
/// non-empty. The expression itself is trivially true; the constraint lives
/// in the side pool.
fn member_in(ctx: &mut SolveCtx, lhs: &SymValue, rhs: &SymValue) -> Result<SymValue> {
    if let (Some(key), Some(obj)) = (lhs.as_literal_str(), rhs.symbol_name()) {
        let member = format!("{obj}.{key}");
        let s = string_symbol(ctx, &member);
        ctx.push_side(s._eq(&ZString::from("")).not());
    }
    Ok(SymValue::Bool(Bool::from_bool(true), None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::context::SolverConfig;
    use z3::{SatResult, Solver};

    fn ctx() -> SolveCtx {
        SolveCtx::new(SolverConfig::default())
    }

    #[test]
    fn string_equality() {
        let mut ctx = ctx();
        let x = SymValue::Str(ZString::new_const("x"), Some("x".into()));
        let lit = SymValue::Str(ZString::from("hello"), None);
        let result = apply(&mut ctx, "===", x, lit).unwrap();
        let b = match result {
            SymValue::Bool(b, _) => b,
            other => panic!("expected bool, got {}", other.describe()),
        };
        let solver = Solver::new();
        solver.assert(&b);
        solver.assert(&ZString::new_const("x")._eq(&ZString::from("other")));
        assert_eq!(solver.check(), SatResult::Unsat);
    }

    #[test]
    fn mismatched_sorts_are_unsupported() {
        let mut ctx = ctx();
        let x = SymValue::Str(ZString::from("a"), None);
        let n = SymValue::Int(Int::from_i64(1), None);
        assert!(apply(&mut ctx, "===", x, n).is_err());
    }

    #[test]
    fn in_operator_emits_member_constraint() {
        let mut ctx = ctx();
        let key = SymValue::Str(ZString::from("cmd"), None);
        let obj = SymValue::Str(ZString::new_const("event.data"), Some("event.data".into()));
        let result = apply(&mut ctx, "in", key, obj).unwrap();
        assert_eq!(result.as_literal_bool(), Some(true));
        assert_eq!(ctx.side_constraints.len(), 1);
        assert!(ctx.symbols.contains_key("event.data.cmd"));
    }

    #[test]
    fn instanceof_empty_pins_type_to_undefined() {
        let mut ctx = ctx();
        let x = SymValue::Str(ZString::new_const("event.data.x"), Some("event.data.x".into()));
        let marker = SymValue::Str(ZString::from(""), None);
        let result = apply(&mut ctx, "instanceof", x, marker).unwrap();
        assert!(result.is_bool());
        assert!(ctx.type_symbols.contains("event.data.x"));
    }

    #[test]
    fn integer_shift_is_unsupported() {
        let mut ctx = ctx();
        let a = SymValue::Int(Int::new_const("a"), Some("a".into()));
        let b = SymValue::Int(Int::from_i64(2), None);
        assert!(matches!(
            apply(&mut ctx, ">>", a, b),
            Err(SolverError::Unsupported(_))
        ));
    }
}
