//! Union-typed symbolic values.
//!
//! A compiled operand is an SMT term of one of four sorts, the absent value
//! (`Nil`, produced by JS `null`/`undefined`/`{}`), or one of two lazy
//! short-circuit shapes: JS `a || b` yields the first truthy operand rather
//! than a boolean, and `a && b` yields `b` under the guard that `a` is
//! truthy. The lazy shapes are kept symbolic until a consumer forces them:
//! a boolean consumer projects them with [`SymValue::truthy`], a value
//! consumer rewrites them with [`SymValue::reduce`].
//!
//! Symbols minted by the factory carry their textual name; composed terms do
//! not. The name is what coercion keys re-typing on and what the model
//! extractor reports assignments under.

use std::str::FromStr;

use z3::ast::{Array, Ast, Bool, Int, String as ZString};

use crate::error::{Result, SolverError};

use super::context::SolveCtx;

#[derive(Debug, Clone)]
pub enum SymValue {
    Int(Int, Option<String>),
    Str(ZString, Option<String>),
    Bool(Bool, Option<String>),
    /// An Int -> String array together with its symbol name, which keys the
    /// length and element registries.
    Array(Array, String),
    /// JS `a || b` used for its value.
    TruthyOr(Box<SymValue>, Box<SymValue>),
    /// JS `a && b` used for its value: `guard` is the truthy form of `a`.
    GuardedAnd(Bool, Box<SymValue>),
    Nil,
}

impl SymValue {
    pub fn symbol_name(&self) -> Option<&str> {
        match self {
            SymValue::Int(_, name) | SymValue::Str(_, name) | SymValue::Bool(_, name) => {
                name.as_deref()
            }
            _ => None,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, SymValue::Str(..))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, SymValue::Int(..))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, SymValue::Bool(..))
    }

    /// Lazy shapes are boolean-shaped to a boolean consumer.
    pub fn is_bool_like(&self) -> bool {
        matches!(
            self,
            SymValue::Bool(..) | SymValue::TruthyOr(..) | SymValue::GuardedAnd(..)
        )
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self, SymValue::TruthyOr(..) | SymValue::GuardedAnd(..))
    }

    pub fn as_literal_str(&self) -> Option<String> {
        match self {
            SymValue::Str(s, _) => s.as_string(),
            _ => None,
        }
    }

    pub fn as_literal_int(&self) -> Option<i64> {
        match self {
            SymValue::Int(i, _) => i.as_i64(),
            _ => None,
        }
    }

    pub fn as_literal_bool(&self) -> Option<bool> {
        match self {
            SymValue::Bool(b, _) => b.as_bool(),
            _ => None,
        }
    }

    /// JS truthiness as a boolean term: integers are nonzero, strings are
    /// non-empty, arrays are always truthy. `None` means the value carries
    /// no constraint at all (JS null in a conditional).
    pub fn truthy(&self) -> Option<Bool> {
        match self {
            SymValue::Int(i, _) => Some(i._eq(&Int::from_i64(0)).not()),
            SymValue::Str(s, _) => Some(s._eq(&ZString::from("")).not()),
            SymValue::Bool(b, _) => Some(b.clone()),
            SymValue::Array(..) => Some(Bool::from_bool(true)),
            SymValue::Nil => None,
            SymValue::TruthyOr(left, right) => match (left.truthy(), right.truthy()) {
                (Some(l), Some(r)) => Some(Bool::or(&[&l, &r])),
                (Some(one), None) | (None, Some(one)) => Some(one),
                (None, None) => None,
            },
            SymValue::GuardedAnd(guard, value) => match value.truthy() {
                Some(v) => Some(Bool::and(&[guard, &v])),
                None => Some(guard.clone()),
            },
        }
    }

    /// Force a lazy short-circuit shape into a plain value (the
    /// lazy-evaluation normaliser). For `a || b` a fresh string stands for
    /// "whichever operand was picked": `a = s ∨ b = s` goes into the
    /// side-constraint pool and `s` is the value. For `a && b` the guard is
    /// asserted and `b` is the value. Everything else passes through.
    pub fn reduce(self, ctx: &mut SolveCtx) -> Result<SymValue> {
        match self {
            SymValue::TruthyOr(left, right) => {
                match right.as_literal_bool() {
                    // `x || false` picks x
                    Some(false) => return left.reduce(ctx),
                    Some(true) => {
                        return Err(SolverError::Malformed(
                            "lazy side of a short-circuit or is a truthy literal".into(),
                        ))
                    }
                    None => {}
                }
                if matches!(*right, SymValue::Nil) {
                    return left.reduce(ctx);
                }
                let l = left.reduce(ctx)?.expect_string()?;
                let r = right.reduce(ctx)?.expect_string()?;
                let name = ctx.fresh_helper("or");
                let s = ZString::new_const(name.as_str());
                ctx.push_side(Bool::or(&[&l._eq(&s), &r._eq(&s)]));
                Ok(SymValue::Str(s, Some(name)))
            }
            SymValue::GuardedAnd(guard, value) => {
                ctx.push_side(guard);
                value.reduce(ctx)
            }
            other => Ok(other),
        }
    }

    pub fn expect_string(&self) -> Result<ZString> {
        match self {
            SymValue::Str(s, _) => Ok(s.clone()),
            other => Err(SolverError::Unsupported(format!(
                "expected a string value, found {}",
                other.describe()
            ))),
        }
    }

    pub fn expect_int(&self) -> Result<Int> {
        match self {
            SymValue::Int(i, _) => Ok(i.clone()),
            other => Err(SolverError::Unsupported(format!(
                "expected an integer value, found {}",
                other.describe()
            ))),
        }
    }

    /// Short textual form for diagnostics and for naming the type variable
    /// of an unnamed `typeof` operand.
    pub fn describe(&self) -> String {
        match self {
            SymValue::Int(t, name) => name.clone().unwrap_or_else(|| t.to_string()),
            SymValue::Str(t, name) => name.clone().unwrap_or_else(|| t.to_string()),
            SymValue::Bool(t, name) => name.clone().unwrap_or_else(|| t.to_string()),
            SymValue::Array(_, name) => name.clone(),
            SymValue::TruthyOr(..) => "<lazy or>".into(),
            SymValue::GuardedAnd(..) => "<guarded and>".into(),
            SymValue::Nil => "<null>".into(),
        }
    }
}

/// Lift a Rust string into a Z3 string literal. Interior NULs are the one
/// thing the theory cannot carry.
pub fn z3_string(s: &str) -> Result<ZString> {
    ZString::from_str(s)
        .map_err(|_| SolverError::Malformed(format!("string literal contains NUL: {s:?}")))
}
