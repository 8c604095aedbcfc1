//! Symbol factory.
//!
//! Allocates typed Z3 symbols for accessor paths, lifts concrete literals,
//! and fabricates constant arrays. Every allocated symbol is registered in
//! the context's symbol table so the model extractor can report it, and
//! every visited identifier lands in the global identifier set so it gets
//! an assignment even when the solver never pinned it.

use z3::ast::{Array, Ast, Bool, Int, String as ZString};
use z3::Sort;

use crate::constraint::{Identifier, Operand};
use crate::error::{Result, SolverError};

use super::compile::compile_operand;
use super::context::SolveCtx;
use super::translators::arrays::select_str;
use super::value::SymValue;

pub fn string_symbol(ctx: &mut SolveCtx, name: &str) -> ZString {
    let s = ZString::new_const(name);
    ctx.register_symbol(name, s.clone().into());
    s
}

pub fn int_symbol(ctx: &mut SolveCtx, name: &str) -> Int {
    let i = Int::new_const(name);
    ctx.register_symbol(name, i.clone().into());
    i
}

pub fn bool_symbol(ctx: &mut SolveCtx, name: &str) -> Bool {
    let b = Bool::new_const(name);
    ctx.register_symbol(name, b.clone().into());
    b
}

pub fn array_symbol(ctx: &mut SolveCtx, name: &str) -> Array {
    let a = Array::new_const(name, &Sort::int(), &Sort::string());
    ctx.register_symbol(name, a.clone().into());
    a
}

/// The observable type variable of an operand: a string symbol named
/// `type:<operand>`. Tracked so the solve result reports it in the `types`
/// map rather than among the assignments.
pub fn type_symbol(ctx: &mut SolveCtx, operand: &str) -> ZString {
    ctx.type_symbols.insert(operand.to_string());
    string_symbol(ctx, &format!("type:{operand}"))
}

/// Build the symbolic value an operation chain starts from.
pub fn symbol_for_identifier(ctx: &mut SolveCtx, identifier: &Identifier) -> Result<SymValue> {
    let path = match identifier {
        Identifier::Object(_) => {
            return Err(SolverError::Unsupported(
                "complex objects cannot serve as operation bases".into(),
            ))
        }
        Identifier::List(elems) => return constant_array(ctx, elems),
        Identifier::Path(path) => path,
    };

    ctx.identifiers.insert(path.clone());

    if let Some(base) = path.strip_suffix(".length") {
        let s = string_symbol(ctx, base);
        return Ok(SymValue::Int(s.length(), None));
    }

    let ty = ctx.inferred_types.get(path).cloned().unwrap_or_default();
    match ty.as_str() {
        "string" => Ok(SymValue::Str(string_symbol(ctx, path), Some(path.clone()))),
        "number" => Ok(SymValue::Int(int_symbol(ctx, path), Some(path.clone()))),
        "boolean" => Ok(SymValue::Bool(bool_symbol(ctx, path), Some(path.clone()))),
        "array" => Ok(SymValue::Array(array_symbol(ctx, path), path.clone())),
        _ => {
            // Untyped taint sources are modelled as strings; anything else
            // untyped is unsolvable and will be pinned to "".
            if path != "event" && !path.contains("event.data") && !path.contains("event.origin") {
                ctx.unsolvable.insert(path.clone());
            }
            Ok(SymValue::Str(string_symbol(ctx, path), Some(path.clone())))
        }
    }
}

/// Lift a concrete literal from the trace.
pub fn value_from_literal(ctx: &mut SolveCtx, literal: &Operand) -> Result<SymValue> {
    match literal {
        Operand::Str(s) => Ok(SymValue::Str(super::value::z3_string(s)?, None)),
        Operand::Bool(b) => Ok(SymValue::Bool(Bool::from_bool(*b), None)),
        Operand::Int(n) => Ok(SymValue::Int(Int::from_i64(*n), None)),
        Operand::List(elems) => constant_array(ctx, elems),
        Operand::Null => Ok(SymValue::Nil),
        Operand::Node(_) => Err(SolverError::Malformed(
            "constraint tree in a literal position".into(),
        )),
    }
}

/// Fabricate a fresh array for a list literal: every slot is pinned to the
/// compiled element and the declared length is the list length.
pub fn constant_array(ctx: &mut SolveCtx, elems: &[Operand]) -> Result<SymValue> {
    let name = ctx.fresh_helper("const_array");
    let arr = Array::new_const(name.as_str(), &Sort::int(), &Sort::string());
    ctx.register_symbol(&name, arr.clone().into());
    for (i, elem) in elems.iter().enumerate() {
        let compiled = compile_operand(ctx, elem)?;
        let value = as_string_term(&compiled)?;
        ctx.push_side(select_str(&arr, i as i64)?._eq(&value));
    }
    ctx.array_lengths.insert(name.clone(), elems.len() as i64);
    Ok(SymValue::Array(arr, name))
}

/// Project a value onto the string carrier used by array slots. Integer
/// terms go through `str.from_int` so a number-typed identifier can be
/// compared against string-backed array elements.
pub fn as_string_term(value: &SymValue) -> Result<ZString> {
    match value {
        SymValue::Str(s, _) => Ok(s.clone()),
        SymValue::Int(i, _) => Ok(ZString::from_int(i)),
        other => Err(SolverError::Unsupported(format!(
            "cannot compare {} against array elements",
            other.describe()
        ))),
    }
}
