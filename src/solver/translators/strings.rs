//! The string-operation library.
//!
//! Models the member functions the recorder observes on string (and, for
//! `includes`/`indexOf`, array) receivers. All functions are side-effect
//! free on the receiver; where auxiliary semantics are needed (split slots,
//! indexOf bounds, search helpers) fresh `__ignore_` symbols and
//! side-constraints are emitted instead.

use z3::ast::{Array, Ast, Bool, Int, String as ZString};
use z3::Sort;

use crate::constraint::Operand;
use crate::error::{Result, SolverError};

use super::super::compile::compile_operand;
use super::super::context::SolveCtx;
use super::super::regex::regex_to_smt;
use super::super::symbols::as_string_term;
use super::super::value::{z3_string, SymValue};
use super::arrays::select_str;

pub fn handles(name: &str) -> bool {
    matches!(
        name,
        "toString"
            | "toLowerCase"
            | "trim"
            | "map"
            | "hasOwnProperty"
            | "startsWith"
            | "endsWith"
            | "concat"
            | "includes"
            | "indexOf"
            | "substr"
            | "substring"
            | "slice"
            | "split"
            | "match"
            | "search"
            | "replace"
    )
}

pub fn apply(
    ctx: &mut SolveCtx,
    name: &str,
    var: SymValue,
    args: &[Operand],
) -> Result<SymValue> {
    match name {
        // Case folding and trimming make no difference to whether a payload
        // reaches the sink; `map` is a no-op because the mapped constraints
        // are recorded against the elements anyway.
        "toString" | "toLowerCase" | "trim" | "map" => Ok(var),
        // Checked properties show up as separate traces.
        "hasOwnProperty" => Ok(SymValue::Bool(Bool::from_bool(true), None)),
        "startsWith" => affix(ctx, var, args, true),
        "endsWith" => affix(ctx, var, args, false),
        "concat" => concat(ctx, var, args),
        "includes" => includes(ctx, var, args),
        "indexOf" => index_of(ctx, var, args),
        "substr" | "substring" => substring(ctx, var, args),
        "slice" => slice(ctx, var, args),
        "split" => split(ctx, var, args),
        "match" => match_regex(ctx, var, args),
        "search" => search(ctx, var, args),
        "replace" => replace(ctx, var, args),
        other => Err(SolverError::Unsupported(format!(
            "member function '{other}' is not modelled"
        ))),
    }
}

fn arg<'a>(args: &'a [Operand], index: usize, what: &str) -> Result<&'a Operand> {
    args.get(index)
        .ok_or_else(|| SolverError::Malformed(format!("{what}: missing argument {index}")))
}

fn affix(ctx: &mut SolveCtx, var: SymValue, args: &[Operand], prefix: bool) -> Result<SymValue> {
    let x = var.expect_string()?;
    let needle = compile_operand(ctx, arg(args, 0, "startsWith/endsWith")?)?.expect_string()?;
    Ok(SymValue::Bool(
        if prefix {
            needle.prefix(&x)
        } else {
            needle.suffix(&x)
        },
        None,
    ))
}

fn concat(ctx: &mut SolveCtx, var: SymValue, args: &[Operand]) -> Result<SymValue> {
    if matches!(var, SymValue::Array(..)) {
        return Err(SolverError::Unsupported(
            "concat on arrays is not modelled".into(),
        ));
    }
    let mut acc = var.expect_string()?;
    for operand in args {
        let piece = compile_operand(ctx, operand)?.expect_string()?;
        acc = ZString::concat(&[&acc, &piece]);
    }
    Ok(SymValue::Str(acc, None))
}

fn includes(ctx: &mut SolveCtx, var: SymValue, args: &[Operand]) -> Result<SymValue> {
    if var.is_string() {
        let idx = index_of(ctx, var, args)?.expect_int()?;
        return Ok(SymValue::Bool(idx.gt(&Int::from_i64(-1)), None));
    }
    if let SymValue::Array(arr, name) = &var {
        let len = *ctx.array_lengths.get(name).ok_or_else(|| {
            SolverError::Unsupported("includes on an array of unknown length".into())
        })?;
        let needle = compile_operand(ctx, arg(args, 0, "includes")?)?;
        let needle = as_string_term(&needle)?;
        let matches: Vec<Bool> = (0..len)
            .map(|i| Ok(select_str(arr, i)?._eq(&needle)))
            .collect::<Result<_>>()?;
        let refs: Vec<&Bool> = matches.iter().collect();
        return Ok(SymValue::Bool(Bool::or(&refs), None));
    }
    Err(SolverError::Unsupported(format!(
        "includes on {}",
        var.describe()
    )))
}

fn index_of(ctx: &mut SolveCtx, var: SymValue, args: &[Operand]) -> Result<SymValue> {
    if let SymValue::Array(arr, name) = &var {
        return array_index_of(ctx, arr, name, args);
    }
    let x = var.expect_string()?;
    let needle = compile_operand(ctx, arg(args, 0, "indexOf")?)?.expect_string()?;
    let start = match args.get(1) {
        Some(operand) => compile_operand(ctx, operand)?.expect_int()?,
        None => Int::from_i64(0),
    };
    Ok(SymValue::Int(x.index_of(&needle, start), None))
}

/// indexOf over a bounded array: a fresh integer `h` is constrained so that
/// `h` is the first matching index when any slot matches and -1 otherwise.
/// The per-slot implications only bind when a match exists at all.
fn array_index_of(
    ctx: &mut SolveCtx,
    arr: &Array,
    name: &str,
    args: &[Operand],
) -> Result<SymValue> {
    let len = *ctx.array_lengths.get(name).ok_or_else(|| {
        SolverError::Unsupported("indexOf on an array of unknown length".into())
    })?;
    let needle = compile_operand(ctx, arg(args, 0, "indexOf")?)?;
    let needle = as_string_term(&needle)?;
    let helper_name = ctx.fresh_helper("arr_index_of");
    let h = Int::new_const(helper_name.as_str());
    ctx.register_symbol(&helper_name, h.clone().into());

    let mut matches = Vec::new();
    let mut bounds = Vec::new();
    for i in 0..len {
        let hit = select_str(arr, i)?._eq(&needle);
        bounds.push(hit.implies(&h.le(&Int::from_i64(i))));
        bounds.push(hit.not().implies(&h.gt(&Int::from_i64(i))));
        matches.push(hit);
    }
    let match_refs: Vec<&Bool> = matches.iter().collect();
    let any = Bool::or(&match_refs);
    let bound_refs: Vec<&Bool> = bounds.iter().collect();
    ctx.push_side(Bool::and(&[
        &any.implies(&Bool::and(&bound_refs)),
        &any.implies(&h.ge(&Int::from_i64(0))),
        &any.not().implies(&h._eq(&Int::from_i64(-1))),
    ]));
    Ok(SymValue::Int(h, Some(helper_name)))
}

/// `substring(start, end?)` and `substr` share one model; the second
/// argument lands in `seq.extract`'s length slot, defaulting to the full
/// string length (which clamps at the end).
fn substring(ctx: &mut SolveCtx, var: SymValue, args: &[Operand]) -> Result<SymValue> {
    let x = var.expect_string()?;
    let start = compile_operand(ctx, arg(args, 0, "substring")?)?.expect_int()?;
    let end = match args.get(1) {
        Some(operand) => compile_operand(ctx, operand)?.expect_int()?,
        None => x.length(),
    };
    Ok(SymValue::Str(x.substr(start, end), None))
}

fn slice(ctx: &mut SolveCtx, var: SymValue, args: &[Operand]) -> Result<SymValue> {
    let x = var.expect_string()?;
    let end = match args.get(1) {
        Some(operand) => compile_operand(ctx, operand)?.expect_int()?,
        None => x.length(),
    };
    let start = match arg(args, 0, "slice")? {
        // a negative literal start counts back from the end
        Operand::Int(n) if *n < 0 => {
            ctx.push_side(x.length().gt(&Int::from_i64(-n)));
            Int::add(&[&end, &Int::from_i64(*n)])
        }
        operand => compile_operand(ctx, operand)?.expect_int()?,
    };
    Ok(SymValue::Str(x.substr(start, end), None))
}

/// Bounded unrolling of `split(sep)`: the first k-1 slots take the text up
/// to the next separator, the last slot takes the remainder. Every slot is
/// asserted non-empty and the remainder separator-free, which fixes the
/// declared length at k.
fn split(ctx: &mut SolveCtx, var: SymValue, args: &[Operand]) -> Result<SymValue> {
    let x = var.expect_string()?;
    let sep = arg(args, 0, "split")?
        .as_str()
        .ok_or_else(|| SolverError::Unsupported("split separator must be a literal string".into()))?;
    let sep_val = z3_string(sep)?;

    let name = ctx.fresh_helper("split");
    let arr = Array::new_const(name.as_str(), &Sort::int(), &Sort::string());
    ctx.register_symbol(&name, arr.clone().into());

    let segments = ctx.config.split_segments.max(1) as i64;
    let empty = ZString::from("");
    let mut cur = x;
    let mut elems = Vec::new();
    for i in 0..segments - 1 {
        let idx = cur.index_of(&sep_val, Int::from_i64(0));
        let seg = cur.substr(Int::from_i64(0), idx.clone());
        let rest = cur.substr(Int::add(&[&idx, &sep_val.length()]), cur.length());
        ctx.push_side(select_str(&arr, i)?._eq(&seg));
        ctx.push_side(seg._eq(&empty).not());
        elems.push(seg);
        cur = rest;
    }
    ctx.push_side(select_str(&arr, segments - 1)?._eq(&cur));
    ctx.push_side(cur._eq(&empty).not());
    ctx.push_side(cur.index_of(&sep_val, Int::from_i64(0))._eq(&Int::from_i64(-1)));
    elems.push(cur);

    ctx.array_lengths.insert(name.clone(), segments);
    ctx.array_elems.insert(name.clone(), elems);
    Ok(SymValue::Array(arr, name))
}

/// `match` with a tainted regex degenerates to a containment check on the
/// flowed-in string; a literal regex becomes a language membership test.
fn match_regex(ctx: &mut SolveCtx, var: SymValue, args: &[Operand]) -> Result<SymValue> {
    let x = var.expect_string()?;
    match arg(args, 0, "match")? {
        Operand::Node(node) => {
            let tainted = super::super::compile::compile_constraint(ctx, node)?.expect_string()?;
            Ok(SymValue::Bool(
                x.index_of(&tainted, Int::from_i64(0)).gt(&Int::from_i64(-1)),
                None,
            ))
        }
        Operand::Str(pattern) => Ok(SymValue::Bool(x.regex_matches(&regex_to_smt(pattern)?), None)),
        other => Err(SolverError::Malformed(format!(
            "match argument is neither a regex literal nor a constraint: {other:?}"
        ))),
    }
}

/// `search` returns an index, so a fresh helper string stands for the
/// matched portion: it must be in the pattern's language, and the anchors
/// decide how it relates to the receiver.
fn search(ctx: &mut SolveCtx, var: SymValue, args: &[Operand]) -> Result<SymValue> {
    let x = var.expect_string()?;
    let pattern = arg(args, 0, "search")?
        .as_str()
        .ok_or_else(|| SolverError::Unsupported("search requires a literal regex".into()))?;
    if pattern.is_empty() {
        return Err(SolverError::Malformed("search with an empty regex".into()));
    }
    let starts = pattern.starts_with('^');
    let ends = pattern.ends_with('$');

    let helper_name = ctx.fresh_helper("search");
    let h = ZString::new_const(helper_name.as_str());
    ctx.register_symbol(&helper_name, h.clone().into());
    ctx.push_side(h.regex_matches(&regex_to_smt(pattern)?));

    if starts && ends {
        // fully anchored: the receiver is the match, index 0
        ctx.push_side(x._eq(&h));
        return Ok(SymValue::Int(Int::from_i64(0), None));
    }
    if starts {
        ctx.push_side(h.prefix(&x));
    } else if ends {
        ctx.push_side(h.suffix(&x));
    }
    Ok(SymValue::Int(x.index_of(&h, Int::from_i64(0)), None))
}

fn replace(ctx: &mut SolveCtx, var: SymValue, args: &[Operand]) -> Result<SymValue> {
    let x = var.expect_string()?;
    let search_val = compile_operand(ctx, arg(args, 0, "replace")?)?.expect_string()?;
    let replace_val = match args.get(1) {
        None | Some(Operand::Null) => ZString::from(""),
        Some(operand) => compile_operand(ctx, operand)?.expect_string()?,
    };
    // single-replacement semantics (str.replace)
    Ok(SymValue::Str(x.replace(&search_val, &replace_val), None))
}
