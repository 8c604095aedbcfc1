//! Parse-tree to SMT regex translation.
//!
//! Boundary anchors are stripped before parsing; a side that had no anchor
//! is wrapped with a printable-ASCII `.*` so the membership test models an
//! unanchored match. The `\w`/`\d`/`\W` shorthands are expanded textually
//! into character classes first, matching what the recorder's patterns use.

use z3::ast::Regexp;

use crate::error::{Result, SolverError};
use crate::regex_parser::{self, RegexNode, PRINTABLE_HI, PRINTABLE_LO};

pub fn regex_to_smt(pattern: &str) -> Result<Regexp> {
    let mut body = pattern;
    let mut free_start = true;
    let mut free_end = true;
    if let Some(rest) = body.strip_prefix('^') {
        free_start = false;
        body = rest;
    }
    if let Some(rest) = body.strip_suffix('$') {
        free_end = false;
        body = rest;
    }

    let expanded = body
        .replace("\\w", "[a-zA-Z0-9_]")
        .replace("\\d", "[0-9]")
        .replace("\\W", "[^A-Za-z0-9_]");

    let tree = regex_parser::parse(&expanded)
        .map_err(|err| SolverError::Unsupported(format!("regex {pattern:?}: {err}")))?;
    let mut re = translate(&tree.root)?;

    if free_start {
        re = Regexp::concat(&[&printable_star(), &re]);
    }
    if free_end {
        re = Regexp::concat(&[&re, &printable_star()]);
    }
    Ok(re)
}

fn printable_star() -> Regexp {
    Regexp::star(&Regexp::range(&PRINTABLE_LO, &PRINTABLE_HI))
}

fn translate(node: &RegexNode) -> Result<Regexp> {
    Ok(match node {
        RegexNode::Concat(parts) => {
            let parts: Vec<Regexp> = parts.iter().map(translate).collect::<Result<_>>()?;
            let refs: Vec<&Regexp> = parts.iter().collect();
            Regexp::concat(&refs)
        }
        RegexNode::Star(inner) => Regexp::star(&translate(inner)?),
        RegexNode::Dot => Regexp::range(&PRINTABLE_LO, &PRINTABLE_HI),
        RegexNode::Char(c) => Regexp::literal(&c.to_string()),
        RegexNode::Bar(parts) => {
            let parts: Vec<Regexp> = parts.iter().map(translate).collect::<Result<_>>()?;
            let refs: Vec<&Regexp> = parts.iter().collect();
            Regexp::union(&refs)
        }
        RegexNode::Group(inner) => translate(inner)?,
        // the empty-string language: parser emits this for `r?` branches and
        // empty alternation arms, which match epsilon in the host language
        RegexNode::Empty => Regexp::literal(""),
    })
}
