//! Per-solve state.
//!
//! All registries the compilation accumulates (side-constraints, inferred
//! types, helper bookkeeping) are owned by a `SolveCtx` created at the top
//! of each `solve` call and threaded through every compile routine.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::debug;
use z3::ast::{Bool, Dynamic, String as ZString};

#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// How many segments a `split` call is unrolled into. The final segment
    /// takes the remainder and is asserted to not contain the separator.
    pub split_segments: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self { split_segments: 4 }
    }
}

pub struct SolveCtx {
    pub config: SolverConfig,

    /// Boolean side-constraints emitted by helper synthesis (split slots,
    /// indexOf bounds, substitution pins). Append-only; conjoined with the
    /// path constraints at solve time.
    pub side_constraints: Vec<Bool>,

    /// Dotted accessor path -> JS type name. Seeded from the input type
    /// table, refined during coercion. An empty type is never stored.
    pub inferred_types: BTreeMap<String, String>,

    /// Every identifier the symbol factory has seen; each gets an entry in
    /// the final assignment, defaulting to the empty string.
    pub identifiers: BTreeSet<String>,

    /// Identifiers no typed modelling succeeded for; pinned to the empty
    /// string so the solver can only succeed through other data.
    pub unsolvable: BTreeSet<String>,

    /// Textual form of a parent expression -> substitute symbol name, so
    /// `a.b` and a later `a.b.c` agree on `a.b`'s concrete value.
    pub substitutions: HashMap<String, String>,

    /// Array symbol name -> declared finite length. Quantifier-free
    /// reasoning over arrays only works within these bounds.
    pub array_lengths: HashMap<String, i64>,

    /// Array symbol name -> known element terms, in order. Backs `pop` and
    /// negative-index access.
    pub array_elems: HashMap<String, Vec<ZString>>,

    /// Every allocated symbol, for model extraction. Coercion re-registers
    /// a name when it rebuilds the symbol at a different sort.
    pub symbols: BTreeMap<String, Dynamic>,

    /// Operand names whose `type:` symbol is observable in the output.
    pub type_symbols: BTreeSet<String>,

    counter: u64,
}

impl SolveCtx {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            side_constraints: Vec::new(),
            inferred_types: BTreeMap::new(),
            identifiers: BTreeSet::new(),
            unsolvable: BTreeSet::new(),
            substitutions: HashMap::new(),
            array_lengths: HashMap::new(),
            array_elems: HashMap::new(),
            symbols: BTreeMap::new(),
            type_symbols: BTreeSet::new(),
            counter: 0,
        }
    }

    fn next(&mut self) -> u64 {
        let n = self.counter;
        self.counter += 1;
        n
    }

    /// Fresh auxiliary symbol name. The `__ignore_` prefix excludes it from
    /// the returned assignment.
    pub fn fresh_helper(&mut self, kind: &str) -> String {
        format!("__ignore_{}_{}", kind, self.next())
    }

    /// Fresh substitute name for a materialised parent expression. These do
    /// appear in the assignment; the pipeline needs them to reassemble
    /// nested payloads.
    pub fn fresh_substitute(&mut self) -> String {
        format!("__substitute_values_{}", self.next())
    }

    pub fn push_side(&mut self, constraint: Bool) {
        self.side_constraints.push(constraint);
    }

    /// Record an inferred type. Once a name has a concrete type it is never
    /// replaced by a different one; a conflicting inference is dropped and
    /// the caller is told so via the return value.
    pub fn record_inferred(&mut self, name: &str, ty: &str) -> bool {
        match self.inferred_types.get(name) {
            None => {
                self.inferred_types.insert(name.to_string(), ty.to_string());
                true
            }
            Some(existing) if existing == ty => true,
            Some(existing) => {
                debug!(
                    "keeping inferred type '{}' for {}, ignoring conflicting '{}'",
                    existing, name, ty
                );
                false
            }
        }
    }

    /// Explicit re-typing, used when `JSON.parse` turns a string carrier
    /// into a JSON value. This is the one place an existing type may change.
    pub fn force_inferred(&mut self, name: &str, ty: &str) {
        if let Some(old) = self.inferred_types.insert(name.to_string(), ty.to_string()) {
            if old != ty {
                debug!("re-typed {} from '{}' to '{}'", name, old, ty);
            }
        }
    }

    pub fn register_symbol(&mut self, name: &str, term: Dynamic) {
        self.symbols.insert(name.to_string(), term);
    }
}
