//! The accessor type table shipped alongside the constraints.
//!
//! The taint analyzer reports types either as a recursive tree mirroring the
//! object shape of `event` or as a flat list of `[path, type]` pairs. Both
//! are flattened into a single dotted-path -> type map which seeds the
//! inferred-types table of a solve.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeTable {
    Tree(HashMap<String, TypeNode>),
    Pairs(Vec<(String, String)>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeNode {
    Leaf(String),
    Branch(HashMap<String, TypeNode>),
}

impl TypeTable {
    /// Flatten into `out`. Tree input is walked from the `event` root only,
    /// producing keys like `event.data.cmd`; empty type strings are dropped
    /// (absence means unknown).
    pub fn flatten_into(&self, out: &mut BTreeMap<String, String>) {
        match self {
            TypeTable::Tree(roots) => {
                if let Some(node) = roots.get("event") {
                    flatten_node("event", node, out);
                }
            }
            TypeTable::Pairs(pairs) => {
                for (path, ty) in pairs {
                    if !ty.is_empty() {
                        out.insert(path.clone(), ty.clone());
                    }
                }
            }
        }
    }

    pub fn empty() -> Self {
        TypeTable::Pairs(Vec::new())
    }
}

fn flatten_node(path: &str, node: &TypeNode, out: &mut BTreeMap<String, String>) {
    match node {
        TypeNode::Leaf(ty) => {
            if !ty.is_empty() {
                out.insert(path.to_string(), ty.clone());
            }
        }
        TypeNode::Branch(children) => {
            for (key, child) in children {
                flatten_node(&format!("{path}.{key}"), child, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tree_flattens_from_event_root() {
        let table: TypeTable = serde_json::from_value(json!({
            "event": {
                "data": {"cmd": "string", "count": "number"},
                "origin": "string"
            },
            "window": {"name": "string"}
        }))
        .unwrap();
        let mut out = BTreeMap::new();
        table.flatten_into(&mut out);
        assert_eq!(out.get("event.data.cmd").map(String::as_str), Some("string"));
        assert_eq!(out.get("event.data.count").map(String::as_str), Some("number"));
        assert_eq!(out.get("event.origin").map(String::as_str), Some("string"));
        // only the event subtree is consulted
        assert!(out.keys().all(|k| k.starts_with("event")));
    }

    #[test]
    fn pair_list_flattens_verbatim() {
        let table: TypeTable =
            serde_json::from_value(json!([["event.data", "string"], ["foo.bar", "array"]]))
                .unwrap();
        let mut out = BTreeMap::new();
        table.flatten_into(&mut out);
        assert_eq!(out.get("event.data").map(String::as_str), Some("string"));
        assert_eq!(out.get("foo.bar").map(String::as_str), Some("array"));
    }

    #[test]
    fn empty_type_strings_are_dropped() {
        let table: TypeTable = serde_json::from_value(json!([["event.data", ""]])).unwrap();
        let mut out = BTreeMap::new();
        table.flatten_into(&mut out);
        assert!(out.is_empty());
    }
}
