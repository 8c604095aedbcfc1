//! Data model of the recorded trace.
//!
//! The taint analyzer emits a list of constraint trees. A tree is either a
//! leaf (an accessor path or literal plus an ordered list of operations
//! applied left-to-right) or an internal `Binary`/`Unary`/`Logical` node
//! with explicit children. Operation nodes carry operator-specific fields;
//! everything not needed by a given kind is simply absent in the JSON, so
//! every field here is optional or defaulted.

use serde::{Deserialize, Deserializer};

use crate::types::TypeTable;

/// Keeps an explicit JSON `null` distinguishable from an absent field:
/// absent stays `None` (via `#[serde(default)]`), `null` becomes
/// `Some(Operand::Null)`. A missing binary operand defaults to the empty
/// string, a null one compares against JS `null`; they are not the same.
fn operand_opt<'de, D>(deserializer: D) -> Result<Option<Operand>, D::Error>
where
    D: Deserializer<'de>,
{
    Operand::deserialize(deserializer).map(Some)
}

/// The full input document read from stdin: the recorded path conditions
/// plus the accessor type table.
#[derive(Debug, Clone, Deserialize)]
pub struct SolveRequest {
    pub constraints: Vec<Constraint>,
    pub types: TypeTable,
}

/// One node of a constraint tree.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Constraint {
    /// Present on internal nodes only (`Binary`, `Unary`, `Logical`).
    #[serde(rename = "type", default)]
    pub kind: Option<OpKind>,
    #[serde(default)]
    pub op: Option<String>,
    #[serde(default)]
    pub l_val: Option<Operand>,
    #[serde(default)]
    pub r_val: Option<Operand>,
    /// Child operand of an internal `Unary` node, or the concrete literal of
    /// an `isRealValue` leaf (the recorder uses both `val` and `value`).
    #[serde(default, deserialize_with = "operand_opt")]
    pub val: Option<Operand>,
    #[serde(default, deserialize_with = "operand_opt")]
    pub value: Option<Operand>,
    #[serde(rename = "isRealValue", default)]
    pub is_real_value: bool,
    /// Source accessor path of a leaf, e.g. `event.data.cmd`. List literals
    /// appear here as well (`[1,2,3].includes(...)`).
    #[serde(default)]
    pub identifier: Option<Identifier>,
    #[serde(default)]
    pub ops: Vec<Op>,
}

/// The base an operation chain starts from.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Path(String),
    List(Vec<Operand>),
    /// Complex objects cannot serve as operation bases; rejected at compile
    /// time rather than at parse time so the diagnostic names the site.
    Object(serde_json::Map<String, serde_json::Value>),
}

/// A recorded operation, applied to the running value of its chain.
#[derive(Debug, Clone, Deserialize)]
pub struct Op {
    #[serde(rename = "type")]
    pub kind: OpKind,
    #[serde(default)]
    pub op: Option<String>,
    #[serde(default)]
    pub side: Option<Side>,
    #[serde(default, deserialize_with = "operand_opt")]
    pub val: Option<Operand>,
    #[serde(default)]
    pub function_name: Option<String>,
    #[serde(default)]
    pub args: Vec<Operand>,
    #[serde(default)]
    pub accessed_elem: Option<i64>,
    #[serde(default)]
    pub old_identifier: Option<Identifier>,
    #[serde(default)]
    pub old_ops: Vec<Op>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum OpKind {
    Binary,
    Unary,
    Logical,
    #[serde(rename = "member_function")]
    MemberFunction,
    #[serde(rename = "iterator")]
    Iterator,
    #[serde(rename = "external_function")]
    ExternalFunction,
    #[serde(rename = "ops_on_parent_element")]
    OpsOnParent,
    /// The recorder occasionally emits op kinds this backend does not model;
    /// they are logged and skipped instead of failing the whole trace.
    #[serde(other)]
    Unknown,
}

/// Which side of the original expression the running value was on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
    Both,
}

/// An operand position: either a nested constraint tree or a bare JSON
/// literal. `Null` covers both JS `null` and `undefined`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Node(Box<Constraint>),
    Str(String),
    Bool(bool),
    Int(i64),
    List(Vec<Operand>),
    Null,
}

impl Operand {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Operand::Str(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn leaf_with_member_function_deserializes() {
        let c: Constraint = serde_json::from_value(json!({
            "identifier": "event.data",
            "ops": [
                {"type": "member_function", "function_name": "indexOf", "args": ["foo"]},
                {"type": "Binary", "op": ">", "side": "left", "val": -1}
            ]
        }))
        .unwrap();
        assert!(matches!(c.identifier, Some(Identifier::Path(ref p)) if p == "event.data"));
        assert_eq!(c.ops.len(), 2);
        assert_eq!(c.ops[0].kind, OpKind::MemberFunction);
        assert!(matches!(c.ops[1].val, Some(Operand::Int(-1))));
        assert_eq!(c.ops[1].side, Some(Side::Left));
    }

    #[test]
    fn internal_logical_node_deserializes() {
        let c: Constraint = serde_json::from_value(json!({
            "type": "Logical",
            "op": "&&",
            "l_val": {"identifier": "event.data", "ops": []},
            "r_val": {"identifier": "event.origin", "ops": []}
        }))
        .unwrap();
        assert_eq!(c.kind, Some(OpKind::Logical));
        assert!(matches!(c.l_val, Some(Operand::Node(_))));
    }

    #[test]
    fn list_literal_identifier() {
        let c: Constraint = serde_json::from_value(json!({
            "identifier": [1, 2, 3],
            "ops": []
        }))
        .unwrap();
        match c.identifier {
            Some(Identifier::List(elems)) => assert_eq!(elems.len(), 3),
            other => panic!("expected list identifier, got {:?}", other),
        }
    }

    #[test]
    fn unknown_op_kind_is_tolerated() {
        let op: Op = serde_json::from_value(json!({"type": "some_future_kind"})).unwrap();
        assert_eq!(op.kind, OpKind::Unknown);
    }

    #[test]
    fn null_operand() {
        let op: Op = serde_json::from_value(json!({
            "type": "Binary", "op": "===", "val": null
        }))
        .unwrap();
        assert!(matches!(op.val, Some(Operand::Null)));
    }
}
