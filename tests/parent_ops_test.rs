//! Parent-reference resolution: bare parents pass through, computed parents
//! materialise through the substitution map so child accessors agree on the
//! parent's concrete value.

use pmsolve::constraint::Constraint;
use pmsolve::solver::{solve, Solution, SolveOutcome, SolverConfig};
use pmsolve::types::TypeTable;
use serde_json::{json, Value};

fn solution(constraints: Value, types: Value) -> Solution {
    let constraints: Vec<Constraint> = serde_json::from_value(constraints).unwrap();
    let types: TypeTable = serde_json::from_value(types).unwrap();
    match solve(&constraints, &types, SolverConfig::default()).unwrap() {
        SolveOutcome::Solution(solution) => solution,
        SolveOutcome::NoSolution => panic!("expected a solution"),
    }
}

#[test]
fn bare_parent_resolves_through_the_child_path() {
    // toLowerCase is an identity, so the parent stays a bare symbol and the
    // child keeps its own accessor path
    let solution = solution(
        json!([{
            "identifier": "event.data.cmd",
            "ops": [
                {"type": "ops_on_parent_element",
                 "old_identifier": "event.data",
                 "old_ops": [{"type": "member_function", "function_name": "toLowerCase", "args": []}]},
                {"type": "Binary", "op": "===", "side": "left", "val": "go"}
            ]
        }]),
        json!({"event": {"data": "string"}}),
    );
    assert_eq!(solution.assignments["event.data.cmd"].as_str(), Some("go"));
}

#[test]
fn parent_with_no_old_ops_is_a_no_op() {
    let solution = solution(
        json!([{
            "identifier": "event.data.cmd",
            "ops": [
                {"type": "ops_on_parent_element", "old_identifier": "event.data", "old_ops": []},
                {"type": "Binary", "op": "===", "side": "left", "val": "go"}
            ]
        }]),
        json!({"event": {"data": "string"}}),
    );
    assert_eq!(solution.assignments["event.data.cmd"].as_str(), Some("go"));
}

#[test]
fn computed_parent_materialises_a_substitute() {
    let solution = solution(
        json!([{
            "identifier": "event.data.x",
            "ops": [
                {"type": "ops_on_parent_element",
                 "old_identifier": "event.data",
                 "old_ops": [{"type": "member_function", "function_name": "substring", "args": [0, 30]}]},
                {"type": "Binary", "op": "===", "side": "left", "val": "v"}
            ]
        }]),
        json!({"event": {"data": "string"}}),
    );
    // the parent expression is pinned to the substitute symbol's name and
    // the child keys off it
    assert_eq!(
        solution.assignments["event.data"].as_str(),
        Some("__substitute_values_0")
    );
    assert_eq!(
        solution.assignments["__substitute_values_0.x"].as_str(),
        Some("v")
    );
}

#[test]
fn computed_parent_length_accessor() {
    let solution = solution(
        json!([{
            "identifier": "event.data.length",
            "ops": [
                {"type": "ops_on_parent_element",
                 "old_identifier": "event.data",
                 "old_ops": [{"type": "member_function", "function_name": "substring", "args": [0, 30]}]},
                {"type": "Binary", "op": ">", "side": "left", "val": 5}
            ]
        }]),
        json!({"event": {"data": "string"}}),
    );
    let substitute = solution.assignments["__substitute_values_0"]
        .as_str()
        .expect("substitute symbol should be assigned");
    assert!(substitute.len() > 5);
}

#[test]
fn array_length_through_a_parent_is_unsupported() {
    let constraints: Vec<Constraint> = serde_json::from_value(json!([{
        "identifier": "event.data.length",
        "ops": [
            {"type": "ops_on_parent_element",
             "old_identifier": "event.data",
             "old_ops": [{"type": "member_function", "function_name": "split", "args": [","]}]},
            {"type": "Binary", "op": ">", "side": "left", "val": 1}
        ]
    }]))
    .unwrap();
    let types: TypeTable = serde_json::from_value(json!({"event": {"data": "string"}})).unwrap();
    let result = solve(&constraints, &types, SolverConfig::default());
    assert!(matches!(result, Err(pmsolve::SolverError::Unsupported(_))));
}

#[test]
fn shared_parent_expressions_reuse_one_substitute() {
    // both accesses go through the same computed parent, so they must key
    // off the same substitute symbol
    let solution = solution(
        json!([
            {
                "identifier": "event.data.a",
                "ops": [
                    {"type": "ops_on_parent_element",
                     "old_identifier": "event.data",
                     "old_ops": [{"type": "member_function", "function_name": "substring", "args": [0, 40]}]},
                    {"type": "Binary", "op": "===", "side": "left", "val": "1"}
                ]
            },
            {
                "identifier": "event.data.b",
                "ops": [
                    {"type": "ops_on_parent_element",
                     "old_identifier": "event.data",
                     "old_ops": [{"type": "member_function", "function_name": "substring", "args": [0, 40]}]},
                    {"type": "Binary", "op": "===", "side": "left", "val": "2"}
                ]
            }
        ]),
        json!({"event": {"data": "string"}}),
    );
    assert_eq!(
        solution.assignments["__substitute_values_0.a"].as_str(),
        Some("1")
    );
    assert_eq!(
        solution.assignments["__substitute_values_0.b"].as_str(),
        Some("2")
    );
    assert!(!solution.assignments.contains_key("__substitute_values_1.b"));
}
