//! End-to-end checks of the solve driver: truthy coercion of bare
//! constraints, unsolvable pinning, unsatisfiable conjunctions, and
//! idempotence across invocations.

use pmsolve::constraint::Constraint;
use pmsolve::solver::{solve, Solution, SolveOutcome, SolverConfig};
use pmsolve::types::TypeTable;
use serde_json::{json, Value};

fn run(constraints: Value, types: Value) -> SolveOutcome {
    let constraints: Vec<Constraint> = serde_json::from_value(constraints).unwrap();
    let types: TypeTable = serde_json::from_value(types).unwrap();
    solve(&constraints, &types, SolverConfig::default()).unwrap()
}

fn solution(constraints: Value, types: Value) -> Solution {
    match run(constraints, types) {
        SolveOutcome::Solution(solution) => solution,
        SolveOutcome::NoSolution => panic!("expected a solution"),
    }
}

fn string_of(solution: &Solution, identifier: &str) -> String {
    solution.assignments[identifier]
        .as_str()
        .unwrap_or_else(|| panic!("{identifier} is not a string assignment"))
        .to_string()
}

#[test]
fn bare_string_constraint_yields_nonempty_value() {
    let solution = solution(
        json!([{"identifier": "event.data", "ops": []}]),
        json!({"event": {"data": "string"}}),
    );
    assert!(!string_of(&solution, "event.data").is_empty());
}

#[test]
fn bare_number_constraint_yields_nonzero_value() {
    let solution = solution(
        json!([{"identifier": "event.data", "ops": []}]),
        json!({"event": {"data": "number"}}),
    );
    assert_ne!(solution.assignments["event.data"].as_i64(), Some(0));
}

#[test]
fn untyped_event_path_defaults_to_string() {
    let solution = solution(
        json!([{"identifier": "event.data.cmd", "ops": []}]),
        json!([]),
    );
    assert!(!string_of(&solution, "event.data.cmd").is_empty());
}

#[test]
fn equality_pins_the_value() {
    let solution = solution(
        json!([{
            "identifier": "event.origin",
            "ops": [{"type": "Binary", "op": "===", "side": "left", "val": "https://trusted"}]
        }]),
        json!({"event": {"origin": "string"}}),
    );
    assert_eq!(string_of(&solution, "event.origin"), "https://trusted");
}

#[test]
fn comparison_against_number_infers_the_type() {
    let solution = solution(
        json!([{
            "identifier": "event.data",
            "ops": [{"type": "Binary", "op": "===", "side": "left", "val": 5}]
        }]),
        json!([]),
    );
    assert_eq!(solution.assignments["event.data"].as_i64(), Some(5));
    assert_eq!(solution.types.get("event.data").map(String::as_str), Some("number"));
}

#[test]
fn contradicting_equalities_have_no_solution() {
    let outcome = run(
        json!([
            {
                "identifier": "event.data",
                "ops": [{"type": "Binary", "op": "===", "side": "left", "val": "a"}]
            },
            {
                "identifier": "event.data",
                "ops": [{"type": "Binary", "op": "===", "side": "left", "val": "b"}]
            }
        ]),
        json!({"event": {"data": "string"}}),
    );
    assert_eq!(outcome, SolveOutcome::NoSolution);
}

#[test]
fn unsolvable_identifier_as_sole_constraint_fails() {
    // window.name is untyped and not an event accessor: it is pinned to ""
    // while the bare constraint demands truthiness
    let outcome = run(json!([{"identifier": "window.name", "ops": []}]), json!([]));
    assert_eq!(outcome, SolveOutcome::NoSolution);
}

#[test]
fn unsolvable_identifier_pins_to_empty_elsewhere() {
    // the pinned needle "" is found at index 0, so the payload survives
    let solution = solution(
        json!([{
            "identifier": "event.data",
            "ops": [
                {"type": "member_function", "function_name": "indexOf",
                 "args": [{"identifier": "window.name", "ops": []}]},
                {"type": "Binary", "op": ">", "side": "left", "val": -1}
            ]
        }]),
        json!({"event": {"data": "string"}}),
    );
    assert_eq!(string_of(&solution, "window.name"), "");
}

#[test]
fn null_comparisons_constrain_truthiness() {
    let solution = solution(
        json!([{
            "identifier": "event.data",
            "ops": [{"type": "Binary", "op": "!==", "side": "left", "val": null}]
        }]),
        json!({"event": {"data": "string"}}),
    );
    assert!(!string_of(&solution, "event.data").is_empty());

    // `data === null` negates truthiness, forcing the empty string
    let solution = solution(
        json!([{
            "identifier": "event.data",
            "ops": [{"type": "Binary", "op": "===", "side": "left", "val": null}]
        }]),
        json!({"event": {"data": "string"}}),
    );
    assert_eq!(string_of(&solution, "event.data"), "");
}

#[test]
fn back_to_back_solves_are_equivalent() {
    let constraints = json!([{
        "identifier": "event.data",
        "ops": [
            {"type": "member_function", "function_name": "split", "args": ["."]},
            {"type": "member_function", "function_name": "includes", "args": ["foo"]}
        ]
    }]);
    let types = json!({"event": {"data": "string"}});
    let first = solution(constraints.clone(), types.clone());
    let second = solution(constraints, types);
    assert_eq!(first, second);
}

#[test]
fn logical_top_level_node() {
    let solution = solution(
        json!([{
            "type": "Logical",
            "op": "&&",
            "l_val": {
                "identifier": "event.data",
                "ops": [{"type": "Binary", "op": "===", "side": "left", "val": "x"}]
            },
            "r_val": {
                "identifier": "event.origin",
                "ops": [{"type": "Binary", "op": "===", "side": "left", "val": "o"}]
            }
        }]),
        json!({"event": {"data": "string", "origin": "string"}}),
    );
    assert_eq!(string_of(&solution, "event.data"), "x");
    assert_eq!(string_of(&solution, "event.origin"), "o");
}

#[test]
fn types_map_reports_seeded_types() {
    let solution = solution(
        json!([{"identifier": "event.data", "ops": []}]),
        json!({"event": {"data": "string", "origin": "string"}}),
    );
    assert_eq!(solution.types.get("event.data").map(String::as_str), Some("string"));
    assert_eq!(solution.types.get("event.origin").map(String::as_str), Some("string"));
}
