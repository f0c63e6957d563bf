//! Validation Tests
//!
//! Runs the shared valid/invalid case table and checks the behaviors that
//! span several validators: first-failure reporting, references, recursion
//! and the depth guard.

use serde::Deserialize;
use serde_json::{json, Value};

use schemagraph::{build_graph, EnumEquality, SchemaGraph, SchemaGraphConfig, ValidationError};

#[derive(Debug, Deserialize)]
struct Case {
    name: String,
    schema: Value,
    valid: Vec<Value>,
    invalid: Vec<Value>,
}

fn cases() -> Vec<Case> {
    serde_json::from_str(include_str!("fixtures/cases.json")).unwrap()
}

fn tree() -> SchemaGraph {
    let document: Value = serde_json::from_str(include_str!("fixtures/tree.json")).unwrap();
    build_graph(document).unwrap()
}

// =============================================================================
// Case Table
// =============================================================================

#[test]
fn test_case_table() {
    let cases = cases();
    assert!(cases.len() > 40);

    for case in cases {
        let graph = build_graph(case.schema.clone())
            .unwrap_or_else(|e| panic!("{}: schema failed to build: {}", case.name, e));

        for value in &case.valid {
            if let Err(e) = graph.validate(value) {
                panic!("{}: expected {} to be valid, got {}", case.name, value, e);
            }
        }
        for value in &case.invalid {
            match graph.validate(value) {
                Err(ValidationError::Mismatch { .. }) => {}
                Err(other) => panic!("{}: expected a mismatch for {}, got {:?}", case.name, value, other),
                Ok(()) => panic!("{}: expected {} to be invalid", case.name, value),
            }
        }
    }
}

// =============================================================================
// Object Rules
// =============================================================================

#[test]
fn test_required_failure_names_missing_key() {
    let graph = build_graph(json!({
        "type": "object",
        "properties": {"a": {"type": "integer"}},
        "required": ["a"]
    }))
    .unwrap();

    assert!(graph.validate(&json!({"a": 1})).is_ok());

    let err = graph.validate(&json!({})).unwrap_err();
    assert_eq!(err.keyword(), Some("required"));
    assert!(err.to_string().contains("\"a\""));

    match graph.validate(&json!({"a": "x"})).unwrap_err() {
        ValidationError::Mismatch { keyword, instance_path, value, node, .. } => {
            assert_eq!(keyword, "type");
            assert_eq!(instance_path, "/a");
            assert_eq!(value, "\"x\"");
            assert_eq!(graph.node(node).fragment(), &json!({"type": "integer"}));
        }
        other => panic!("Expected Mismatch, got {:?}", other),
    }
}

#[test]
fn test_mismatch_carries_a_short_preview_of_large_values() {
    let graph = build_graph(json!({"anyOf": [{"type": "string"}, {"type": "null"}]})).unwrap();
    let big: Vec<u64> = (0..10_000).collect();

    match graph.validate(&json!(big)).unwrap_err() {
        ValidationError::Mismatch { keyword, value, .. } => {
            assert_eq!(keyword, "anyOf");
            assert!(value.starts_with("[0,1,2,"));
            assert!(value.ends_with("..."));
            assert!(value.len() < 100);
        }
        other => panic!("Expected Mismatch, got {:?}", other),
    }
}

// =============================================================================
// Combinators
// =============================================================================

#[test]
fn test_one_of_rejects_double_match() {
    let graph = build_graph(json!({"oneOf": [{"type": "integer"}, {"type": "number"}]})).unwrap();
    assert!(graph.validate(&json!(1.5)).is_ok());
    assert!(graph.validate(&json!(1)).is_err());
}

#[test]
fn test_all_of_is_conjunction() {
    let graph = build_graph(json!({
        "allOf": [
            {"properties": {"a": {"type": "integer"}}, "required": ["a"]},
            {"properties": {"b": {"type": "string"}}}
        ]
    }))
    .unwrap();

    assert!(graph.validate(&json!({"a": 1, "b": "2"})).is_ok());
    assert!(graph.validate(&json!({"b": "yo"})).is_err());
    assert!(graph.validate(&json!({"a": 1, "b": 2})).is_err());
}

#[test]
fn test_not_inverts() {
    let graph = build_graph(json!({"not": {"type": "integer"}})).unwrap();
    assert!(graph.validate(&json!(1.5)).is_ok());
    assert!(graph.validate(&json!("blah")).is_ok());
    assert!(graph.validate(&json!(2.0)).is_err());
}

// =============================================================================
// References
// =============================================================================

#[test]
fn test_ref_behaves_like_its_target() {
    let graph = build_graph(json!({
        "$ref": "#/definitions/Foo",
        "definitions": {"Foo": {"type": "string"}}
    }))
    .unwrap();
    let direct = build_graph(json!({"type": "string"})).unwrap();

    for value in [json!("a"), json!(1), json!(null), json!(false), json!([])] {
        assert_eq!(graph.is_valid(&value), direct.is_valid(&value), "{}", value);
    }
}

#[test]
fn test_unresolved_ref_surfaces_at_validation() {
    let graph = build_graph(json!({
        "properties": {"a": {"$ref": "#/definitions/Missing"}}
    }))
    .unwrap();

    assert_eq!(graph.diagnostics().error_count(), 1);
    // the broken branch is never reached
    assert!(graph.validate(&json!({"b": 1})).is_ok());

    match graph.validate(&json!({"a": 1})).unwrap_err() {
        ValidationError::UnresolvableReference { pointer, .. } => assert_eq!(pointer, "#/definitions/Missing"),
        other => panic!("Expected UnresolvableReference, got {:?}", other),
    }
}

#[test]
fn test_recursive_tree() {
    let graph = tree();

    assert!(graph.validate(&json!({"label": "root"})).is_ok());
    assert!(graph
        .validate(&json!({
            "label": "root",
            "weight": 1.5,
            "children": [
                {"label": "a", "weight": null, "children": []},
                {"label": "b", "children": [{"label": "b_1", "meta": {"k": "v"}}]}
            ]
        }))
        .is_ok());

    match graph
        .validate(&json!({
            "label": "root",
            "children": [{"label": "a"}, {"label": "b", "children": [{"label": "Bad"}]}]
        }))
        .unwrap_err()
    {
        ValidationError::Mismatch { keyword, instance_path, .. } => {
            assert_eq!(keyword, "pattern");
            assert_eq!(instance_path, "/children/1/children/0/label");
        }
        other => panic!("Expected Mismatch, got {:?}", other),
    }

    assert_eq!(
        graph.validate(&json!({"label": "x", "weight": -1})).unwrap_err().keyword(),
        Some("type")
    );
    assert_eq!(
        graph.validate(&json!({"label": "x", "colour": "red"})).unwrap_err().keyword(),
        Some("additionalProperties")
    );
    assert_eq!(
        graph.validate(&json!({"label": "x", "meta": {"k": 1}})).unwrap_err().keyword(),
        Some("type")
    );
    assert_eq!(graph.validate(&json!({"children": []})).unwrap_err().keyword(), Some("required"));
}

// =============================================================================
// Depth Guard
// =============================================================================

fn nested(depth: usize) -> Value {
    let mut value = json!({"label": "leaf"});
    for _ in 0..depth {
        value = json!({"label": "n", "children": [value]});
    }
    value
}

#[test]
fn test_depth_guard_trips_on_deep_data() {
    let document: Value = serde_json::from_str(include_str!("fixtures/tree.json")).unwrap();
    let mut config = SchemaGraphConfig::default();
    config.validation.max_depth = 40;
    let graph = SchemaGraph::build_with(document, &config).unwrap();

    assert!(graph.validate(&nested(5)).is_ok());
    assert!(matches!(
        graph.validate(&nested(50)),
        Err(ValidationError::DepthExceeded { limit: 40, .. })
    ));
}

#[test]
fn test_depth_guard_is_not_absorbed_by_combinators() {
    let mut config = SchemaGraphConfig::default();
    config.validation.max_depth = 8;
    let graph = SchemaGraph::build_with(
        json!({"anyOf": [{"type": "null"}, {"type": "array", "items": {"$ref": "#"}}]}),
        &config,
    )
    .unwrap();

    assert!(graph.validate(&json!([[null]])).is_ok());
    let mut deep = json!(null);
    for _ in 0..10 {
        deep = json!([deep]);
    }
    assert!(matches!(graph.validate(&deep), Err(ValidationError::DepthExceeded { .. })));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_strict_enum_equality() {
    let schema = json!({"enum": [0, 1]});
    assert!(build_graph(schema.clone()).unwrap().validate(&json!(false)).is_ok());

    let mut config = SchemaGraphConfig::default();
    config.validation.enum_equality = EnumEquality::Strict;
    let strict = SchemaGraph::build_with(schema, &config).unwrap();
    assert!(strict.validate(&json!(false)).is_err());
    assert!(strict.validate(&json!(0)).is_ok());
}

#[test]
fn test_graph_validates_across_threads() {
    let graph = std::sync::Arc::new(tree());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let graph = std::sync::Arc::clone(&graph);
            std::thread::spawn(move || {
                let value = json!({"label": format!("t{}", i), "children": [{"label": "c"}]});
                graph.validate(&value).is_ok()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
