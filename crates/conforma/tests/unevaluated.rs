use conforma::Context;
use serde_json::json;

#[test]
fn unevaluated_properties_across_all_of() {
    let mut context = Context::new();
    let schema = context
        .parse(&json!({
            "allOf": [
                { "properties": { "name": { "type": "string" } } }
            ],
            "unevaluatedProperties": { "type": "number" }
        }))
        .expect("Invalid schema");

    assert!(schema.is_valid(&json!({"name": "x", "age": 30})));

    let output = schema.validate(&json!({"name": "x", "age": "30"}));
    assert!(!output.valid());
    assert!(output
        .errors()
        .iter()
        .any(|unit| unit.keyword_location().starts_with("/unevaluatedProperties")));
}

#[test]
fn properties_covered_by_any_branch_are_not_revalidated() {
    let mut context = Context::new();
    let schema = context
        .parse(&json!({
            "anyOf": [
                { "properties": { "a": { "type": "string" } }, "required": ["a"] },
                { "properties": { "b": { "type": "string" } }, "required": ["b"] }
            ],
            "unevaluatedProperties": false
        }))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!({"a": "x"})));
    assert!(schema.is_valid(&json!({"b": "x"})));
    // "c" is evaluated by no branch.
    assert!(!schema.is_valid(&json!({"a": "x", "c": 1})));
}

#[test]
fn failed_branches_leave_no_annotations_behind() {
    let mut context = Context::new();
    let schema = context
        .parse(&json!({
            "anyOf": [
                { "properties": { "a": { "type": "string" } }, "required": ["a", "missing"] },
                { "type": "object" }
            ],
            "unevaluatedProperties": false
        }))
        .expect("Invalid schema");
    // The first branch fails, so its `properties` annotation must not mark
    // "a" as evaluated.
    assert!(!schema.is_valid(&json!({"a": "x"})));
}

#[test]
fn unevaluated_items_after_prefix_items() {
    let mut context = Context::new();
    let schema = context
        .parse(&json!({
            "prefixItems": [ { "type": "integer" } ],
            "unevaluatedItems": { "type": "string" }
        }))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!([1, "a", "b"])));
    assert!(!schema.is_valid(&json!([1, 2])));
    assert!(schema.is_valid(&json!([1])));
}

#[test]
fn unevaluated_items_across_ref() {
    let mut context = Context::new();
    let schema = context
        .parse(&json!({
            "$defs": {
                "prefix": { "prefixItems": [ { "type": "integer" } ] }
            },
            "$ref": "#/$defs/prefix",
            "unevaluatedItems": false
        }))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!([1])));
    assert!(!schema.is_valid(&json!([1, 2])));
}

#[test]
fn items_covered_by_contains_are_not_unevaluated() {
    let mut context = Context::new();
    let schema = context
        .parse(&json!({
            "contains": { "type": "string" },
            "unevaluatedItems": { "type": "number" }
        }))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!(["a", 1, "b", 2])));
    assert!(!schema.is_valid(&json!(["a", true])));
}

#[test]
fn unevaluated_items_sees_full_items_coverage() {
    let mut context = Context::new();
    let schema = context
        .parse(&json!({
            "allOf": [ { "items": { "type": "integer" } } ],
            "unevaluatedItems": false
        }))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!([1, 2, 3])));
    assert!(!schema.is_valid(&json!([1, "x"])));
}
