use conforma::{Context, FormatMode};
use serde_json::json;

#[test]
fn object_schema_end_to_end() {
    let mut context = Context::new();
    let schema = context
        .parse(&json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "age": { "type": "number" }
            },
            "required": ["name"]
        }))
        .expect("Invalid schema");

    let output = schema.validate(&json!({"name": "Alice", "age": 30}));
    assert!(output.valid());

    let output = schema.validate(&json!({"age": 30}));
    assert!(!output.valid());
    assert_eq!(output.errors().len(), 1);
    assert_eq!(output.errors()[0].keyword_location(), "/required");
    assert_eq!(output.errors()[0].instance_location(), "");
    assert_eq!(
        output.errors()[0].error(),
        Some("\"name\" is a required property")
    );
}

#[test]
fn boolean_schemas() {
    let mut context = Context::new();
    let accept_all = context.parse(&json!(true)).expect("Invalid schema");
    let reject_all = context.parse(&json!(false)).expect("Invalid schema");

    for instance in [json!(null), json!(1), json!("x"), json!({"a": []})] {
        assert!(accept_all.is_valid(&instance));
        let output = reject_all.validate(&instance);
        assert!(!output.valid());
        assert!(output.error().is_some());
    }
}

#[test]
fn unknown_keywords_become_annotations() {
    let mut context = Context::new();
    let schema = context
        .parse(&json!({"customKeyword": {"anything": [1, 2]}}))
        .expect("Invalid schema");
    let output = schema.validate(&json!("whatever"));
    assert!(output.valid());
    let annotation = output
        .annotations()
        .iter()
        .find(|unit| unit.keyword_location() == "/customKeyword")
        .expect("Annotation is recorded");
    assert_eq!(annotation.annotation(), Some(&json!({"anything": [1, 2]})));
}

#[test]
fn format_validation_in_known_mode() {
    let mut context = Context::options()
        .format_mode(FormatMode::Known)
        .build()
        .expect("Valid options");
    let schema = context
        .parse(&json!({"type": "string", "format": "email"}))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!("user@example.com")));
    assert!(!schema.is_valid(&json!("invalid-email")));
}

#[test]
fn conditionals_follow_the_if_annotation() {
    let mut context = Context::new();
    let schema = context
        .parse(&json!({
            "if": { "type": "number" },
            "then": { "minimum": 10 },
            "else": { "maxLength": 2 }
        }))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!(12)));
    assert!(!schema.is_valid(&json!(2)));
    assert!(schema.is_valid(&json!("ab")));
    assert!(!schema.is_valid(&json!("abc")));
}

#[test]
fn one_of_requires_exactly_one_match() {
    let mut context = Context::new();
    let schema = context
        .parse(&json!({
            "oneOf": [
                { "type": "integer" },
                { "minimum": 2 }
            ]
        }))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!(1)));
    assert!(schema.is_valid(&json!(2.5)));
    assert!(!schema.is_valid(&json!(3)));
    assert!(!schema.is_valid(&json!(1.5)));
}

#[test]
fn not_discards_speculative_results() {
    let mut context = Context::new();
    let schema = context
        .parse(&json!({"not": {"type": "string"}}))
        .expect("Invalid schema");
    let output = schema.validate(&json!("text"));
    assert!(!output.valid());
    assert_eq!(output.errors().len(), 1);
    assert_eq!(output.errors()[0].keyword_location(), "/not");

    let output = schema.validate(&json!(5));
    assert!(output.valid());
    // The failed speculation leaves no nested errors behind.
    assert!(output.errors().is_empty());
}

#[test]
fn contains_with_min_contains_zero_is_always_valid() {
    let mut context = Context::new();
    let schema = context
        .parse(&json!({"contains": {"type": "string"}, "minContains": 0}))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!([1, 2, 3])));

    let schema = context
        .parse(&json!({"contains": {"type": "string"}, "minContains": 2}))
        .expect("Invalid schema");
    assert!(!schema.is_valid(&json!(["a", 2])));
    assert!(schema.is_valid(&json!(["a", "b", 3])));

    let schema = context
        .parse(&json!({"contains": {"type": "string"}, "maxContains": 1}))
        .expect("Invalid schema");
    assert!(!schema.is_valid(&json!(["a", "b"])));
    assert!(schema.is_valid(&json!(["a", 1])));
}

#[test]
fn keyword_order_in_source_does_not_change_outcomes() {
    let forward = json!({
        "properties": { "a": { "type": "string" } },
        "additionalProperties": { "type": "number" },
        "required": ["a"]
    });
    let backward = json!({
        "required": ["a"],
        "additionalProperties": { "type": "number" },
        "properties": { "a": { "type": "string" } }
    });
    let mut context = Context::new();
    let forward = context.parse(&forward).expect("Invalid schema");
    let backward = context.parse(&backward).expect("Invalid schema");

    for instance in [
        json!({"a": "x", "b": 1}),
        json!({"a": "x", "b": "y"}),
        json!({"b": 2}),
        json!({"a": 3}),
    ] {
        let first = forward.validate(&instance);
        let second = backward.validate(&instance);
        assert_eq!(first.valid(), second.valid(), "{instance}");
        let mut first_locations: Vec<_> = first
            .errors()
            .iter()
            .map(|unit| unit.keyword_location().to_string())
            .collect();
        let mut second_locations: Vec<_> = second
            .errors()
            .iter()
            .map(|unit| unit.keyword_location().to_string())
            .collect();
        first_locations.sort();
        second_locations.sort();
        assert_eq!(first_locations, second_locations, "{instance}");
    }
}

#[test]
fn output_serializes_to_the_wire_format() {
    let mut context = Context::new();
    let schema = context
        .parse(&json!({"$id": "https://example.com/basic", "required": ["name"]}))
        .expect("Invalid schema");
    let output = schema.validate(&json!({}));
    let serialized = serde_json::to_value(&output).expect("Serializable");
    assert_eq!(serialized["valid"], json!(false));
    assert_eq!(serialized["errors"][0]["keywordLocation"], json!("/required"));
    assert_eq!(
        serialized["errors"][0]["absoluteKeywordLocation"],
        json!("https://example.com/basic#/required")
    );
    assert_eq!(serialized["errors"][0]["instanceLocation"], json!(""));
}

#[test]
fn one_off_helpers() {
    assert!(conforma::is_valid(
        &json!({"type": "string"}),
        &json!("text")
    ));
    assert!(!conforma::is_valid(&json!({"type": "string"}), &json!(5)));
    let error = conforma::validate(&json!({"type": "nope"}), &json!(5))
        .expect_err("Schema is invalid");
    assert!(error.to_string().contains("type"));
}

#[test]
fn numeric_keywords_compare_across_representations() {
    let mut context = Context::new();
    let schema = context
        .parse(&json!({"minimum": 5, "maximum": 10, "multipleOf": 0.5}))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!(7.5)));
    assert!(schema.is_valid(&json!(10)));
    assert!(schema.is_valid(&json!(10.0)));
    assert!(!schema.is_valid(&json!(10.5)));
    assert!(!schema.is_valid(&json!(4)));
    // Non-numbers are outside the domain of numeric keywords.
    assert!(schema.is_valid(&json!("text")));
}

#[test]
fn enum_and_const_use_deep_equality() {
    let mut context = Context::new();
    let schema = context
        .parse(&json!({"enum": [{"a": 1, "b": [1, 2]}, "x"]}))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!({"b": [1.0, 2.0], "a": 1.0})));
    assert!(schema.is_valid(&json!("x")));
    assert!(!schema.is_valid(&json!({"a": 1})));

    let schema = context
        .parse(&json!({"const": [1, {"k": 2}]}))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!([1.0, {"k": 2.0}])));
    assert!(!schema.is_valid(&json!([1, {"k": 3}])));
}

#[test]
fn string_sizes_count_code_points() {
    let mut context = Context::new();
    let schema = context
        .parse(&json!({"minLength": 2, "maxLength": 4}))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!("пар")));
    assert!(!schema.is_valid(&json!("п")));
    assert!(!schema.is_valid(&json!("паруса")));
}

#[test]
fn property_names_validates_keys() {
    let mut context = Context::new();
    let schema = context
        .parse(&json!({"propertyNames": {"maxLength": 3}}))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!({"abc": 1})));
    assert!(!schema.is_valid(&json!({"abcd": 1})));
}

#[test]
fn dependent_keywords() {
    let mut context = Context::new();
    let schema = context
        .parse(&json!({
            "dependentRequired": { "credit_card": ["billing_address"] },
            "dependentSchemas": { "name": { "required": ["first"] } }
        }))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!({})));
    assert!(!schema.is_valid(&json!({"credit_card": "4111"})));
    assert!(schema.is_valid(&json!({"credit_card": "4111", "billing_address": "x"})));
    assert!(!schema.is_valid(&json!({"name": "n"})));
    assert!(schema.is_valid(&json!({"name": "n", "first": "f"})));
}
