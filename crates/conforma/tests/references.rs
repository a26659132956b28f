use std::{collections::HashMap, sync::Arc};

use conforma::{Context, Retrieve, SchemaError, Uri};
use serde_json::{json, Value};

#[test]
fn recursive_reference() {
    let mut context = Context::new();
    let schema = context
        .parse(&json!({
            "$id": "https://example.com/tree",
            "type": "object",
            "properties": {
                "value": { "type": "integer" },
                "children": {
                    "type": "array",
                    "items": { "$ref": "#" }
                }
            }
        }))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!({
        "value": 1,
        "children": [
            { "value": 2, "children": [
                { "value": 3, "children": [] }
            ]}
        ]
    })));
    assert!(!schema.is_valid(&json!({
        "value": 1,
        "children": [ { "value": "two" } ]
    })));
}

#[test]
fn self_reference_without_progress_terminates() {
    let mut context = Context::new();
    let schema = context.parse(&json!({"$ref": "#"})).expect("Invalid schema");
    assert!(schema.is_valid(&json!({"anything": 1})));
}

#[test]
fn reference_transparency() {
    let mut context = Context::new();
    let through_ref = context
        .parse(&json!({
            "$ref": "#/$defs/X",
            "$defs": { "X": { "type": "integer" } }
        }))
        .expect("Invalid schema");
    let direct = context
        .parse(&json!({"type": "integer"}))
        .expect("Invalid schema");
    for instance in [json!(1), json!(1.0), json!(1.5), json!("x"), json!(null)] {
        assert_eq!(
            through_ref.is_valid(&instance),
            direct.is_valid(&instance),
            "{instance}"
        );
    }
}

#[test]
fn sibling_keywords_of_ref_still_apply() {
    let mut context = Context::new();
    let schema = context
        .parse(&json!({
            "$defs": { "any": true },
            "$ref": "#/$defs/any",
            "type": "string"
        }))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!("text")));
    assert!(!schema.is_valid(&json!(1)));
}

#[test]
fn anchors_resolve_within_their_resource() {
    let mut context = Context::new();
    let schema = context
        .parse(&json!({
            "$defs": {
                "name": { "$anchor": "name", "type": "string" }
            },
            "$ref": "#name"
        }))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!("Alice")));
    assert!(!schema.is_valid(&json!(1)));
}

#[test]
fn nested_ids_create_nested_resources() {
    let mut context = Context::new();
    context
        .parse(&json!({
            "$id": "https://example.com/root",
            "$defs": {
                "leaf": {
                    "$id": "https://example.com/leaf",
                    "type": "boolean"
                }
            }
        }))
        .expect("Invalid schema");
    let user = context
        .parse(&json!({"$ref": "https://example.com/leaf"}))
        .expect("Invalid schema");
    assert!(user.is_valid(&json!(true)));
    assert!(!user.is_valid(&json!("no")));
}

#[test]
fn relative_references_resolve_against_the_declared_base() {
    let mut context = Context::new();
    context
        .parse(&json!({
            "$id": "https://example.com/schemas/address",
            "type": "object",
            "required": ["street"]
        }))
        .expect("Invalid schema");
    let person = context
        .parse(&json!({
            "$id": "https://example.com/schemas/person",
            "properties": { "address": { "$ref": "address" } }
        }))
        .expect("Invalid schema");
    assert!(person.is_valid(&json!({"address": {"street": "Main"}})));
    assert!(!person.is_valid(&json!({"address": {}})));
}

#[test]
fn dynamic_ref_resolves_to_the_outermost_dynamic_anchor() {
    let mut context = Context::new();
    let tree = context
        .parse(&json!({
            "$id": "https://example.com/tree",
            "$dynamicAnchor": "node",
            "properties": {
                "children": {
                    "type": "array",
                    "items": { "$dynamicRef": "#node" }
                }
            }
        }))
        .expect("Invalid schema");
    let strict = context
        .parse(&json!({
            "$id": "https://example.com/strict",
            "$dynamicAnchor": "node",
            "$ref": "https://example.com/tree",
            "unevaluatedProperties": false
        }))
        .expect("Invalid schema");

    let instance = json!({"children": [ {"typo": 1} ]});
    assert!(tree.is_valid(&instance));
    assert!(!strict.is_valid(&instance));
    assert!(strict.is_valid(&json!({"children": [ {"children": []} ]})));
}

struct TestRetriever {
    schemas: HashMap<String, Value>,
}

impl Retrieve for TestRetriever {
    fn retrieve(&self, uri: &Uri<&str>) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        self.schemas
            .get(uri.as_str())
            .cloned()
            .ok_or_else(|| format!("Failed to find {uri}").into())
    }
}

#[test]
fn external_references_go_through_the_retriever() {
    let retriever = TestRetriever {
        schemas: [(
            "https://example.com/remote".to_string(),
            json!({"type": "object", "required": ["id"]}),
        )]
        .into_iter()
        .collect(),
    };
    let mut context = Context::options()
        .retriever(Arc::new(retriever))
        .build()
        .expect("Valid options");
    let schema = context
        .parse(&json!({"$ref": "https://example.com/remote"}))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!({"id": 1})));
    assert!(!schema.is_valid(&json!({})));
}

#[test]
fn retrieval_failures_fail_the_parse() {
    let retriever = TestRetriever {
        schemas: HashMap::new(),
    };
    let mut context = Context::options()
        .retriever(Arc::new(retriever))
        .build()
        .expect("Valid options");
    let error = context
        .parse(&json!({"$ref": "https://example.com/missing"}))
        .expect_err("Should fail");
    assert!(matches!(error, SchemaError::Unretrievable { .. }));
}

#[cfg(feature = "resolve-file")]
#[test]
fn file_references_load_from_disk() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().expect("Failed to create a temporary file");
    file.write_all(br#"{"type": "string"}"#).expect("Failed to write");
    let mut context = Context::new();
    let schema = context
        .parse(&json!({
            "$ref": format!("file://{}", file.path().display())
        }))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!("text")));
    assert!(!schema.is_valid(&json!(1)));
}

#[test]
fn unresolvable_pointers_fail_the_parse() {
    let mut context = Context::new();
    let error = context
        .parse(&json!({"$ref": "#/$defs/missing"}))
        .expect_err("Should fail");
    assert!(matches!(error, SchemaError::Unresolved { .. }));
}

#[test]
fn unknown_anchors_fail_the_parse() {
    let mut context = Context::new();
    let error = context
        .parse(&json!({"$ref": "#nowhere"}))
        .expect_err("Should fail");
    assert_eq!(error.to_string(), "Anchor 'nowhere' does not exist");
}

#[test]
fn id_with_fragment_is_rejected_in_2020_12() {
    let mut context = Context::new();
    let error = context
        .parse(&json!({"$id": "https://example.com/x#frag"}))
        .expect_err("Should fail");
    assert!(matches!(error, SchemaError::IdWithFragment { .. }));
}

#[test]
fn invalid_anchor_names_are_rejected() {
    let mut context = Context::new();
    let error = context
        .parse(&json!({"$anchor": "not/a-name"}))
        .expect_err("Should fail");
    assert_eq!(error.to_string(), "Anchor 'not/a-name' is invalid");
}

#[test]
fn schemas_snapshot_their_context() {
    let mut context = Context::new();
    let early = context
        .parse(&json!({"$id": "https://example.com/a", "type": "string"}))
        .expect("Invalid schema");
    // Parsed later; `early` must not be affected.
    context
        .parse(&json!({"$id": "https://example.com/b", "type": "number"}))
        .expect("Invalid schema");
    assert!(early.is_valid(&json!("x")));
    assert!(!early.is_valid(&json!(1)));
}
