//! `unevaluatedItems` / `unevaluatedProperties`.
//!
//! Both sit behind the `@unevaluated` barrier every annotation-producing
//! applicator declares as a dependent, and both aggregate annotations over
//! the *dynamic* scope: whatever `allOf`, `$ref`, conditionals and friends
//! successfully evaluated for the same instance location counts as covered.
use ahash::AHashSet;
use serde_json::{Map, Value};

use crate::{
    error::SchemaError, evaluate::EvalScope, keyword::Keyword, parser::ParseScope, paths::Chunk,
};

pub(crate) static UNEVALUATED_ITEMS: Keyword = Keyword {
    name: "unevaluatedItems",
    dependencies: &["@resource", "@unevaluated"],
    dependents: &[],
    parse: parse_subschema,
    validate: validate_unevaluated_items,
};

pub(crate) static UNEVALUATED_PROPERTIES: Keyword = Keyword {
    name: "unevaluatedProperties",
    dependencies: &["@resource", "@unevaluated"],
    dependents: &[],
    parse: parse_subschema,
    validate: validate_unevaluated_properties,
};

fn parse_subschema(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    scope.parse_schema(value)
}

fn validate_unevaluated_items(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let Value::Array(items) = instance else {
        return;
    };
    let mut first_uncovered = 0usize;
    for annotation in scope.dynamic_annotations(&["prefixItems", "items", "unevaluatedItems"]) {
        match annotation {
            Value::Bool(true) => first_uncovered = items.len(),
            Value::Number(largest) => {
                if let Some(largest) = largest.as_u64() {
                    first_uncovered = first_uncovered.max(largest as usize + 1);
                }
            }
            _ => {}
        }
    }
    let mut contained = AHashSet::new();
    for annotation in scope.dynamic_annotations(&["contains"]) {
        match annotation {
            Value::Bool(true) => first_uncovered = items.len(),
            Value::Array(indices) => {
                contained.extend(indices.iter().filter_map(Value::as_u64));
            }
            _ => {}
        }
    }
    let addr = scope.addr().clone();
    let mut applied = false;
    for (index, item) in items.iter().enumerate().skip(first_uncovered) {
        if contained.contains(&(index as u64)) {
            continue;
        }
        scope.apply(None, addr.clone(), value, Some(Chunk::Index(index)), item);
        applied = true;
    }
    if applied {
        scope.output_mut().annotate(Value::Bool(true));
    }
}

fn validate_unevaluated_properties(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let Value::Object(object) = instance else {
        return;
    };
    let mut evaluated = AHashSet::new();
    for annotation in scope.dynamic_annotations(&[
        "properties",
        "patternProperties",
        "additionalProperties",
        "unevaluatedProperties",
    ]) {
        if let Value::Array(names) = annotation {
            for name in names {
                if let Value::String(name) = name {
                    evaluated.insert(name);
                }
            }
        }
    }
    let addr = scope.addr().clone();
    let mut applied = Vec::new();
    for (name, item) in object {
        if evaluated.contains(name) {
            continue;
        }
        scope.apply(None, addr.clone(), value, Some(Chunk::Key(name)), item);
        applied.push(Value::String(name.clone()));
    }
    scope.output_mut().annotate(Value::Array(applied));
}
