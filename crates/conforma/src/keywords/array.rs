//! Array applicators: positional prefixes, the rest-of-array schema and
//! `contains`.
use serde_json::{json, Map, Value};

use crate::{
    error::SchemaError, evaluate::EvalScope, keyword::Keyword, parser::ParseScope, paths::Chunk,
};

use super::applicator::parse_schema_array;

pub(crate) static PREFIX_ITEMS: Keyword = Keyword {
    name: "prefixItems",
    dependencies: &["@resource"],
    dependents: &["@unevaluated"],
    parse: parse_prefix_items,
    validate: validate_prefix_items,
};

/// 2020-12 `items`: applies to every index the `prefixItems` annotation did
/// not cover.
pub(crate) static ITEMS: Keyword = Keyword {
    name: "items",
    dependencies: &["@resource", "prefixItems"],
    dependents: &["@unevaluated"],
    parse: parse_items,
    validate: validate_items,
};

pub(crate) static CONTAINS: Keyword = Keyword {
    name: "contains",
    dependencies: &["@resource"],
    dependents: &["@unevaluated"],
    parse: parse_contains,
    validate: validate_contains,
};

fn parse_prefix_items(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    parse_schema_array("prefixItems", scope, value)
}

fn parse_items(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    scope.parse_schema(value)
}

fn parse_contains(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    scope.parse_schema(value)
}

fn validate_prefix_items(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let (Value::Array(schemas), Value::Array(items)) = (value, instance) else {
        return;
    };
    let applied = schemas.len().min(items.len());
    for index in 0..applied {
        let addr = scope.addr().child(Chunk::Index(index));
        scope.apply(
            Some(Chunk::Index(index)),
            addr,
            &schemas[index],
            Some(Chunk::Index(index)),
            &items[index],
        );
    }
    if applied > 0 {
        let annotation = if applied == items.len() {
            Value::Bool(true)
        } else {
            json!(applied - 1)
        };
        scope.output_mut().annotate(annotation);
    }
}

fn validate_items(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let Value::Array(items) = instance else {
        return;
    };
    let start = match scope.sibling_annotation("prefixItems") {
        Some(Value::Bool(true)) => return,
        Some(Value::Number(largest)) => match largest.as_u64() {
            Some(largest) => largest as usize + 1,
            None => 0,
        },
        _ => 0,
    };
    let addr = scope.addr().clone();
    let mut applied = false;
    for (index, item) in items.iter().enumerate().skip(start) {
        scope.apply(None, addr.clone(), value, Some(Chunk::Index(index)), item);
        applied = true;
    }
    if applied {
        scope.output_mut().annotate(Value::Bool(true));
    }
}

fn validate_contains(
    scope: &mut EvalScope<'_>,
    value: &Value,
    parent: &Map<String, Value>,
    instance: &Value,
) {
    let Value::Array(items) = instance else {
        return;
    };
    let addr = scope.addr().clone();
    let mut matched = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let checkpoint = scope.checkpoint();
        if scope.apply(None, addr.clone(), value, Some(Chunk::Index(index)), item) {
            matched.push(index);
        } else {
            scope.restore(&checkpoint);
        }
    }
    // An adjacent `minContains` of zero waives the at-least-one requirement.
    let waived = parent.get("minContains").and_then(Value::as_u64) == Some(0);
    if matched.is_empty() && !waived {
        scope
            .output_mut()
            .fail("no array items match the \"contains\" schema");
    }
    let annotation = if matched.len() == items.len() {
        Value::Bool(true)
    } else {
        json!(matched)
    };
    scope.output_mut().annotate(annotation);
}
