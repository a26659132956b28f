//! Keyword variants kept for the older dialects: array-form `items`,
//! `additionalItems`, combined `dependencies` and draft-4's boolean
//! exclusive bounds.
use std::cmp::Ordering;

use serde_json::{json, Map, Value};

use crate::{
    error::SchemaError,
    evaluate::EvalScope,
    keyword::Keyword,
    parser::ParseScope,
    paths::Chunk,
    value::compare_numbers,
};

use super::fmt_value;

/// Draft-7 `items`: a schema for every item, or an array applied
/// positionally.
pub(crate) static LEGACY_ITEMS: Keyword = Keyword {
    name: "items",
    dependencies: &["@resource"],
    dependents: &["@unevaluated"],
    parse: parse_legacy_items,
    validate: validate_legacy_items,
};

/// Applied to the items the array-form `items` left uncovered.
pub(crate) static ADDITIONAL_ITEMS: Keyword = Keyword {
    name: "additionalItems",
    dependencies: &["@resource", "items"],
    dependents: &["@unevaluated"],
    parse: parse_lone_subschema,
    validate: validate_additional_items,
};

/// Draft-7 `dependencies`: per property, either a list of required names or
/// a schema to apply.
pub(crate) static DEPENDENCIES: Keyword = Keyword {
    name: "dependencies",
    dependencies: &["@resource"],
    dependents: &["@unevaluated"],
    parse: parse_dependencies,
    validate: validate_dependencies,
};

pub(crate) static MAXIMUM_DRAFT4: Keyword = Keyword {
    name: "maximum",
    dependencies: &[],
    dependents: &[],
    parse: parse_bound,
    validate: validate_maximum_draft4,
};

pub(crate) static MINIMUM_DRAFT4: Keyword = Keyword {
    name: "minimum",
    dependencies: &[],
    dependents: &[],
    parse: parse_bound,
    validate: validate_minimum_draft4,
};

/// Draft-4 boolean companions; their effect lives in `maximum`/`minimum`.
pub(crate) static EXCLUSIVE_MAXIMUM_DRAFT4: Keyword = Keyword {
    name: "exclusiveMaximum",
    dependencies: &[],
    dependents: &["maximum"],
    parse: parse_exclusive_flag,
    validate: validate_noop,
};

pub(crate) static EXCLUSIVE_MINIMUM_DRAFT4: Keyword = Keyword {
    name: "exclusiveMinimum",
    dependencies: &[],
    dependents: &["minimum"],
    parse: parse_exclusive_flag,
    validate: validate_noop,
};

fn validate_noop(_: &mut EvalScope<'_>, _: &Value, _: &Map<String, Value>, _: &Value) {}

fn parse_lone_subschema(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    scope.parse_schema(value)
}

fn parse_legacy_items(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    match value {
        Value::Array(schemas) => {
            if schemas.is_empty() {
                return Err(SchemaError::invalid_keyword(
                    "items",
                    scope.location(),
                    "a schema or a non-empty array of schemas",
                ));
            }
            for (index, schema) in schemas.iter().enumerate() {
                scope.in_child(Chunk::Index(index), |scope| scope.parse_schema(schema))?;
            }
            Ok(())
        }
        _ => scope.parse_schema(value),
    }
}

fn validate_legacy_items(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let Value::Array(items) = instance else {
        return;
    };
    match value {
        Value::Array(schemas) => {
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
        _ => {
            let addr = scope.addr().clone();
            for (index, item) in items.iter().enumerate() {
                scope.apply(None, addr.clone(), value, Some(Chunk::Index(index)), item);
            }
            if !items.is_empty() {
                scope.output_mut().annotate(Value::Bool(true));
            }
        }
    }
}

fn validate_additional_items(
    scope: &mut EvalScope<'_>,
    value: &Value,
    parent: &Map<String, Value>,
    instance: &Value,
) {
    let Value::Array(items) = instance else {
        return;
    };
    // Only meaningful past an array-form `items`.
    let Some(Value::Array(schemas)) = parent.get("items") else {
        return;
    };
    let addr = scope.addr().clone();
    let mut applied = false;
    for (index, item) in items.iter().enumerate().skip(schemas.len()) {
        scope.apply(None, addr.clone(), value, Some(Chunk::Index(index)), item);
        applied = true;
    }
    if applied {
        scope.output_mut().annotate(Value::Bool(true));
    }
}

fn parse_dependencies(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    let Value::Object(dependencies) = value else {
        return Err(SchemaError::invalid_keyword(
            "dependencies",
            scope.location(),
            "an object whose values are schemas or arrays of property names",
        ));
    };
    for (name, requirement) in dependencies {
        match requirement {
            Value::Array(names) => {
                if !names.iter().all(Value::is_string) {
                    return Err(SchemaError::invalid_keyword(
                        "dependencies",
                        scope.location(),
                        "an object whose values are schemas or arrays of property names",
                    ));
                }
            }
            _ => scope.in_child(Chunk::Key(name), |scope| scope.parse_schema(requirement))?,
        }
    }
    Ok(())
}

fn validate_dependencies(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let (Value::Object(dependencies), Value::Object(object)) = (value, instance) else {
        return;
    };
    let mut missing = Vec::new();
    for (name, requirement) in dependencies {
        if !object.contains_key(name) {
            continue;
        }
        match requirement {
            Value::Array(names) => {
                for required in names.iter().filter_map(Value::as_str) {
                    if !object.contains_key(required) {
                        missing.push(format!(
                            "\"{required}\" is required when \"{name}\" is present"
                        ));
                    }
                }
            }
            schema => {
                let addr = scope.addr().child(Chunk::Key(name));
                scope.apply(Some(Chunk::Key(name)), addr, schema, None, instance);
            }
        }
    }
    if !missing.is_empty() {
        scope.output_mut().fail(missing.join("; "));
    }
}

fn parse_bound(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    if value.is_number() {
        Ok(())
    } else {
        Err(SchemaError::invalid_keyword(
            super::current_keyword(scope),
            scope.location(),
            "a number",
        ))
    }
}

fn parse_exclusive_flag(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    if value.is_boolean() {
        Ok(())
    } else {
        Err(SchemaError::invalid_keyword(
            super::current_keyword(scope),
            scope.location(),
            "a boolean",
        ))
    }
}

fn exclusive_flag(parent: &Map<String, Value>, companion: &str) -> bool {
    parent.get(companion).and_then(Value::as_bool).unwrap_or(false)
}

fn validate_maximum_draft4(
    scope: &mut EvalScope<'_>,
    value: &Value,
    parent: &Map<String, Value>,
    instance: &Value,
) {
    let (Value::Number(number), Value::Number(limit)) = (instance, value) else {
        return;
    };
    let exclusive = exclusive_flag(parent, "exclusiveMaximum");
    let ordering = compare_numbers(number, limit);
    let out_of_range = ordering == Some(Ordering::Greater)
        || (exclusive && ordering == Some(Ordering::Equal));
    if out_of_range {
        scope.output_mut().fail(format!(
            "{} is greater than the maximum of {}",
            fmt_value(instance),
            fmt_value(value)
        ));
    }
}

fn validate_minimum_draft4(
    scope: &mut EvalScope<'_>,
    value: &Value,
    parent: &Map<String, Value>,
    instance: &Value,
) {
    let (Value::Number(number), Value::Number(limit)) = (instance, value) else {
        return;
    };
    let exclusive = exclusive_flag(parent, "exclusiveMinimum");
    let ordering = compare_numbers(number, limit);
    let out_of_range =
        ordering == Some(Ordering::Less) || (exclusive && ordering == Some(Ordering::Equal));
    if out_of_range {
        scope.output_mut().fail(format!(
            "{} is less than the minimum of {}",
            fmt_value(instance),
            fmt_value(value)
        ));
    }
}
