//! Object applicators: property schemas, pattern schemas, the rest-of-object
//! schema and property-name validation.
use ahash::AHashSet;
use serde_json::{Map, Value};

use crate::{
    error::SchemaError, evaluate::EvalScope, keyword::Keyword, parser::ParseScope, paths::Chunk,
};

pub(crate) static PROPERTIES: Keyword = Keyword {
    name: "properties",
    dependencies: &["@resource"],
    dependents: &["@unevaluated"],
    parse: parse_properties,
    validate: validate_properties,
};

pub(crate) static PATTERN_PROPERTIES: Keyword = Keyword {
    name: "patternProperties",
    dependencies: &["@resource"],
    dependents: &["@unevaluated"],
    parse: parse_pattern_properties,
    validate: validate_pattern_properties,
};

/// Applies to every property not already claimed by the `properties` or
/// `patternProperties` annotations of the same schema object.
pub(crate) static ADDITIONAL_PROPERTIES: Keyword = Keyword {
    name: "additionalProperties",
    dependencies: &["@resource", "properties", "patternProperties"],
    dependents: &["@unevaluated"],
    parse: parse_lone_subschema,
    validate: validate_additional_properties,
};

pub(crate) static PROPERTY_NAMES: Keyword = Keyword {
    name: "propertyNames",
    dependencies: &["@resource"],
    dependents: &[],
    parse: parse_lone_subschema,
    validate: validate_property_names,
};

fn parse_properties(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    let Value::Object(properties) = value else {
        return Err(SchemaError::invalid_keyword(
            "properties",
            scope.location(),
            "an object whose values are schemas",
        ));
    };
    for (name, schema) in properties {
        scope.in_child(Chunk::Key(name), |scope| scope.parse_schema(schema))?;
    }
    Ok(())
}

fn parse_pattern_properties(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    let Value::Object(patterns) = value else {
        return Err(SchemaError::invalid_keyword(
            "patternProperties",
            scope.location(),
            "an object whose keys are regular expressions and values are schemas",
        ));
    };
    for (pattern, schema) in patterns {
        scope.pattern_for(pattern)?;
        scope.in_child(Chunk::Key(pattern), |scope| scope.parse_schema(schema))?;
    }
    Ok(())
}

fn parse_lone_subschema(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    scope.parse_schema(value)
}

fn validate_properties(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let (Value::Object(properties), Value::Object(object)) = (value, instance) else {
        return;
    };
    let addr = scope.addr().clone();
    let mut matched = Vec::new();
    for (name, schema) in properties {
        if let Some(item) = object.get(name) {
            scope.apply(
                Some(Chunk::Key(name)),
                addr.child(Chunk::Key(name)),
                schema,
                Some(Chunk::Key(name)),
                item,
            );
            matched.push(Value::String(name.clone()));
        }
    }
    scope.output_mut().annotate(Value::Array(matched));
}

fn validate_pattern_properties(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let (Value::Object(patterns), Value::Object(object)) = (value, instance) else {
        return;
    };
    let addr = scope.addr().clone();
    let mut matched: Vec<String> = Vec::new();
    for (pattern, schema) in patterns {
        let Some(regex) = scope.pattern(pattern) else {
            continue;
        };
        for (name, item) in object {
            if regex.is_match(name).unwrap_or(false) {
                scope.apply(
                    Some(Chunk::Key(pattern)),
                    addr.child(Chunk::Key(pattern)),
                    schema,
                    Some(Chunk::Key(name)),
                    item,
                );
                if !matched.iter().any(|seen| seen == name) {
                    matched.push(name.clone());
                }
            }
        }
    }
    scope
        .output_mut()
        .annotate(Value::Array(matched.into_iter().map(Value::String).collect()));
}

fn validate_additional_properties(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let Value::Object(object) = instance else {
        return;
    };
    let mut claimed = AHashSet::new();
    for sibling in ["properties", "patternProperties"] {
        if let Some(Value::Array(names)) = scope.sibling_annotation(sibling) {
            for name in names {
                if let Value::String(name) = name {
                    claimed.insert(name);
                }
            }
        }
    }
    let addr = scope.addr().clone();
    let mut applied = Vec::new();
    for (name, item) in object {
        if claimed.contains(name) {
            continue;
        }
        scope.apply(None, addr.clone(), value, Some(Chunk::Key(name)), item);
        applied.push(Value::String(name.clone()));
    }
    scope.output_mut().annotate(Value::Array(applied));
}

fn validate_property_names(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let Value::Object(object) = instance else {
        return;
    };
    let addr = scope.addr().clone();
    for name in object.keys() {
        let name_value = Value::String(name.clone());
        scope.apply(None, addr.clone(), value, Some(Chunk::Key(name)), &name_value);
    }
}
