//! Assertion keywords: types, equality, numeric ranges, sizes and
//! property requirements. Each is a no-op when the instance type is outside
//! its domain.
use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::{
    error::SchemaError,
    evaluate::EvalScope,
    keyword::Keyword,
    parser::ParseScope,
    value::{compare_numbers, equal, matches_type, unicode_length, TYPE_NAMES},
};

use super::{current_keyword, expect_limit, fmt_value, limit_of};

pub(crate) static TYPE: Keyword = Keyword {
    name: "type",
    dependencies: &[],
    dependents: &[],
    parse: parse_type,
    validate: validate_type,
};

pub(crate) static ENUM: Keyword = Keyword {
    name: "enum",
    dependencies: &[],
    dependents: &[],
    parse: parse_enum,
    validate: validate_enum,
};

pub(crate) static CONST: Keyword = Keyword {
    name: "const",
    dependencies: &[],
    dependents: &[],
    parse: parse_any,
    validate: validate_const,
};

pub(crate) static MULTIPLE_OF: Keyword = Keyword {
    name: "multipleOf",
    dependencies: &[],
    dependents: &[],
    parse: parse_multiple_of,
    validate: validate_multiple_of,
};

pub(crate) static MAXIMUM: Keyword = Keyword {
    name: "maximum",
    dependencies: &[],
    dependents: &[],
    parse: parse_number,
    validate: validate_maximum,
};

pub(crate) static EXCLUSIVE_MAXIMUM: Keyword = Keyword {
    name: "exclusiveMaximum",
    dependencies: &[],
    dependents: &[],
    parse: parse_number,
    validate: validate_exclusive_maximum,
};

pub(crate) static MINIMUM: Keyword = Keyword {
    name: "minimum",
    dependencies: &[],
    dependents: &[],
    parse: parse_number,
    validate: validate_minimum,
};

pub(crate) static EXCLUSIVE_MINIMUM: Keyword = Keyword {
    name: "exclusiveMinimum",
    dependencies: &[],
    dependents: &[],
    parse: parse_number,
    validate: validate_exclusive_minimum,
};

pub(crate) static MAX_LENGTH: Keyword = Keyword {
    name: "maxLength",
    dependencies: &[],
    dependents: &[],
    parse: parse_limit,
    validate: validate_max_length,
};

pub(crate) static MIN_LENGTH: Keyword = Keyword {
    name: "minLength",
    dependencies: &[],
    dependents: &[],
    parse: parse_limit,
    validate: validate_min_length,
};

pub(crate) static PATTERN: Keyword = Keyword {
    name: "pattern",
    dependencies: &[],
    dependents: &[],
    parse: parse_pattern,
    validate: validate_pattern,
};

pub(crate) static MAX_ITEMS: Keyword = Keyword {
    name: "maxItems",
    dependencies: &[],
    dependents: &[],
    parse: parse_limit,
    validate: validate_max_items,
};

pub(crate) static MIN_ITEMS: Keyword = Keyword {
    name: "minItems",
    dependencies: &[],
    dependents: &[],
    parse: parse_limit,
    validate: validate_min_items,
};

pub(crate) static UNIQUE_ITEMS: Keyword = Keyword {
    name: "uniqueItems",
    dependencies: &[],
    dependents: &[],
    parse: parse_unique_items,
    validate: validate_unique_items,
};

pub(crate) static MAX_CONTAINS: Keyword = Keyword {
    name: "maxContains",
    dependencies: &["contains"],
    dependents: &[],
    parse: parse_limit,
    validate: validate_max_contains,
};

pub(crate) static MIN_CONTAINS: Keyword = Keyword {
    name: "minContains",
    dependencies: &["contains"],
    dependents: &[],
    parse: parse_limit,
    validate: validate_min_contains,
};

pub(crate) static MAX_PROPERTIES: Keyword = Keyword {
    name: "maxProperties",
    dependencies: &[],
    dependents: &[],
    parse: parse_limit,
    validate: validate_max_properties,
};

pub(crate) static MIN_PROPERTIES: Keyword = Keyword {
    name: "minProperties",
    dependencies: &[],
    dependents: &[],
    parse: parse_limit,
    validate: validate_min_properties,
};

pub(crate) static REQUIRED: Keyword = Keyword {
    name: "required",
    dependencies: &[],
    dependents: &[],
    parse: parse_required,
    validate: validate_required,
};

pub(crate) static DEPENDENT_REQUIRED: Keyword = Keyword {
    name: "dependentRequired",
    dependencies: &[],
    dependents: &[],
    parse: parse_dependent_required,
    validate: validate_dependent_required,
};

fn parse_any(
    _: &mut ParseScope<'_>,
    _: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    Ok(())
}

fn parse_type(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    let valid = match value {
        Value::String(name) => TYPE_NAMES.contains(&name.as_str()),
        Value::Array(names) => {
            !names.is_empty()
                && names.iter().all(|name| {
                    name.as_str()
                        .map_or(false, |name| TYPE_NAMES.contains(&name))
                })
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(SchemaError::invalid_keyword(
            "type",
            scope.location(),
            "a type name or a non-empty array of type names",
        ))
    }
}

fn parse_enum(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    if value.is_array() {
        Ok(())
    } else {
        Err(SchemaError::invalid_keyword(
            "enum",
            scope.location(),
            "an array of allowed values",
        ))
    }
}

fn parse_number(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    if value.is_number() {
        Ok(())
    } else {
        Err(SchemaError::invalid_keyword(
            current_keyword(scope),
            scope.location(),
            "a number",
        ))
    }
}

fn parse_multiple_of(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    if value.as_f64().map_or(false, |divisor| divisor > 0.) {
        Ok(())
    } else {
        Err(SchemaError::invalid_keyword(
            "multipleOf",
            scope.location(),
            "a number greater than zero",
        ))
    }
}

fn parse_limit(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    expect_limit(scope, value)
}

fn parse_pattern(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    let Value::String(pattern) = value else {
        return Err(SchemaError::invalid_keyword(
            "pattern",
            scope.location(),
            "a string holding a regular expression",
        ));
    };
    scope.pattern_for(pattern)
}

fn parse_unique_items(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    if value.is_boolean() {
        Ok(())
    } else {
        Err(SchemaError::invalid_keyword(
            "uniqueItems",
            scope.location(),
            "a boolean",
        ))
    }
}

fn parse_required(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    parse_string_array("required", scope, value)
}

fn parse_string_array(
    keyword: &'static str,
    scope: &ParseScope<'_>,
    value: &Value,
) -> Result<(), SchemaError> {
    let error = || {
        SchemaError::invalid_keyword(keyword, scope.location(), "an array of unique strings")
    };
    let Value::Array(names) = value else {
        return Err(error());
    };
    let mut seen = Vec::with_capacity(names.len());
    for name in names {
        let Value::String(name) = name else {
            return Err(error());
        };
        if seen.contains(&name) {
            return Err(error());
        }
        seen.push(name);
    }
    Ok(())
}

fn parse_dependent_required(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    let Value::Object(dependencies) = value else {
        return Err(SchemaError::invalid_keyword(
            "dependentRequired",
            scope.location(),
            "an object whose values are arrays of unique strings",
        ));
    };
    for requirement in dependencies.values() {
        parse_string_array("dependentRequired", scope, requirement)?;
    }
    Ok(())
}

fn validate_type(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    match value {
        Value::String(name) => {
            if !matches_type(instance, name) {
                scope.output_mut().fail(format!(
                    "{} is not of type \"{name}\"",
                    fmt_value(instance)
                ));
            }
        }
        Value::Array(names) => {
            let matched = names.iter().any(|name| {
                name.as_str()
                    .map_or(false, |name| matches_type(instance, name))
            });
            if !matched {
                let expected = names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|name| format!("\"{name}\""))
                    .collect::<Vec<_>>()
                    .join(", ");
                scope.output_mut().fail(format!(
                    "{} is not of type {expected}",
                    fmt_value(instance)
                ));
            }
        }
        _ => {}
    }
}

fn validate_enum(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let Value::Array(options) = value else {
        return;
    };
    if !options.iter().any(|option| equal(option, instance)) {
        scope.output_mut().fail(format!(
            "{} is not one of the allowed values",
            fmt_value(instance)
        ));
    }
}

fn validate_const(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    if !equal(value, instance) {
        scope.output_mut().fail(format!(
            "{} does not equal the expected constant {}",
            fmt_value(instance),
            fmt_value(value)
        ));
    }
}

fn validate_multiple_of(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let (Value::Number(number), Value::Number(divisor)) = (instance, value) else {
        return;
    };
    let (Some(number), Some(divisor)) = (number.as_f64(), divisor.as_f64()) else {
        return;
    };
    let quotient = number / divisor;
    if !quotient.is_finite() || quotient.fract() != 0. {
        scope.output_mut().fail(format!(
            "{} is not a multiple of {}",
            fmt_value(instance),
            divisor
        ));
    }
}

fn compare_to_limit(instance: &Value, limit: &Value) -> Option<Ordering> {
    match (instance, limit) {
        (Value::Number(instance), Value::Number(limit)) => compare_numbers(instance, limit),
        _ => None,
    }
}

fn validate_maximum(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    if compare_to_limit(instance, value) == Some(Ordering::Greater) {
        scope.output_mut().fail(format!(
            "{} is greater than the maximum of {}",
            fmt_value(instance),
            fmt_value(value)
        ));
    }
}

fn validate_exclusive_maximum(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    if matches!(
        compare_to_limit(instance, value),
        Some(Ordering::Greater | Ordering::Equal)
    ) {
        scope.output_mut().fail(format!(
            "{} is not less than the exclusive maximum of {}",
            fmt_value(instance),
            fmt_value(value)
        ));
    }
}

fn validate_minimum(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    if compare_to_limit(instance, value) == Some(Ordering::Less) {
        scope.output_mut().fail(format!(
            "{} is less than the minimum of {}",
            fmt_value(instance),
            fmt_value(value)
        ));
    }
}

fn validate_exclusive_minimum(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    if matches!(
        compare_to_limit(instance, value),
        Some(Ordering::Less | Ordering::Equal)
    ) {
        scope.output_mut().fail(format!(
            "{} is not greater than the exclusive minimum of {}",
            fmt_value(instance),
            fmt_value(value)
        ));
    }
}

fn validate_max_length(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let (Value::String(text), Some(limit)) = (instance, limit_of(value)) else {
        return;
    };
    if unicode_length(text) as u64 > limit {
        scope.output_mut().fail(format!(
            "{} is longer than {limit} characters",
            fmt_value(instance)
        ));
    }
}

fn validate_min_length(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let (Value::String(text), Some(limit)) = (instance, limit_of(value)) else {
        return;
    };
    if (unicode_length(text) as u64) < limit {
        scope.output_mut().fail(format!(
            "{} is shorter than {limit} characters",
            fmt_value(instance)
        ));
    }
}

fn validate_pattern(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let (Value::String(text), Value::String(pattern)) = (instance, value) else {
        return;
    };
    let Some(regex) = scope.pattern(pattern) else {
        return;
    };
    // Patterns are unanchored searches; a runtime failure (backtracking
    // limit) is treated as a non-match.
    if !regex.is_match(text).unwrap_or(false) {
        scope.output_mut().fail(format!(
            "{} does not match \"{pattern}\"",
            fmt_value(instance)
        ));
    }
}

fn validate_max_items(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let (Value::Array(items), Some(limit)) = (instance, limit_of(value)) else {
        return;
    };
    if items.len() as u64 > limit {
        scope
            .output_mut()
            .fail(format!("array has more than {limit} items"));
    }
}

fn validate_min_items(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let (Value::Array(items), Some(limit)) = (instance, limit_of(value)) else {
        return;
    };
    if (items.len() as u64) < limit {
        scope
            .output_mut()
            .fail(format!("array has fewer than {limit} items"));
    }
}

fn validate_unique_items(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let (Value::Array(items), Value::Bool(true)) = (instance, value) else {
        return;
    };
    for (index, left) in items.iter().enumerate() {
        if items.iter().skip(index + 1).any(|right| equal(left, right)) {
            scope.output_mut().fail("array items are not unique");
            return;
        }
    }
}

fn contains_count(scope: &EvalScope<'_>, instance: &Value) -> Option<u64> {
    let Value::Array(items) = instance else {
        return None;
    };
    match scope.sibling_annotation("contains")? {
        Value::Bool(true) => Some(items.len() as u64),
        Value::Array(indices) => Some(indices.len() as u64),
        _ => None,
    }
}

fn validate_max_contains(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let (Some(count), Some(limit)) = (contains_count(scope, instance), limit_of(value)) else {
        return;
    };
    if count > limit {
        scope.output_mut().fail(format!(
            "more than {limit} array items match the \"contains\" schema"
        ));
    }
}

fn validate_min_contains(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let (Some(count), Some(limit)) = (contains_count(scope, instance), limit_of(value)) else {
        return;
    };
    if count < limit {
        scope.output_mut().fail(format!(
            "fewer than {limit} array items match the \"contains\" schema"
        ));
    }
}

fn validate_max_properties(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let (Value::Object(object), Some(limit)) = (instance, limit_of(value)) else {
        return;
    };
    if object.len() as u64 > limit {
        scope
            .output_mut()
            .fail(format!("object has more than {limit} properties"));
    }
}

fn validate_min_properties(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let (Value::Object(object), Some(limit)) = (instance, limit_of(value)) else {
        return;
    };
    if (object.len() as u64) < limit {
        scope
            .output_mut()
            .fail(format!("object has fewer than {limit} properties"));
    }
}

fn validate_required(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let (Value::Array(names), Value::Object(object)) = (value, instance) else {
        return;
    };
    let missing = names
        .iter()
        .filter_map(Value::as_str)
        .filter(|name| !object.contains_key(*name))
        .map(|name| format!("\"{name}\""))
        .collect::<Vec<_>>();
    match missing.len() {
        0 => {}
        1 => scope
            .output_mut()
            .fail(format!("{} is a required property", missing[0])),
        _ => scope
            .output_mut()
            .fail(format!("{} are required properties", missing.join(", "))),
    }
}

fn validate_dependent_required(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let (Value::Object(dependencies), Value::Object(object)) = (value, instance) else {
        return;
    };
    let mut failures = Vec::new();
    for (name, requirement) in dependencies {
        if !object.contains_key(name) {
            continue;
        }
        let Value::Array(required) = requirement else {
            continue;
        };
        for required in required.iter().filter_map(Value::as_str) {
            if !object.contains_key(required) {
                failures.push(format!(
                    "\"{required}\" is required when \"{name}\" is present"
                ));
            }
        }
    }
    if !failures.is_empty() {
        scope.output_mut().fail(failures.join("; "));
    }
}
