//! In-place applicators: boolean combinators, conditionals and
//! schema dependencies.
use serde_json::{Map, Value};

use crate::{
    error::SchemaError, evaluate::EvalScope, keyword::Keyword, parser::ParseScope, paths::Chunk,
};

pub(crate) static ALL_OF: Keyword = Keyword {
    name: "allOf",
    dependencies: &["@resource"],
    dependents: &["@unevaluated"],
    parse: parse_all_of,
    validate: validate_all_of,
};

pub(crate) static ANY_OF: Keyword = Keyword {
    name: "anyOf",
    dependencies: &["@resource"],
    dependents: &["@unevaluated"],
    parse: parse_any_of,
    validate: validate_any_of,
};

pub(crate) static ONE_OF: Keyword = Keyword {
    name: "oneOf",
    dependencies: &["@resource"],
    dependents: &["@unevaluated"],
    parse: parse_one_of,
    validate: validate_one_of,
};

pub(crate) static NOT: Keyword = Keyword {
    name: "not",
    dependencies: &["@resource"],
    dependents: &["@unevaluated"],
    parse: parse_subschema,
    validate: validate_not,
};

pub(crate) static IF: Keyword = Keyword {
    name: "if",
    dependencies: &["@resource"],
    dependents: &["then", "else", "@unevaluated"],
    parse: parse_subschema,
    validate: validate_if,
};

pub(crate) static THEN: Keyword = Keyword {
    name: "then",
    dependencies: &["@resource", "if"],
    dependents: &["@unevaluated"],
    parse: parse_subschema,
    validate: validate_then,
};

pub(crate) static ELSE: Keyword = Keyword {
    name: "else",
    dependencies: &["@resource", "if"],
    dependents: &["@unevaluated"],
    parse: parse_subschema,
    validate: validate_else,
};

pub(crate) static DEPENDENT_SCHEMAS: Keyword = Keyword {
    name: "dependentSchemas",
    dependencies: &["@resource"],
    dependents: &["@unevaluated"],
    parse: parse_dependent_schemas,
    validate: validate_dependent_schemas,
};

pub(crate) fn parse_schema_array(
    keyword: &'static str,
    scope: &mut ParseScope<'_>,
    value: &Value,
) -> Result<(), SchemaError> {
    let Value::Array(schemas) = value else {
        return Err(SchemaError::invalid_keyword(
            keyword,
            scope.location(),
            "a non-empty array of schemas",
        ));
    };
    if schemas.is_empty() {
        return Err(SchemaError::invalid_keyword(
            keyword,
            scope.location(),
            "a non-empty array of schemas",
        ));
    }
    for (index, schema) in schemas.iter().enumerate() {
        scope.in_child(Chunk::Index(index), |scope| scope.parse_schema(schema))?;
    }
    Ok(())
}

fn parse_all_of(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    parse_schema_array("allOf", scope, value)
}

fn parse_any_of(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    parse_schema_array("anyOf", scope, value)
}

fn parse_one_of(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    parse_schema_array("oneOf", scope, value)
}

fn parse_subschema(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    scope.parse_schema(value)
}

fn parse_dependent_schemas(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    let Value::Object(schemas) = value else {
        return Err(SchemaError::invalid_keyword(
            "dependentSchemas",
            scope.location(),
            "an object whose values are schemas",
        ));
    };
    for (name, schema) in schemas {
        scope.in_child(Chunk::Key(name), |scope| scope.parse_schema(schema))?;
    }
    Ok(())
}

fn validate_all_of(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let Value::Array(schemas) = value else {
        return;
    };
    for (index, schema) in schemas.iter().enumerate() {
        let addr = scope.addr().child(Chunk::Index(index));
        scope.apply(Some(Chunk::Index(index)), addr, schema, None, instance);
    }
}

fn validate_any_of(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let Value::Array(schemas) = value else {
        return;
    };
    let mut any_matched = false;
    for (index, schema) in schemas.iter().enumerate() {
        let checkpoint = scope.checkpoint();
        let addr = scope.addr().child(Chunk::Index(index));
        if scope.apply(Some(Chunk::Index(index)), addr, schema, None, instance) {
            any_matched = true;
        } else {
            scope.restore(&checkpoint);
        }
    }
    if !any_matched {
        scope
            .output_mut()
            .fail("value does not match any of the given subschemas");
    }
}

fn validate_one_of(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let Value::Array(schemas) = value else {
        return;
    };
    let mut matched = 0usize;
    for (index, schema) in schemas.iter().enumerate() {
        let checkpoint = scope.checkpoint();
        let addr = scope.addr().child(Chunk::Index(index));
        if scope.apply(Some(Chunk::Index(index)), addr, schema, None, instance) {
            matched += 1;
        } else {
            scope.restore(&checkpoint);
        }
    }
    match matched {
        1 => {}
        0 => scope
            .output_mut()
            .fail("value does not match any of the given subschemas"),
        _ => scope
            .output_mut()
            .fail("value matches more than one of the given subschemas"),
    }
}

fn validate_not(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let checkpoint = scope.checkpoint();
    let matched = scope.apply_in_place(value, instance);
    scope.restore(&checkpoint);
    if matched {
        scope
            .output_mut()
            .fail("value must not validate against the schema");
    }
}

fn validate_if(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let checkpoint = scope.checkpoint();
    let matched = scope.apply_in_place(value, instance);
    if !matched {
        // `if` never affects validity; a failed condition leaves only its
        // annotation behind.
        scope.restore(&checkpoint);
    }
    scope.output_mut().annotate(Value::Bool(matched));
}

fn validate_then(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    if scope.sibling_annotation("if") == Some(Value::Bool(true)) {
        scope.apply_in_place(value, instance);
    }
}

fn validate_else(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    if scope.sibling_annotation("if") == Some(Value::Bool(false)) {
        scope.apply_in_place(value, instance);
    }
}

fn validate_dependent_schemas(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let (Value::Object(schemas), Value::Object(object)) = (value, instance) else {
        return;
    };
    for (name, schema) in schemas {
        if object.contains_key(name) {
            let addr = scope.addr().child(Chunk::Key(name));
            scope.apply(Some(Chunk::Key(name)), addr, schema, None, instance);
        }
    }
}
