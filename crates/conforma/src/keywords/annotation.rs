//! The annotation keyword: collects its value at the current location.
//!
//! Serves both the known annotation-only keywords (`title`, `description`,
//! `default`, the OpenAPI extensions, ...) and every keyword the current
//! dialect does not recognize — unknown keywords never fail validation.
use serde_json::{Map, Value};

use crate::{error::SchemaError, evaluate::EvalScope, keyword::Keyword, parser::ParseScope};

pub(crate) static ANNOTATION: Keyword = Keyword {
    name: "annotation",
    dependencies: &[],
    dependents: &[],
    parse: parse,
    validate: validate,
};

/// `contentSchema` is annotation-only, but its value is still a schema, so
/// it is walked at parse time and references inside it bind.
pub(crate) static CONTENT_SCHEMA: Keyword = Keyword {
    name: "contentSchema",
    dependencies: &["@resource"],
    dependents: &[],
    parse: parse_content_schema,
    validate: validate,
};

fn parse(_: &mut ParseScope<'_>, _: &Value, _: &Map<String, Value>) -> Result<(), SchemaError> {
    Ok(())
}

fn parse_content_schema(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    scope.parse_schema(value)
}

fn validate(scope: &mut EvalScope<'_>, value: &Value, _: &Map<String, Value>, _: &Value) {
    scope.output_mut().annotate(value.clone());
}
