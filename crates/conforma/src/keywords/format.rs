//! The `format` keyword.
//!
//! The format name is always attached as an annotation. Whether it also
//! asserts depends on the dialect (draft-4/7 treat `format` as an
//! assertion) and on the context's validation mode: `off` never asserts,
//! `known` asserts the formats the context knows, `strict` additionally
//! fails on names nobody recognizes.
use serde_json::{Map, Value};

use crate::{
    context::FormatMode, error::SchemaError, evaluate::EvalScope, keyword::Keyword,
    parser::ParseScope,
};

use super::fmt_value;

pub(crate) static FORMAT: Keyword = Keyword {
    name: "format",
    dependencies: &[],
    dependents: &[],
    parse: parse_format,
    validate: validate_format,
};

fn parse_format(
    scope: &mut ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    if value.is_string() {
        Ok(())
    } else {
        Err(SchemaError::invalid_keyword(
            "format",
            scope.location(),
            "a string holding a format name",
        ))
    }
}

fn validate_format(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    let Value::String(name) = value else {
        return;
    };
    scope.output_mut().annotate(value.clone());
    let Value::String(text) = instance else {
        return;
    };
    let asserting = scope.assert_formats();
    if !asserting && scope.ctx.mode == FormatMode::Off {
        return;
    }
    match scope.format_check(name) {
        Some(check) => {
            if !check.is_valid(text) {
                scope
                    .output_mut()
                    .fail(format!("{} is not a \"{name}\"", fmt_value(instance)));
            }
        }
        None => {
            if asserting || scope.ctx.mode == FormatMode::Strict {
                scope
                    .output_mut()
                    .fail(format!("format \"{name}\" is unknown"));
            }
        }
    }
}
