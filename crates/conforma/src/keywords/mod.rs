//! Keyword implementations, grouped by vocabulary.
pub(crate) mod annotation;
pub(crate) mod applicator;
pub(crate) mod array;
pub(crate) mod core;
pub(crate) mod format;
pub(crate) mod legacy;
pub(crate) mod object;
pub(crate) mod unevaluated;
pub(crate) mod validation;

use serde_json::Value;

use crate::{error::SchemaError, parser::ParseScope};

/// Render an instance for an error message, truncated so pathological
/// payloads do not flood the output.
pub(crate) fn fmt_value(value: &Value) -> String {
    let mut rendered = serde_json::to_string(value).unwrap_or_else(|_| String::from("<value>"));
    if rendered.len() > 120 {
        let mut cut = 117;
        while !rendered.is_char_boundary(cut) {
            cut -= 1;
        }
        rendered.truncate(cut);
        rendered.push_str("...");
    }
    rendered
}

/// A numeric limit: a `u64` or a float with zero fractional part.
pub(crate) fn limit_of(value: &Value) -> Option<u64> {
    let number = value.as_number()?;
    number.as_u64().or_else(|| {
        number
            .as_f64()
            .filter(|value| value.fract() == 0. && *value >= 0. && *value <= u64::MAX as f64)
            .map(|value| value as u64)
    })
}

/// The name of the keyword currently being parsed, read off the scope's
/// location.
pub(crate) fn current_keyword(scope: &ParseScope<'_>) -> String {
    crate::paths::last_segment(scope.location()).unwrap_or_default()
}

pub(crate) fn expect_limit(scope: &ParseScope<'_>, value: &Value) -> Result<(), SchemaError> {
    limit_of(value).map(|_| ()).ok_or_else(|| {
        SchemaError::invalid_keyword(
            current_keyword(scope),
            scope.location(),
            "a non-negative integer",
        )
    })
}
