//! Core keywords: identifiers, anchors, references and definitions.
use serde_json::{Map, Value};

use crate::{
    error::SchemaError,
    evaluate::EvalScope,
    keyword::Keyword,
    paths::Chunk,
    registry::{RefKind, SchemaAddr},
    uri,
};

use super::fmt_value;

/// Handled during dialect dispatch; a no-op as a program slot.
pub(crate) static SCHEMA: Keyword = Keyword {
    name: "$schema",
    dependencies: &[],
    dependents: &[],
    parse: parse_noop,
    validate: validate_noop,
};

/// Meaningful only when a document is parsed as a dialect definition.
pub(crate) static VOCABULARY: Keyword = Keyword {
    name: "$vocabulary",
    dependencies: &[],
    dependents: &[],
    parse: parse_noop,
    validate: validate_noop,
};

pub(crate) static COMMENT: Keyword = Keyword {
    name: "$comment",
    dependencies: &[],
    dependents: &[],
    parse: parse_noop,
    validate: validate_noop,
};

pub(crate) static ID: Keyword = Keyword {
    name: "$id",
    dependencies: &[],
    dependents: &["@resource"],
    parse: parse_id,
    validate: validate_noop,
};

/// `$id` in dialects that still allowed a plain-name fragment: the fragment
/// doubles as an anchor.
pub(crate) static LEGACY_ID: Keyword = Keyword {
    name: "$id",
    dependencies: &[],
    dependents: &["@resource"],
    parse: parse_legacy_id,
    validate: validate_noop,
};

pub(crate) static ANCHOR: Keyword = Keyword {
    name: "$anchor",
    dependencies: &["@resource"],
    dependents: &[],
    parse: parse_anchor,
    validate: validate_noop,
};

pub(crate) static DYNAMIC_ANCHOR: Keyword = Keyword {
    name: "$dynamicAnchor",
    dependencies: &["@resource"],
    dependents: &[],
    parse: parse_dynamic_anchor,
    validate: validate_noop,
};

pub(crate) static REF: Keyword = Keyword {
    name: "$ref",
    dependencies: &["@resource"],
    dependents: &["@unevaluated"],
    parse: parse_ref,
    validate: validate_ref,
};

pub(crate) static DYNAMIC_REF: Keyword = Keyword {
    name: "$dynamicRef",
    dependencies: &["@resource"],
    dependents: &["@unevaluated"],
    parse: parse_dynamic_ref,
    validate: validate_dynamic_ref,
};

/// `$defs` / `definitions`: holds schemas, validates nothing itself.
pub(crate) static DEFS: Keyword = Keyword {
    name: "$defs",
    dependencies: &["@resource"],
    dependents: &[],
    parse: parse_defs,
    validate: validate_noop,
};

fn parse_noop(
    _: &mut crate::parser::ParseScope<'_>,
    _: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    Ok(())
}

fn validate_noop(_: &mut EvalScope<'_>, _: &Value, _: &Map<String, Value>, _: &Value) {}

fn parse_id(
    scope: &mut crate::parser::ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    let Value::String(id) = value else {
        return Err(SchemaError::invalid_keyword(
            "$id",
            scope.location(),
            "a string holding a URI reference",
        ));
    };
    let (base_part, fragment) = uri::split_fragment(id);
    if fragment.map_or(false, |fragment| !fragment.is_empty()) {
        return Err(SchemaError::id_with_fragment(id));
    }
    let resolved = uri::resolve_against(scope.base_uri(), base_part)?;
    scope.declare_id(resolved);
    Ok(())
}

fn parse_legacy_id(
    scope: &mut crate::parser::ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    let Value::String(id) = value else {
        return Err(SchemaError::invalid_keyword(
            "$id",
            scope.location(),
            "a string holding a URI reference",
        ));
    };
    let (base_part, fragment) = uri::split_fragment(id);
    if let Some(fragment) = fragment.filter(|fragment| !fragment.is_empty()) {
        if !is_valid_anchor(&fragment) {
            return Err(SchemaError::invalid_anchor(fragment));
        }
        scope.declare_anchor(&fragment, false);
    }
    if !base_part.is_empty() {
        let resolved = uri::resolve_against(scope.base_uri(), base_part)?;
        scope.declare_id(resolved);
    }
    Ok(())
}

// `^[A-Za-z_][A-Za-z0-9\-_.]*$`
fn is_valid_anchor(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .map_or(false, |first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
}

fn parse_anchor_impl(
    keyword: &'static str,
    dynamic: bool,
    scope: &mut crate::parser::ParseScope<'_>,
    value: &Value,
) -> Result<(), SchemaError> {
    let Value::String(name) = value else {
        return Err(SchemaError::invalid_keyword(
            keyword,
            scope.location(),
            "a string holding an anchor name",
        ));
    };
    if !is_valid_anchor(name) {
        return Err(SchemaError::invalid_anchor(name.clone()));
    }
    scope.declare_anchor(name, dynamic);
    Ok(())
}

fn parse_anchor(
    scope: &mut crate::parser::ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    parse_anchor_impl("$anchor", false, scope, value)
}

fn parse_dynamic_anchor(
    scope: &mut crate::parser::ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    parse_anchor_impl("$dynamicAnchor", true, scope, value)
}

fn parse_ref_impl(
    keyword: &'static str,
    kind: RefKind,
    scope: &mut crate::parser::ParseScope<'_>,
    value: &Value,
) -> Result<(), SchemaError> {
    let Value::String(reference) = value else {
        return Err(SchemaError::invalid_keyword(
            keyword,
            scope.location(),
            "a string holding a URI reference",
        ));
    };
    scope.enqueue_reference(kind, reference)
}

fn parse_ref(
    scope: &mut crate::parser::ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    parse_ref_impl("$ref", RefKind::Ref, scope, value)
}

fn parse_dynamic_ref(
    scope: &mut crate::parser::ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    parse_ref_impl("$dynamicRef", RefKind::DynamicRef, scope, value)
}

/// Push the resolved target and validate the same instance against it.
fn apply_target(scope: &mut EvalScope<'_>, target: SchemaAddr, uri: &str, instance: &Value) {
    // A jump to a node already being evaluated at this instance location
    // cannot make progress; recursive schemas terminate here.
    if scope.is_active(&target) {
        return;
    }
    let ctx = scope.ctx;
    match ctx.registry.value_at(&target) {
        Some(node) => {
            scope.apply(None, target, node, None, instance);
        }
        None => scope
            .output_mut()
            .fail(format!("unknown schema reference: {uri}")),
    }
}

fn validate_ref(scope: &mut EvalScope<'_>, value: &Value, _: &Map<String, Value>, instance: &Value) {
    match scope.reference(RefKind::Ref) {
        Some(reference) => {
            let target = reference.target.clone();
            let uri = reference.uri.clone();
            apply_target(scope, target, &uri, instance);
        }
        None => scope.output_mut().fail(format!(
            "unknown schema reference: {}",
            fmt_value(value)
        )),
    }
}

fn validate_dynamic_ref(
    scope: &mut EvalScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
    instance: &Value,
) {
    match scope.reference(RefKind::DynamicRef) {
        Some(reference) => {
            let mut target = reference.target.clone();
            let uri = reference.uri.clone();
            // A fragment declared as `$dynamicAnchor` somewhere in the
            // dynamic scope re-targets the reference to the outermost
            // resource declaring it.
            if let Some(name) = reference.anchor.clone() {
                if let Some(outer) = scope.outermost_dynamic_anchor(&name) {
                    target = outer;
                }
            }
            apply_target(scope, target, &uri, instance);
        }
        None => scope.output_mut().fail(format!(
            "unknown schema reference: {}",
            fmt_value(value)
        )),
    }
}

fn parse_defs(
    scope: &mut crate::parser::ParseScope<'_>,
    value: &Value,
    _: &Map<String, Value>,
) -> Result<(), SchemaError> {
    let Value::Object(definitions) = value else {
        return Err(SchemaError::invalid_keyword(
            "$defs",
            scope.location(),
            "an object whose values are schemas",
        ));
    };
    for (name, definition) in definitions {
        scope.in_child(Chunk::Key(name), |scope| scope.parse_schema(definition))?;
    }
    Ok(())
}
