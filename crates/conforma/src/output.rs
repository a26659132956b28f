//! The validation output tree.
//!
//! Every keyword evaluation gets a fresh [`OutputUnit`]; emitting attaches
//! it to the nearest enclosing unit, marking the parent invalid when the
//! child is. Speculative applicators (`not`, `anyOf`, `oneOf`, `if`) wrap
//! their sub-evaluations in [`OutputUnit::checkpoint`]/[`OutputUnit::restore`]
//! pairs so discarded branches leave no trace.
//!
//! The serialized shape follows the JSON Schema "verbose-ish" output format:
//! `valid`, `keywordLocation`, `absoluteKeywordLocation` (when the resource
//! has an absolute base), `instanceLocation`, then `error` / `annotation` and
//! the nested `errors` / `annotations` lists.
use serde::ser::SerializeMap;
use serde_json::Value;

/// One node of the validation result tree.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputUnit {
    pub(crate) valid: bool,
    pub(crate) keyword_location: String,
    pub(crate) absolute_keyword_location: Option<String>,
    pub(crate) instance_location: String,
    pub(crate) error: Option<String>,
    pub(crate) annotation: Option<Value>,
    pub(crate) errors: Vec<OutputUnit>,
    pub(crate) annotations: Vec<OutputUnit>,
}

/// A snapshot of the mutable parts of an output unit, used to roll back
/// speculative evaluation.
#[derive(Debug, Clone)]
pub(crate) struct Checkpoint {
    valid: bool,
    error: Option<String>,
    errors: usize,
    annotations: usize,
}

impl OutputUnit {
    pub(crate) fn new(
        keyword_location: String,
        absolute_keyword_location: Option<String>,
        instance_location: String,
    ) -> OutputUnit {
        OutputUnit {
            valid: true,
            keyword_location,
            absolute_keyword_location,
            instance_location,
            error: None,
            annotation: None,
            errors: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Whether this subtree represents a successful validation.
    #[must_use]
    pub const fn valid(&self) -> bool {
        self.valid
    }

    /// JSON Pointer through the schema program path.
    #[must_use]
    pub fn keyword_location(&self) -> &str {
        &self.keyword_location
    }

    /// Absolute URI of the validating keyword, when its resource has an
    /// absolute base URI.
    #[must_use]
    pub fn absolute_keyword_location(&self) -> Option<&str> {
        self.absolute_keyword_location.as_deref()
    }

    /// JSON Pointer into the instance.
    #[must_use]
    pub fn instance_location(&self) -> &str {
        &self.instance_location
    }

    /// The local error message, if this unit failed itself.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The annotation attached by a successful keyword evaluation.
    #[must_use]
    pub fn annotation(&self) -> Option<&Value> {
        self.annotation.as_ref()
    }

    /// Nested failing results.
    #[must_use]
    pub fn errors(&self) -> &[OutputUnit] {
        &self.errors
    }

    /// Nested successful results carrying annotations.
    #[must_use]
    pub fn annotations(&self) -> &[OutputUnit] {
        &self.annotations
    }

    /// Iterate over every unit in the subtree that carries its own error.
    pub fn iter_errors(&self) -> impl Iterator<Item = &OutputUnit> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            while let Some(unit) = stack.pop() {
                stack.extend(unit.errors.iter());
                if unit.error.is_some() {
                    return Some(unit);
                }
            }
            None
        })
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.error = Some(message.into());
    }

    pub(crate) fn annotate(&mut self, value: Value) {
        self.annotation = Some(value);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.error.is_none()
            && self.annotation.is_none()
            && self.errors.is_empty()
            && self.annotations.is_empty()
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            valid: self.valid,
            error: self.error.clone(),
            errors: self.errors.len(),
            annotations: self.annotations.len(),
        }
    }

    pub(crate) fn restore(&mut self, checkpoint: &Checkpoint) {
        self.valid = checkpoint.valid;
        self.error.clone_from(&checkpoint.error);
        self.errors.truncate(checkpoint.errors);
        self.annotations.truncate(checkpoint.annotations);
    }

    /// Attach a finished child unit to this one.
    ///
    /// Empty children are dropped, and a child that is nothing but a carrier
    /// for a single nested result is hoisted away before attaching.
    pub(crate) fn emit(&mut self, child: OutputUnit) {
        if child.is_empty() {
            return;
        }
        let child = hoist(child);
        if child.valid {
            self.annotations.push(child);
        } else {
            self.valid = false;
            self.errors.push(child);
        }
    }
}

fn hoist(mut unit: OutputUnit) -> OutputUnit {
    if unit.error.is_none()
        && unit.annotation.is_none()
        && unit.annotations.is_empty()
        && unit.errors.len() == 1
    {
        return unit.errors.pop().expect("Has exactly one element");
    }
    if unit.error.is_none()
        && unit.annotation.is_none()
        && unit.errors.is_empty()
        && unit.annotations.len() == 1
    {
        return unit.annotations.pop().expect("Has exactly one element");
    }
    unit
}

impl serde::Serialize for OutputUnit {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("valid", &self.valid)?;
        map.serialize_entry("keywordLocation", &self.keyword_location)?;
        if let Some(absolute) = &self.absolute_keyword_location {
            map.serialize_entry("absoluteKeywordLocation", absolute)?;
        }
        map.serialize_entry("instanceLocation", &self.instance_location)?;
        if let Some(error) = &self.error {
            map.serialize_entry("error", error)?;
        }
        if let Some(annotation) = &self.annotation {
            map.serialize_entry("annotation", annotation)?;
        }
        if !self.errors.is_empty() {
            map.serialize_entry("errors", &self.errors)?;
        }
        if !self.annotations.is_empty() {
            map.serialize_entry("annotations", &self.annotations)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::OutputUnit;
    use serde_json::json;

    fn unit(keyword_location: &str) -> OutputUnit {
        OutputUnit::new(keyword_location.to_string(), None, String::new())
    }

    #[test]
    fn empty_children_are_dropped() {
        let mut parent = unit("");
        parent.emit(unit("/type"));
        assert!(parent.valid());
        assert!(parent.annotations().is_empty());
        assert!(parent.errors().is_empty());
    }

    #[test]
    fn single_nested_errors_are_hoisted() {
        let mut carrier = unit("/allOf");
        let mut inner = unit("/allOf/0");
        let mut failing = unit("/allOf/0/type");
        failing.fail("type mismatch");
        inner.emit(failing);
        carrier.emit(inner);

        // `inner` carried nothing but the failing unit, so the failing unit
        // itself lands in the carrier.
        assert_eq!(carrier.errors().len(), 1);
        assert_eq!(carrier.errors()[0].keyword_location(), "/allOf/0/type");
        assert!(!carrier.valid());
    }

    #[test]
    fn restore_rolls_back_speculation() {
        let mut output = unit("/not");
        output.annotate(json!(["kept"]));
        let checkpoint = output.checkpoint();

        let mut failing = unit("/not/type");
        failing.fail("boom");
        output.emit(failing);
        let mut noted = unit("/not/properties");
        noted.annotate(json!(["a"]));
        output.emit(noted);
        assert!(!output.valid());

        output.restore(&checkpoint);
        assert!(output.valid());
        assert!(output.errors().is_empty());
        assert!(output.annotations().is_empty());
        assert_eq!(output.annotation(), Some(&json!(["kept"])));
    }

    #[test]
    fn serializes_the_wire_shape() {
        let mut root = unit("");
        let mut required = OutputUnit::new(
            "/required".to_string(),
            Some("https://example.com/schema#/required".to_string()),
            String::new(),
        );
        required.fail("\"name\" is a required property");
        root.emit(required);

        let serialized = serde_json::to_value(&root).expect("Serializable");
        assert_eq!(
            serialized,
            json!({
                "valid": false,
                "keywordLocation": "",
                "instanceLocation": "",
                "errors": [{
                    "valid": false,
                    "keywordLocation": "/required",
                    "absoluteKeywordLocation": "https://example.com/schema#/required",
                    "instanceLocation": "",
                    "error": "\"name\" is a required property"
                }]
            })
        );
    }
}
