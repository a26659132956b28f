//! Helpers over the JSON value model: deep equality, numeric comparison,
//! type predicates and the names used in error messages.
use std::cmp::Ordering;

use num_cmp::NumCmp;
use serde_json::{Number, Value};

/// Deep equality between two JSON values.
///
/// Numbers are compared by value, not representation: `1`, `1.0` and the
/// `u64`/`i64`/`f64` encodings of the same quantity are all equal.
pub(crate) fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(left), Value::Bool(right)) => left == right,
        (Value::Number(left), Value::Number(right)) => numbers_equal(left, right),
        (Value::String(left), Value::String(right)) => left == right,
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len() && left.iter().zip(right.iter()).all(|(l, r)| equal(l, r))
        }
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .all(|(key, value)| right.get(key).map_or(false, |other| equal(value, other)))
        }
        (_, _) => false,
    }
}

enum Repr {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

fn repr(number: &Number) -> Repr {
    if let Some(value) = number.as_u64() {
        Repr::Unsigned(value)
    } else if let Some(value) = number.as_i64() {
        Repr::Signed(value)
    } else {
        // `serde_json` numbers always fit one of the three representations
        Repr::Float(number.as_f64().unwrap_or(f64::NAN))
    }
}

pub(crate) fn numbers_equal(left: &Number, right: &Number) -> bool {
    compare_numbers(left, right) == Some(Ordering::Equal)
}

/// Precise comparison across the `u64` / `i64` / `f64` representations.
pub(crate) fn compare_numbers(left: &Number, right: &Number) -> Option<Ordering> {
    match (repr(left), repr(right)) {
        (Repr::Unsigned(l), Repr::Unsigned(r)) => Some(l.cmp(&r)),
        (Repr::Unsigned(l), Repr::Signed(r)) => NumCmp::num_cmp(l, r),
        (Repr::Unsigned(l), Repr::Float(r)) => NumCmp::num_cmp(l, r),
        (Repr::Signed(l), Repr::Unsigned(r)) => NumCmp::num_cmp(l, r),
        (Repr::Signed(l), Repr::Signed(r)) => Some(l.cmp(&r)),
        (Repr::Signed(l), Repr::Float(r)) => NumCmp::num_cmp(l, r),
        (Repr::Float(l), Repr::Unsigned(r)) => NumCmp::num_cmp(l, r),
        (Repr::Float(l), Repr::Signed(r)) => NumCmp::num_cmp(l, r),
        (Repr::Float(l), Repr::Float(r)) => l.partial_cmp(&r),
    }
}

/// Whether the number is mathematically an integer.
///
/// Integer is a sub-kind of number: any float with a zero fractional part
/// qualifies, so `1.0` is an integer.
pub(crate) fn is_integer(number: &Number) -> bool {
    number.is_u64()
        || number.is_i64()
        || number.as_f64().map_or(false, |value| value.fract() == 0.)
}

/// The type name used in validation error messages.
pub(crate) fn type_name(instance: &Value) -> &'static str {
    match instance {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Whether the instance matches a JSON Schema type name.
///
/// Unknown names match nothing; the `type` keyword rejects them at parse time.
pub(crate) fn matches_type(instance: &Value, name: &str) -> bool {
    match name {
        "null" => instance.is_null(),
        "boolean" => instance.is_boolean(),
        "object" => instance.is_object(),
        "array" => instance.is_array(),
        "string" => instance.is_string(),
        "number" => instance.is_number(),
        "integer" => instance.as_number().map_or(false, is_integer),
        _ => false,
    }
}

pub(crate) const TYPE_NAMES: &[&str] = &[
    "array", "boolean", "integer", "null", "number", "object", "string",
];

/// String size in Unicode code points, as mandated for `maxLength`/`minLength`.
pub(crate) fn unicode_length(value: &str) -> usize {
    bytecount::num_chars(value.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::{compare_numbers, equal, is_integer, matches_type, unicode_length};
    use serde_json::{json, Value};
    use std::cmp::Ordering;
    use test_case::test_case;

    #[test_case(&json!(1), &json!(1.0), true)]
    #[test_case(&json!(1), &json!(1.5), false)]
    #[test_case(&json!(-1), &json!(18446744073709551615_u64), false)]
    #[test_case(&json!([1, [2, 3]]), &json!([1.0, [2.0, 3.0]]), true)]
    #[test_case(&json!({"a": 1, "b": 2}), &json!({"b": 2.0, "a": 1}), true)]
    #[test_case(&json!({"a": 1}), &json!({"a": 1, "b": 2}), false)]
    #[test_case(&json!(null), &json!(0), false)]
    fn deep_equality(left: &Value, right: &Value, expected: bool) {
        assert_eq!(equal(left, right), expected);
        assert_eq!(equal(right, left), expected);
    }

    #[test]
    fn number_ordering() {
        let small = json!(2);
        let large = json!(2.5);
        assert_eq!(
            compare_numbers(small.as_number().unwrap(), large.as_number().unwrap()),
            Some(Ordering::Less)
        );
    }

    #[test_case(&json!(10), true)]
    #[test_case(&json!(10.0), true)]
    #[test_case(&json!(10.5), false)]
    fn integer_detection(value: &Value, expected: bool) {
        assert_eq!(is_integer(value.as_number().unwrap()), expected);
    }

    #[test]
    fn integer_is_a_number() {
        assert!(matches_type(&json!(1), "number"));
        assert!(matches_type(&json!(1), "integer"));
        assert!(matches_type(&json!(1.0), "integer"));
        assert!(!matches_type(&json!(1.2), "integer"));
    }

    #[test]
    fn code_point_length() {
        assert_eq!(unicode_length("abc"), 3);
        assert_eq!(unicode_length("поезд"), 5);
        assert_eq!(unicode_length(""), 0);
    }
}
