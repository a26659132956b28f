use conforma::{Context, FormatMode};
use serde_json::json;

#[test]
fn formats_annotate_but_do_not_assert_by_default() {
    let mut context = Context::new();
    let schema = context
        .parse(&json!({"format": "email"}))
        .expect("Invalid schema");
    let output = schema.validate(&json!("not-an-email"));
    assert!(output.valid());
    let annotation = output
        .annotations()
        .iter()
        .find(|unit| unit.keyword_location() == "/format")
        .expect("Annotation is recorded");
    assert_eq!(annotation.annotation(), Some(&json!("email")));
}

#[test]
fn known_mode_ignores_unknown_names() {
    let mut context = Context::options()
        .format_mode(FormatMode::Known)
        .build()
        .expect("Valid options");
    let schema = context
        .parse(&json!({"format": "matter-transporter-address"}))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!("anything")));
}

#[test]
fn strict_mode_rejects_unknown_names() {
    let mut context = Context::options()
        .format_mode(FormatMode::Strict)
        .build()
        .expect("Valid options");
    let schema = context
        .parse(&json!({"format": "matter-transporter-address"}))
        .expect("Invalid schema");
    let output = schema.validate(&json!("anything"));
    assert!(!output.valid());
    assert_eq!(
        output.errors()[0].error(),
        Some("format \"matter-transporter-address\" is unknown")
    );
}

#[test]
fn formats_apply_to_strings_only() {
    let mut context = Context::options()
        .format_mode(FormatMode::Strict)
        .build()
        .expect("Valid options");
    let schema = context
        .parse(&json!({"format": "ipv4"}))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!(42)));
    assert!(schema.is_valid(&json!(["999.999.999.999"])));
    assert!(!schema.is_valid(&json!("999.999.999.999")));
}

#[test]
fn context_formats_take_precedence() {
    let mut context = Context::options()
        .format_mode(FormatMode::Known)
        .format("ipv4", |value: &str| value == "anything-goes")
        .build()
        .expect("Valid options");
    let schema = context
        .parse(&json!({"format": "ipv4"}))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!("anything-goes")));
    assert!(!schema.is_valid(&json!("127.0.0.1")));
}

#[test]
fn custom_formats_are_validated_in_known_mode() {
    let mut context = Context::options()
        .format_mode(FormatMode::Known)
        .format("even-length", |value: &str| value.len() % 2 == 0)
        .build()
        .expect("Valid options");
    let schema = context
        .parse(&json!({"format": "even-length"}))
        .expect("Invalid schema");
    assert!(schema.is_valid(&json!("abcd")));
    assert!(!schema.is_valid(&json!("abc")));
}

#[test]
fn standard_formats_through_the_keyword() {
    let mut context = Context::options()
        .format_mode(FormatMode::Known)
        .build()
        .expect("Valid options");
    for (name, valid, invalid) in [
        ("date-time", "2024-06-01T10:20:30Z", "2024-06-01"),
        ("date", "2024-06-01", "01/06/2024"),
        ("time", "10:20:30+02:00", "25:00:00Z"),
        ("duration", "PT20M", "20M"),
        ("hostname", "example.com", "ex ample.com"),
        ("ipv6", "2001:db8::1", "2001:::1"),
        ("uri", "https://example.com/x", "not a uri"),
        ("uuid", "550e8400-e29b-41d4-a716-446655440000", "xyz"),
        ("json-pointer", "/a/b", "a/b"),
        ("regex", "^a+$", "a["),
    ] {
        let schema = context
            .parse(&json!({"format": name}))
            .expect("Invalid schema");
        assert!(schema.is_valid(&json!(valid)), "{name}: {valid}");
        assert!(!schema.is_valid(&json!(invalid)), "{name}: {invalid}");
    }
}
