//! A multi-dialect JSON Schema engine with structured output.
//!
//! `conforma` parses a schema document into a keyword program, resolves its
//! references (fetching external resources through a pluggable retriever),
//! and evaluates instances against it, producing a tree of output units with
//! errors and annotations.
//!
//! # Validation
//!
//! ```rust
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {
//!         "name": { "type": "string" }
//!     },
//!     "required": ["name"]
//! });
//!
//! let mut context = conforma::Context::new();
//! let schema = context.parse(&schema).expect("Invalid schema");
//!
//! assert!(schema.is_valid(&json!({ "name": "Alice" })));
//!
//! let output = schema.validate(&json!({}));
//! assert!(!output.valid());
//! for error in output.iter_errors() {
//!     println!(
//!         "{} at {} ({})",
//!         error.error().unwrap_or_default(),
//!         error.instance_location(),
//!         error.keyword_location(),
//!     );
//! }
//! ```
//!
//! # Dialects
//!
//! Schemas declare their dialect through `$schema`; without it the context's
//! default applies (2020-12). Draft-07, Draft-04 and the OpenAPI 3.1 base
//! dialect are bundled, and [`Context::parse_dialect`] registers new dialects
//! from meta-schemas using `$vocabulary`.
//!
//! # Shared contexts
//!
//! Schemas parsed into one [`Context`] see each other's resources, which is
//! what gives `$ref` and `$dynamicRef` their cross-document meaning:
//!
//! ```rust
//! use serde_json::json;
//!
//! let mut context = conforma::Context::new();
//! context
//!     .parse(&json!({
//!         "$id": "https://example.com/name",
//!         "type": "string"
//!     }))
//!     .expect("Invalid schema");
//! let person = context
//!     .parse(&json!({
//!         "properties": { "name": { "$ref": "https://example.com/name" } }
//!     }))
//!     .expect("Invalid schema");
//! assert!(person.is_valid(&json!({ "name": "Alice" })));
//! assert!(!person.is_valid(&json!({ "name": 1 })));
//! ```
//!
//! # Reference resolution
//!
//! Parsing is the only stage that touches the outside world: references to
//! unknown resources go through the configured [`Retrieve`] implementation.
//! The default retriever fetches `file://` and `http(s)://` resources when
//! the `resolve-file` / `resolve-http` features are enabled (both are on by
//! default). Validation never performs I/O.
mod context;
mod dialect;
mod error;
mod evaluate;
mod formats;
mod keyword;
mod keywords;
mod meta;
mod output;
mod parser;
mod paths;
mod registry;
mod retrieve;
mod uri;
mod validator;
mod value;

pub use context::{Context, ContextOptions, FormatMode};
pub use error::{SchemaError, UriError};
// The URI types appearing in the `Retrieve` signature.
pub use fluent_uri::Uri;
pub use formats::Format;
pub use output::OutputUnit;
pub use retrieve::{DefaultRetriever, Retrieve};
pub use validator::Schema;

use serde_json::Value;

/// Parse `schema` in a throwaway context and evaluate `instance` against it.
///
/// # Errors
///
/// Returns the parse error when the schema itself is invalid.
pub fn validate(schema: &Value, instance: &Value) -> Result<OutputUnit, SchemaError> {
    let mut context = Context::new();
    Ok(context.parse(schema)?.validate(instance))
}

/// One-off boolean validation.
///
/// # Panics
///
/// Panics when the schema itself is invalid; build a [`Context`] and handle
/// the error for anything beyond quick checks.
#[must_use]
pub fn is_valid(schema: &Value, instance: &Value) -> bool {
    validate(schema, instance)
        .expect("Invalid schema")
        .valid()
}
