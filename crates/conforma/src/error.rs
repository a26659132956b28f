//! Errors reported while parsing schemas and building contexts.
//!
//! Validation failures are not errors in this sense: they are reported
//! through the output tree. Everything that stops a parse — malformed
//! schema structure, unknown dialects, unresolvable references, keyword
//! dependency cycles — surfaces as a [`SchemaError`].
use core::fmt;

use fluent_uri::error::{ParseError, ResolveError};

/// An error that occurred while parsing a schema or building a context.
#[derive(Debug)]
pub enum SchemaError {
    /// A schema node is neither a boolean nor an object.
    NotASchema {
        /// Pointer to the offending node.
        location: String,
    },
    /// `$schema` names a dialect that is not registered in the context.
    UnknownDialect {
        /// The meta-schema URI found in `$schema`.
        uri: String,
    },
    /// A keyword value has the wrong shape for its keyword.
    InvalidKeyword {
        /// The keyword name.
        keyword: String,
        /// Pointer to the keyword.
        location: String,
        /// What the keyword expected instead.
        expected: &'static str,
    },
    /// A `pattern` or `patternProperties` regular expression failed to compile.
    InvalidRegex {
        /// The pattern source.
        pattern: String,
        /// The compile error.
        source: Box<fancy_regex::Error>,
    },
    /// An `$anchor`/`$dynamicAnchor` name does not match the anchor grammar.
    InvalidAnchor {
        /// The offending name.
        anchor: String,
    },
    /// A 2020-12 `$id` carries a non-empty fragment.
    IdWithFragment {
        /// The offending identifier.
        id: String,
    },
    /// Keyword dependency edges within one schema object form a cycle.
    CycleDetected {
        /// The keywords participating in the cycle.
        keys: Vec<String>,
    },
    /// A reference could not be satisfied after the full resolution pass.
    Unresolved {
        /// The reference as written in the schema.
        reference: String,
    },
    /// A JSON Pointer fragment leads to a part of a document that does not exist.
    PointerToNowhere {
        /// The pointer.
        pointer: String,
    },
    /// A plain-name fragment does not name an anchor within its resource.
    NoSuchAnchor {
        /// The anchor name.
        anchor: String,
    },
    /// A resource is unknown to the context and retrieving it failed.
    Unretrievable {
        /// The resource URI.
        uri: String,
        /// The retriever's failure, if it was invoked.
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    /// A meta-schema requires a vocabulary this implementation does not know.
    UnknownVocabulary {
        /// The vocabulary URI.
        uri: String,
    },
    /// A schema node was used for validation without being parsed first.
    UninitializedSchema {
        /// Pointer to the node.
        location: String,
    },
    /// An error occurred while parsing or resolving a URI.
    InvalidUri(UriError),
}

impl SchemaError {
    pub(crate) fn not_a_schema(location: impl Into<String>) -> SchemaError {
        SchemaError::NotASchema {
            location: location.into(),
        }
    }
    pub(crate) fn unknown_dialect(uri: impl Into<String>) -> SchemaError {
        SchemaError::UnknownDialect { uri: uri.into() }
    }
    pub(crate) fn invalid_keyword(
        keyword: impl Into<String>,
        location: impl Into<String>,
        expected: &'static str,
    ) -> SchemaError {
        SchemaError::InvalidKeyword {
            keyword: keyword.into(),
            location: location.into(),
            expected,
        }
    }
    pub(crate) fn invalid_regex(pattern: impl Into<String>, source: fancy_regex::Error) -> SchemaError {
        SchemaError::InvalidRegex {
            pattern: pattern.into(),
            source: Box::new(source),
        }
    }
    pub(crate) fn invalid_anchor(anchor: impl Into<String>) -> SchemaError {
        SchemaError::InvalidAnchor {
            anchor: anchor.into(),
        }
    }
    pub(crate) fn id_with_fragment(id: impl Into<String>) -> SchemaError {
        SchemaError::IdWithFragment { id: id.into() }
    }
    pub(crate) fn unresolved(reference: impl Into<String>) -> SchemaError {
        SchemaError::Unresolved {
            reference: reference.into(),
        }
    }
    pub(crate) fn pointer_to_nowhere(pointer: impl Into<String>) -> SchemaError {
        SchemaError::PointerToNowhere {
            pointer: pointer.into(),
        }
    }
    pub(crate) fn no_such_anchor(anchor: impl Into<String>) -> SchemaError {
        SchemaError::NoSuchAnchor {
            anchor: anchor.into(),
        }
    }
    pub(crate) fn unretrievable(
        uri: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> SchemaError {
        SchemaError::Unretrievable {
            uri: uri.into(),
            source,
        }
    }
    pub(crate) fn unknown_vocabulary(uri: impl Into<String>) -> SchemaError {
        SchemaError::UnknownVocabulary { uri: uri.into() }
    }
    pub(crate) fn uninitialized(location: impl Into<String>) -> SchemaError {
        SchemaError::UninitializedSchema {
            location: location.into(),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::NotASchema { location } => f.write_fmt(format_args!(
                "Value at '{location}' is neither a boolean nor an object and cannot be a schema"
            )),
            SchemaError::UnknownDialect { uri } => {
                f.write_fmt(format_args!("Unknown dialect: {uri}"))
            }
            SchemaError::InvalidKeyword {
                keyword,
                location,
                expected,
            } => f.write_fmt(format_args!(
                "Invalid '{keyword}' at '{location}': expected {expected}"
            )),
            SchemaError::InvalidRegex { pattern, source } => f.write_fmt(format_args!(
                "Invalid regular expression '{pattern}': {source}"
            )),
            SchemaError::InvalidAnchor { anchor } => {
                f.write_fmt(format_args!("Anchor '{anchor}' is invalid"))
            }
            SchemaError::IdWithFragment { id } => f.write_fmt(format_args!(
                "'$id' must not contain a non-empty fragment: {id}"
            )),
            SchemaError::CycleDetected { keys } => f.write_fmt(format_args!(
                "Keyword dependencies form a cycle: {}",
                keys.join(", ")
            )),
            SchemaError::Unresolved { reference } => {
                f.write_fmt(format_args!("Reference '{reference}' cannot be resolved"))
            }
            SchemaError::PointerToNowhere { pointer } => {
                f.write_fmt(format_args!("Pointer '{pointer}' does not exist"))
            }
            SchemaError::NoSuchAnchor { anchor } => {
                f.write_fmt(format_args!("Anchor '{anchor}' does not exist"))
            }
            SchemaError::Unretrievable { uri, source } => {
                f.write_fmt(format_args!(
                    "Resource '{uri}' is not present in the context and retrieving it failed"
                ))?;
                if let Some(err) = source {
                    f.write_fmt(format_args!(": {err}"))?;
                }
                Ok(())
            }
            SchemaError::UnknownVocabulary { uri } => f.write_fmt(format_args!(
                "Vocabulary '{uri}' is required but not known to this implementation"
            )),
            SchemaError::UninitializedSchema { location } => f.write_fmt(format_args!(
                "Schema at '{location}' has not been parsed"
            )),
            SchemaError::InvalidUri(error) => f.write_fmt(format_args!("Invalid URI: {error}")),
        }
    }
}

impl std::error::Error for SchemaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SchemaError::InvalidRegex { source, .. } => Some(&**source),
            SchemaError::Unretrievable {
                source: Some(source),
                ..
            } => Some(&**source),
            SchemaError::InvalidUri(error) => Some(error),
            _ => None,
        }
    }
}

/// An error from the underlying URI implementation.
#[derive(Debug)]
pub enum UriError {
    /// The input is not a valid URI reference.
    Parse(ParseError),
    /// The reference could not be resolved against its base.
    Resolve(ResolveError),
}

impl fmt::Display for UriError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UriError::Parse(err) => err.fmt(f),
            UriError::Resolve(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for UriError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UriError::Parse(err) => Some(err),
            UriError::Resolve(err) => Some(err),
        }
    }
}

impl From<ParseError> for SchemaError {
    fn from(error: ParseError) -> Self {
        SchemaError::InvalidUri(UriError::Parse(error))
    }
}

impl From<ParseError<String>> for SchemaError {
    fn from(error: ParseError<String>) -> Self {
        SchemaError::InvalidUri(UriError::Parse(error.strip_input()))
    }
}

impl From<ResolveError> for SchemaError {
    fn from(error: ResolveError) -> Self {
        SchemaError::InvalidUri(UriError::Resolve(error))
    }
}

#[cfg(test)]
mod tests {
    use super::SchemaError;
    use std::error::Error;

    #[test]
    fn displays_cycles_with_participants() {
        let error = SchemaError::CycleDetected {
            keys: vec!["A".into(), "B".into()],
        };
        assert_eq!(
            error.to_string(),
            "Keyword dependencies form a cycle: A, B"
        );
    }

    #[test]
    fn chains_retrieval_sources() {
        let error = SchemaError::unretrievable(
            "http://example.com/schema",
            Some("connection refused".into()),
        );
        assert_eq!(
            error.to_string(),
            "Resource 'http://example.com/schema' is not present in the context and retrieving it failed: connection refused"
        );
        assert!(error.source().is_some());
    }
}
