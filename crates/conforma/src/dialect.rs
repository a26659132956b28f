//! Dialects: named bundles of keywords, vocabularies and formats keyed by
//! their meta-schema URI.
use std::{fmt, sync::Arc};

use ahash::AHashMap;
use serde_json::Value;

use crate::{
    error::SchemaError,
    formats::Format,
    keyword::Keyword,
    keywords::{annotation, applicator, array, core, format, legacy, object, unevaluated, validation},
};

pub(crate) const DRAFT_2020_12: &str = "https://json-schema.org/draft/2020-12/schema";
pub(crate) const DRAFT_7: &str = "http://json-schema.org/draft-07/schema";
pub(crate) const DRAFT_4: &str = "http://json-schema.org/draft-04/schema";
pub(crate) const OPENAPI_3_1: &str = "https://spec.openapis.org/oas/3.1/dialect/base";

type KeywordTable = &'static [(&'static str, &'static Keyword)];

/// A bundle of keywords and formats identified by a meta-schema URI.
pub(crate) struct Dialect {
    pub(crate) uri: String,
    keywords: AHashMap<String, &'static Keyword>,
    /// Dialect-level format registry; composed under context-level formats.
    pub(crate) formats: AHashMap<String, Arc<dyn Format>>,
    /// Whether `format` asserts by itself in this dialect.
    pub(crate) assert_formats: bool,
    /// The `$vocabulary` entries this dialect was built from.
    pub(crate) vocabularies: Vec<(String, bool)>,
}

impl fmt::Debug for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialect").field("uri", &self.uri).finish()
    }
}

impl Dialect {
    /// The descriptor a key resolves to; unrecognized keywords collect
    /// their value as an annotation.
    pub(crate) fn keyword_for(&self, key: &str) -> &'static Keyword {
        self.keywords
            .get(key)
            .copied()
            .unwrap_or(&annotation::ANNOTATION)
    }

    fn from_tables(uri: &str, tables: &[KeywordTable], assert_formats: bool) -> Dialect {
        let mut keywords = AHashMap::new();
        for table in tables {
            for (name, keyword) in *table {
                keywords.insert((*name).to_string(), *keyword);
            }
        }
        Dialect {
            uri: uri.trim_end_matches('#').to_string(),
            keywords,
            formats: AHashMap::new(),
            assert_formats,
            vocabularies: Vec::new(),
        }
    }
}

/// A keyword group addressable from a meta-schema's `$vocabulary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Vocabulary {
    Core,
    Applicator,
    Unevaluated,
    Validation,
    FormatAnnotation,
    FormatAssertion,
    Content,
    MetaData,
    OpenApiBase,
}

impl Vocabulary {
    pub(crate) fn from_uri(uri: &str) -> Option<Vocabulary> {
        Some(match uri {
            "https://json-schema.org/draft/2020-12/vocab/core" => Vocabulary::Core,
            "https://json-schema.org/draft/2020-12/vocab/applicator" => Vocabulary::Applicator,
            "https://json-schema.org/draft/2020-12/vocab/unevaluated" => Vocabulary::Unevaluated,
            "https://json-schema.org/draft/2020-12/vocab/validation" => Vocabulary::Validation,
            "https://json-schema.org/draft/2020-12/vocab/format-annotation" => {
                Vocabulary::FormatAnnotation
            }
            "https://json-schema.org/draft/2020-12/vocab/format-assertion" => {
                Vocabulary::FormatAssertion
            }
            "https://json-schema.org/draft/2020-12/vocab/content" => Vocabulary::Content,
            "https://json-schema.org/draft/2020-12/vocab/meta-data" => Vocabulary::MetaData,
            "https://spec.openapis.org/oas/3.1/vocab/base" => Vocabulary::OpenApiBase,
            _ => return None,
        })
    }

    pub(crate) fn keywords(self) -> KeywordTable {
        match self {
            Vocabulary::Core => CORE,
            Vocabulary::Applicator => APPLICATOR,
            Vocabulary::Unevaluated => UNEVALUATED,
            Vocabulary::Validation => VALIDATION,
            Vocabulary::FormatAnnotation | Vocabulary::FormatAssertion => FORMAT,
            Vocabulary::Content => CONTENT,
            Vocabulary::MetaData => META_DATA,
            Vocabulary::OpenApiBase => OPENAPI_BASE,
        }
    }
}

static CORE: KeywordTable = &[
    ("$schema", &core::SCHEMA),
    ("$vocabulary", &core::VOCABULARY),
    ("$id", &core::ID),
    ("$anchor", &core::ANCHOR),
    ("$dynamicAnchor", &core::DYNAMIC_ANCHOR),
    ("$ref", &core::REF),
    ("$dynamicRef", &core::DYNAMIC_REF),
    ("$defs", &core::DEFS),
    ("$comment", &core::COMMENT),
];

static APPLICATOR: KeywordTable = &[
    ("allOf", &applicator::ALL_OF),
    ("anyOf", &applicator::ANY_OF),
    ("oneOf", &applicator::ONE_OF),
    ("not", &applicator::NOT),
    ("if", &applicator::IF),
    ("then", &applicator::THEN),
    ("else", &applicator::ELSE),
    ("dependentSchemas", &applicator::DEPENDENT_SCHEMAS),
    ("prefixItems", &array::PREFIX_ITEMS),
    ("items", &array::ITEMS),
    ("contains", &array::CONTAINS),
    ("properties", &object::PROPERTIES),
    ("patternProperties", &object::PATTERN_PROPERTIES),
    ("additionalProperties", &object::ADDITIONAL_PROPERTIES),
    ("propertyNames", &object::PROPERTY_NAMES),
];

static UNEVALUATED: KeywordTable = &[
    ("unevaluatedItems", &unevaluated::UNEVALUATED_ITEMS),
    ("unevaluatedProperties", &unevaluated::UNEVALUATED_PROPERTIES),
];

static VALIDATION: KeywordTable = &[
    ("type", &validation::TYPE),
    ("enum", &validation::ENUM),
    ("const", &validation::CONST),
    ("multipleOf", &validation::MULTIPLE_OF),
    ("maximum", &validation::MAXIMUM),
    ("exclusiveMaximum", &validation::EXCLUSIVE_MAXIMUM),
    ("minimum", &validation::MINIMUM),
    ("exclusiveMinimum", &validation::EXCLUSIVE_MINIMUM),
    ("maxLength", &validation::MAX_LENGTH),
    ("minLength", &validation::MIN_LENGTH),
    ("pattern", &validation::PATTERN),
    ("maxItems", &validation::MAX_ITEMS),
    ("minItems", &validation::MIN_ITEMS),
    ("uniqueItems", &validation::UNIQUE_ITEMS),
    ("maxContains", &validation::MAX_CONTAINS),
    ("minContains", &validation::MIN_CONTAINS),
    ("maxProperties", &validation::MAX_PROPERTIES),
    ("minProperties", &validation::MIN_PROPERTIES),
    ("required", &validation::REQUIRED),
    ("dependentRequired", &validation::DEPENDENT_REQUIRED),
];

static FORMAT: KeywordTable = &[("format", &format::FORMAT)];

static CONTENT: KeywordTable = &[
    ("contentEncoding", &annotation::ANNOTATION),
    ("contentMediaType", &annotation::ANNOTATION),
    ("contentSchema", &annotation::CONTENT_SCHEMA),
];

static META_DATA: KeywordTable = &[
    ("title", &annotation::ANNOTATION),
    ("description", &annotation::ANNOTATION),
    ("default", &annotation::ANNOTATION),
    ("deprecated", &annotation::ANNOTATION),
    ("readOnly", &annotation::ANNOTATION),
    ("writeOnly", &annotation::ANNOTATION),
    ("examples", &annotation::ANNOTATION),
];

static OPENAPI_BASE: KeywordTable = &[
    ("discriminator", &annotation::ANNOTATION),
    ("xml", &annotation::ANNOTATION),
    ("externalDocs", &annotation::ANNOTATION),
    ("example", &annotation::ANNOTATION),
];

static DRAFT_7_KEYWORDS: KeywordTable = &[
    ("$schema", &core::SCHEMA),
    ("$id", &core::LEGACY_ID),
    ("$ref", &core::REF),
    ("$comment", &core::COMMENT),
    ("definitions", &core::DEFS),
    ("allOf", &applicator::ALL_OF),
    ("anyOf", &applicator::ANY_OF),
    ("oneOf", &applicator::ONE_OF),
    ("not", &applicator::NOT),
    ("if", &applicator::IF),
    ("then", &applicator::THEN),
    ("else", &applicator::ELSE),
    ("items", &legacy::LEGACY_ITEMS),
    ("additionalItems", &legacy::ADDITIONAL_ITEMS),
    ("contains", &array::CONTAINS),
    ("properties", &object::PROPERTIES),
    ("patternProperties", &object::PATTERN_PROPERTIES),
    ("additionalProperties", &object::ADDITIONAL_PROPERTIES),
    ("propertyNames", &object::PROPERTY_NAMES),
    ("dependencies", &legacy::DEPENDENCIES),
    ("type", &validation::TYPE),
    ("enum", &validation::ENUM),
    ("const", &validation::CONST),
    ("multipleOf", &validation::MULTIPLE_OF),
    ("maximum", &validation::MAXIMUM),
    ("exclusiveMaximum", &validation::EXCLUSIVE_MAXIMUM),
    ("minimum", &validation::MINIMUM),
    ("exclusiveMinimum", &validation::EXCLUSIVE_MINIMUM),
    ("maxLength", &validation::MAX_LENGTH),
    ("minLength", &validation::MIN_LENGTH),
    ("pattern", &validation::PATTERN),
    ("maxItems", &validation::MAX_ITEMS),
    ("minItems", &validation::MIN_ITEMS),
    ("uniqueItems", &validation::UNIQUE_ITEMS),
    ("maxProperties", &validation::MAX_PROPERTIES),
    ("minProperties", &validation::MIN_PROPERTIES),
    ("required", &validation::REQUIRED),
    ("format", &format::FORMAT),
    ("contentEncoding", &annotation::ANNOTATION),
    ("contentMediaType", &annotation::ANNOTATION),
    ("title", &annotation::ANNOTATION),
    ("description", &annotation::ANNOTATION),
    ("default", &annotation::ANNOTATION),
    ("examples", &annotation::ANNOTATION),
    ("readOnly", &annotation::ANNOTATION),
    ("writeOnly", &annotation::ANNOTATION),
];

static DRAFT_4_KEYWORDS: KeywordTable = &[
    ("$schema", &core::SCHEMA),
    ("id", &core::LEGACY_ID),
    ("$ref", &core::REF),
    ("definitions", &core::DEFS),
    ("allOf", &applicator::ALL_OF),
    ("anyOf", &applicator::ANY_OF),
    ("oneOf", &applicator::ONE_OF),
    ("not", &applicator::NOT),
    ("items", &legacy::LEGACY_ITEMS),
    ("additionalItems", &legacy::ADDITIONAL_ITEMS),
    ("properties", &object::PROPERTIES),
    ("patternProperties", &object::PATTERN_PROPERTIES),
    ("additionalProperties", &object::ADDITIONAL_PROPERTIES),
    ("dependencies", &legacy::DEPENDENCIES),
    ("type", &validation::TYPE),
    ("enum", &validation::ENUM),
    ("multipleOf", &validation::MULTIPLE_OF),
    ("maximum", &legacy::MAXIMUM_DRAFT4),
    ("exclusiveMaximum", &legacy::EXCLUSIVE_MAXIMUM_DRAFT4),
    ("minimum", &legacy::MINIMUM_DRAFT4),
    ("exclusiveMinimum", &legacy::EXCLUSIVE_MINIMUM_DRAFT4),
    ("maxLength", &validation::MAX_LENGTH),
    ("minLength", &validation::MIN_LENGTH),
    ("pattern", &validation::PATTERN),
    ("maxItems", &validation::MAX_ITEMS),
    ("minItems", &validation::MIN_ITEMS),
    ("uniqueItems", &validation::UNIQUE_ITEMS),
    ("maxProperties", &validation::MAX_PROPERTIES),
    ("minProperties", &validation::MIN_PROPERTIES),
    ("required", &validation::REQUIRED),
    ("format", &format::FORMAT),
    ("title", &annotation::ANNOTATION),
    ("description", &annotation::ANNOTATION),
    ("default", &annotation::ANNOTATION),
];

const DRAFT_2020_12_VOCABULARIES: &[&str] = &[
    "https://json-schema.org/draft/2020-12/vocab/core",
    "https://json-schema.org/draft/2020-12/vocab/applicator",
    "https://json-schema.org/draft/2020-12/vocab/unevaluated",
    "https://json-schema.org/draft/2020-12/vocab/validation",
    "https://json-schema.org/draft/2020-12/vocab/meta-data",
    "https://json-schema.org/draft/2020-12/vocab/format-annotation",
    "https://json-schema.org/draft/2020-12/vocab/content",
];

pub(crate) fn draft202012() -> Dialect {
    let mut dialect = Dialect::from_tables(
        DRAFT_2020_12,
        &[
            CORE, APPLICATOR, UNEVALUATED, VALIDATION, FORMAT, CONTENT, META_DATA,
        ],
        false,
    );
    dialect.vocabularies = DRAFT_2020_12_VOCABULARIES
        .iter()
        .map(|uri| ((*uri).to_string(), true))
        .collect();
    dialect
}

pub(crate) fn draft7() -> Dialect {
    Dialect::from_tables(DRAFT_7, &[DRAFT_7_KEYWORDS], true)
}

pub(crate) fn draft4() -> Dialect {
    Dialect::from_tables(DRAFT_4, &[DRAFT_4_KEYWORDS], true)
}

pub(crate) fn openapi31() -> Dialect {
    let mut dialect = Dialect::from_tables(
        OPENAPI_3_1,
        &[
            CORE, APPLICATOR, UNEVALUATED, VALIDATION, FORMAT, CONTENT, META_DATA, OPENAPI_BASE,
        ],
        false,
    );
    dialect.vocabularies = DRAFT_2020_12_VOCABULARIES
        .iter()
        .map(|uri| ((*uri).to_string(), true))
        .chain(std::iter::once((
            "https://spec.openapis.org/oas/3.1/vocab/base".to_string(),
            false,
        )))
        .collect();
    dialect
}

/// Build a dialect from a meta-schema document, honoring its `$vocabulary`.
///
/// The core vocabulary is not required to be listed; an unknown vocabulary
/// marked required fails with [`SchemaError::UnknownVocabulary`].
pub(crate) fn from_meta(document: &Value) -> Result<Dialect, SchemaError> {
    let Value::Object(schema) = document else {
        return Err(SchemaError::not_a_schema(""));
    };
    let Some(uri) = schema.get("$id").and_then(Value::as_str) else {
        return Err(SchemaError::invalid_keyword(
            "$id",
            "",
            "an absolute URI identifying the dialect",
        ));
    };
    let vocabularies: Vec<(String, bool)> = match schema.get("$vocabulary") {
        Some(Value::Object(entries)) => {
            let mut vocabularies = Vec::with_capacity(entries.len());
            for (vocabulary, required) in entries {
                let Some(required) = required.as_bool() else {
                    return Err(SchemaError::invalid_keyword(
                        "$vocabulary",
                        "/$vocabulary",
                        "an object mapping vocabulary URIs to booleans",
                    ));
                };
                vocabularies.push((vocabulary.clone(), required));
            }
            vocabularies
        }
        Some(_) => {
            return Err(SchemaError::invalid_keyword(
                "$vocabulary",
                "/$vocabulary",
                "an object mapping vocabulary URIs to booleans",
            ));
        }
        // Without `$vocabulary` the meta-schema inherits the full 2020-12
        // keyword set.
        None => DRAFT_2020_12_VOCABULARIES
            .iter()
            .map(|uri| ((*uri).to_string(), true))
            .collect(),
    };
    let mut tables = Vec::with_capacity(vocabularies.len());
    let mut assert_formats = false;
    for (vocabulary, required) in &vocabularies {
        match Vocabulary::from_uri(vocabulary) {
            Some(known) => {
                if known == Vocabulary::FormatAssertion {
                    assert_formats = true;
                }
                tables.push(known.keywords());
            }
            None if *required => {
                return Err(SchemaError::unknown_vocabulary(vocabulary.clone()));
            }
            None => {}
        }
    }
    let mut dialect = Dialect::from_tables(uri, &tables, assert_formats);
    dialect.vocabularies = vocabularies;
    Ok(dialect)
}

#[cfg(test)]
mod tests {
    use super::{draft202012, draft4, from_meta, Vocabulary};
    use serde_json::json;

    #[test]
    fn unknown_keys_become_annotations() {
        let dialect = draft202012();
        assert_eq!(dialect.keyword_for("fooBar").name, "annotation");
        assert_eq!(dialect.keyword_for("items").name, "items");
    }

    #[test]
    fn draft4_uses_boolean_exclusive_bounds() {
        let dialect = draft4();
        assert_eq!(dialect.keyword_for("$anchor").name, "annotation");
        assert_eq!(dialect.keyword_for("id").name, "$id");
    }

    #[test]
    fn meta_dialects_compose_known_vocabularies() {
        let dialect = from_meta(&json!({
            "$id": "https://example.com/dialect",
            "$vocabulary": {
                "https://json-schema.org/draft/2020-12/vocab/core": true,
                "https://json-schema.org/draft/2020-12/vocab/validation": true,
                "https://example.com/vocab/unknown": false
            }
        }))
        .expect("Valid dialect");
        assert!(dialect.keywords.contains_key("type"));
        assert!(!dialect.keywords.contains_key("properties"));
        assert_eq!(dialect.vocabularies.len(), 3);
    }

    #[test]
    fn required_unknown_vocabularies_fail() {
        let error = from_meta(&json!({
            "$id": "https://example.com/dialect",
            "$vocabulary": { "https://example.com/vocab/unknown": true }
        }))
        .expect_err("Should fail");
        assert_eq!(
            error.to_string(),
            "Vocabulary 'https://example.com/vocab/unknown' is required but not known to this implementation"
        );
    }

    #[test]
    fn format_assertion_vocabulary_asserts() {
        let dialect = from_meta(&json!({
            "$id": "https://example.com/dialect",
            "$vocabulary": {
                "https://json-schema.org/draft/2020-12/vocab/core": true,
                "https://json-schema.org/draft/2020-12/vocab/format-assertion": true
            }
        }))
        .expect("Valid dialect");
        assert!(dialect.assert_formats);
        assert_eq!(
            Vocabulary::from_uri("https://json-schema.org/draft/2020-12/vocab/format-assertion"),
            Some(Vocabulary::FormatAssertion)
        );
    }
}
