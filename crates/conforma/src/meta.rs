//! Bundled standard meta-schema documents.
//!
//! References to the standard dialects resolve against these copies, so no
//! retriever is needed to validate ordinary schemas or to round-trip a
//! dialect's own meta-schema.
use once_cell::sync::Lazy;
use serde_json::Value;

macro_rules! schema {
    ($name:ident, $path:expr) => {
        static $name: Lazy<Value> = Lazy::new(|| {
            serde_json::from_slice(include_bytes!($path)).expect("Invalid bundled meta-schema")
        });
    };
}

schema!(DRAFT4, "../metaschemas/draft4.json");
schema!(DRAFT7, "../metaschemas/draft7.json");
schema!(DRAFT202012, "../metaschemas/draft2020-12/schema.json");
schema!(CORE, "../metaschemas/draft2020-12/meta/core.json");
schema!(APPLICATOR, "../metaschemas/draft2020-12/meta/applicator.json");
schema!(UNEVALUATED, "../metaschemas/draft2020-12/meta/unevaluated.json");
schema!(VALIDATION, "../metaschemas/draft2020-12/meta/validation.json");
schema!(META_DATA, "../metaschemas/draft2020-12/meta/meta-data.json");
schema!(
    FORMAT_ANNOTATION,
    "../metaschemas/draft2020-12/meta/format-annotation.json"
);
schema!(CONTENT, "../metaschemas/draft2020-12/meta/content.json");
schema!(OPENAPI, "../metaschemas/openapi-3.1/dialect-base.json");
schema!(OPENAPI_META, "../metaschemas/openapi-3.1/meta-base.json");

/// Look up a bundled document by its canonical URI.
pub(crate) fn find(uri: &str) -> Option<&'static Value> {
    Some(match uri.trim_end_matches('#') {
        "http://json-schema.org/draft-04/schema" => &DRAFT4,
        "http://json-schema.org/draft-07/schema" => &DRAFT7,
        "https://json-schema.org/draft/2020-12/schema" => &DRAFT202012,
        "https://json-schema.org/draft/2020-12/meta/core" => &CORE,
        "https://json-schema.org/draft/2020-12/meta/applicator" => &APPLICATOR,
        "https://json-schema.org/draft/2020-12/meta/unevaluated" => &UNEVALUATED,
        "https://json-schema.org/draft/2020-12/meta/validation" => &VALIDATION,
        "https://json-schema.org/draft/2020-12/meta/meta-data" => &META_DATA,
        "https://json-schema.org/draft/2020-12/meta/format-annotation" => &FORMAT_ANNOTATION,
        "https://json-schema.org/draft/2020-12/meta/content" => &CONTENT,
        "https://spec.openapis.org/oas/3.1/dialect/base" => &OPENAPI,
        "https://spec.openapis.org/oas/3.1/meta/base" => &OPENAPI_META,
        _ => return None,
    })
}
