//! Thin wrappers around `fluent-uri` for base-URI resolution.
use fluent_uri::{Uri, UriRef};
use once_cell::sync::Lazy;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::SchemaError;

/// The synthetic base used for documents without an absolute identifier.
///
/// Locations under this base are internal: they never appear in
/// `absoluteKeywordLocation`.
pub(crate) static DEFAULT_BASE: Lazy<Uri<String>> =
    Lazy::new(|| Uri::parse("conforma:///".to_string()).expect("Is a valid URI"));

pub(crate) fn is_internal(uri: &Uri<String>) -> bool {
    uri.scheme().as_str() == DEFAULT_BASE.scheme().as_str()
}

/// Parse an absolute URI, resolving relative references against the
/// synthetic default base.
pub(crate) fn from_str(uri: &str) -> Result<Uri<String>, SchemaError> {
    let uriref = UriRef::parse(uri)?.normalize();
    if uriref.has_scheme() {
        Ok(Uri::try_from(uriref.as_str())?.into())
    } else {
        Ok(uriref.resolve_against(&DEFAULT_BASE.borrow())?)
    }
}

/// Resolve a URI reference against an absolute base.
pub(crate) fn resolve_against(base: &Uri<String>, reference: &str) -> Result<Uri<String>, SchemaError> {
    Ok(UriRef::parse(reference)?
        .resolve_against(&base.borrow())?
        .normalize())
}

/// Split a reference into its base part and optional fragment.
///
/// The fragment comes back percent-decoded so JSON Pointer fragments can be
/// walked directly.
pub(crate) fn split_fragment(reference: &str) -> (&str, Option<String>) {
    match reference.split_once('#') {
        Some((base, fragment)) => {
            let fragment = percent_decode_str(fragment)
                .decode_utf8()
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| fragment.to_string());
            (base, Some(fragment))
        }
        None => (reference, None),
    }
}

// RFC 3986 `fragment` charset, minus nothing: everything outside it is escaped.
const FRAGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'%')
    .add(b'{')
    .add(b'}')
    .add(b'\\')
    .add(b'^')
    .add(b'|');

/// Render `{base}#{pointer}` with the pointer percent-encoded as a fragment.
pub(crate) fn with_fragment(base: &Uri<String>, pointer: &str) -> String {
    let mut out = String::with_capacity(base.as_str().len() + pointer.len() + 1);
    out.push_str(base.as_str());
    out.push('#');
    for part in utf8_percent_encode(pointer, FRAGMENT) {
        out.push_str(part);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{from_str, resolve_against, split_fragment, with_fragment, DEFAULT_BASE};

    #[test]
    fn relative_uris_resolve_against_the_default_base() {
        let uri = from_str("folder/schema.json").expect("Invalid URI");
        assert_eq!(uri.as_str(), "conforma:///folder/schema.json");
    }

    #[test]
    fn resolution_follows_rfc_3986() {
        let base = from_str("https://example.com/a/b/schema.json").expect("Invalid URI");
        let resolved = resolve_against(&base, "../other.json").expect("Invalid reference");
        assert_eq!(resolved.as_str(), "https://example.com/a/other.json");
    }

    #[test]
    fn splits_and_decodes_fragments() {
        assert_eq!(split_fragment("schema.json"), ("schema.json", None));
        assert_eq!(
            split_fragment("schema.json#/a%20b"),
            ("schema.json", Some("/a b".to_string()))
        );
        assert_eq!(split_fragment("#node"), ("", Some("node".to_string())));
    }

    #[test]
    fn renders_fragments_escaped() {
        let base = from_str("https://example.com/schema").expect("Invalid URI");
        assert_eq!(
            with_fragment(&base, "/properties/a b"),
            "https://example.com/schema#/properties/a%20b"
        );
        assert!(super::is_internal(&DEFAULT_BASE));
    }
}
