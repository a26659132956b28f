//! Shared parse/validate state: dialect and format registries, the regex
//! cache and the resource registry.
use std::{fmt, sync::Arc};

use ahash::AHashMap;
use fancy_regex::Regex;
use fluent_uri::Uri;
use serde_json::Value;

use crate::{
    dialect::{self, Dialect},
    error::SchemaError,
    formats::{self, Format, FormatCheck},
    parser,
    registry::Registry,
    retrieve::{DefaultRetriever, Retrieve},
    uri,
    validator::Schema,
};

/// How `format` behaves in dialects where it is an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatMode {
    /// Formats never assert; they are annotations only.
    #[default]
    Off,
    /// Known formats assert; unknown names stay annotations.
    Known,
    /// Known formats assert and unknown names fail validation.
    Strict,
}

pub(crate) struct ContextInner {
    pub(crate) dialects: AHashMap<String, Arc<Dialect>>,
    pub(crate) default_dialect: Arc<Dialect>,
    pub(crate) formats: AHashMap<String, Arc<dyn Format>>,
    pub(crate) mode: FormatMode,
    pub(crate) patterns: AHashMap<String, Arc<Regex>>,
    pub(crate) registry: Registry,
    pub(crate) retriever: Arc<dyn Retrieve>,
    pub(crate) base_uri: Option<Uri<String>>,
}

impl Clone for ContextInner {
    fn clone(&self) -> Self {
        ContextInner {
            dialects: self.dialects.clone(),
            default_dialect: Arc::clone(&self.default_dialect),
            formats: self.formats.clone(),
            mode: self.mode,
            patterns: self.patterns.clone(),
            registry: self.registry.clone(),
            retriever: Arc::clone(&self.retriever),
            base_uri: self.base_uri.clone(),
        }
    }
}

impl fmt::Debug for ContextInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("default_dialect", &self.default_dialect.uri)
            .field("mode", &self.mode)
            .finish()
    }
}

impl ContextInner {
    pub(crate) fn dialect(&self, uri: &str) -> Option<Arc<Dialect>> {
        self.dialects.get(uri.trim_end_matches('#')).cloned()
    }

    /// Compile and memoize a Unicode regex; the cache is written during
    /// parse and only read during validation.
    pub(crate) fn pattern_for(&mut self, pattern: &str) -> Result<Arc<Regex>, SchemaError> {
        if let Some(compiled) = self.patterns.get(pattern) {
            return Ok(Arc::clone(compiled));
        }
        let compiled = Arc::new(
            Regex::new(pattern).map_err(|error| SchemaError::invalid_regex(pattern, error))?,
        );
        self.patterns
            .insert(pattern.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    pub(crate) fn pattern(&self, pattern: &str) -> Option<&Arc<Regex>> {
        self.patterns.get(pattern)
    }

    /// Resolve a format name: context formats shadow dialect formats, which
    /// shadow the builtin catalog.
    pub(crate) fn format_check<'a>(
        &'a self,
        name: &str,
        dialect: Option<&'a Arc<Dialect>>,
    ) -> Option<FormatCheck<'a>> {
        if let Some(custom) = self.formats.get(name) {
            return Some(FormatCheck::Custom(custom));
        }
        if let Some(custom) = dialect.and_then(|dialect| dialect.formats.get(name)) {
            return Some(FormatCheck::Custom(custom));
        }
        formats::builtin(name).map(FormatCheck::Builtin)
    }
}

/// Configuration for building a [`Context`].
#[derive(Clone)]
pub struct ContextOptions {
    base_uri: Option<String>,
    default_dialect: Option<String>,
    mode: FormatMode,
    formats: AHashMap<String, Arc<dyn Format>>,
    retriever: Arc<dyn Retrieve>,
}

impl Default for ContextOptions {
    fn default() -> Self {
        ContextOptions {
            base_uri: None,
            default_dialect: None,
            mode: FormatMode::default(),
            formats: AHashMap::new(),
            retriever: Arc::new(DefaultRetriever),
        }
    }
}

impl ContextOptions {
    #[must_use]
    pub fn new() -> ContextOptions {
        ContextOptions::default()
    }

    /// Base URI resolved against by schemas that do not declare their own.
    pub fn base_uri(&mut self, base_uri: impl Into<String>) -> &mut Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    /// Meta-schema URI of the dialect used when `$schema` is absent.
    pub fn default_dialect(&mut self, uri: impl Into<String>) -> &mut Self {
        self.default_dialect = Some(uri.into());
        self
    }

    /// How `format` behaves in annotation dialects.
    pub fn format_mode(&mut self, mode: FormatMode) -> &mut Self {
        self.mode = mode;
        self
    }

    /// Register an additional named format, shadowing dialect and builtin
    /// formats of the same name.
    ///
    /// ```rust
    /// let context = conforma::Context::options()
    ///     .format_mode(conforma::FormatMode::Known)
    ///     .format("even-length", |value: &str| value.len() % 2 == 0)
    ///     .build()
    ///     .expect("Valid options");
    /// ```
    pub fn format(&mut self, name: impl Into<String>, format: impl Format + 'static) -> &mut Self {
        self.formats.insert(name.into(), Arc::new(format));
        self
    }

    /// Retriever used for references to unknown external resources.
    pub fn retriever(&mut self, retriever: Arc<dyn Retrieve>) -> &mut Self {
        self.retriever = Arc::clone(&retriever);
        self
    }

    /// Build a [`Context`] from these options.
    ///
    /// # Errors
    ///
    /// Fails when the base URI does not parse or the default dialect is not
    /// a registered one.
    pub fn build(&self) -> Result<Context, SchemaError> {
        let mut dialects = AHashMap::new();
        for dialect in [
            dialect::draft202012(),
            dialect::draft7(),
            dialect::draft4(),
            dialect::openapi31(),
        ] {
            dialects.insert(dialect.uri.clone(), Arc::new(dialect));
        }
        let default_dialect = match &self.default_dialect {
            Some(uri) => dialects
                .get(uri.trim_end_matches('#'))
                .cloned()
                .ok_or_else(|| SchemaError::unknown_dialect(uri.clone()))?,
            None => dialects
                .get(dialect::DRAFT_2020_12)
                .cloned()
                .expect("Standard dialects are always registered"),
        };
        let base_uri = match &self.base_uri {
            Some(base_uri) => Some(uri::from_str(base_uri)?),
            None => None,
        };
        Ok(Context {
            inner: Arc::new(ContextInner {
                dialects,
                default_dialect,
                formats: self.formats.clone(),
                mode: self.mode,
                patterns: AHashMap::new(),
                registry: Registry::default(),
                retriever: Arc::clone(&self.retriever),
                base_uri,
            }),
        })
    }
}

/// Shared state across schemas: dialects, formats, the regex cache and the
/// resource registry.
///
/// A context is a cheap handle over immutable inner state. Each parse clones
/// that state, extends it and republishes it, so every [`Schema`] snapshots
/// the context as of its own parse: schemas parsed earlier stay valid and
/// later parses see every resource registered before them.
#[derive(Debug, Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Default for Context {
    fn default() -> Self {
        ContextOptions::new()
            .build()
            .expect("Default options are valid")
    }
}

impl Context {
    /// A context with default options.
    #[must_use]
    pub fn new() -> Context {
        Context::default()
    }

    /// Options for configuring a new [`Context`].
    #[must_use]
    pub fn options() -> ContextOptions {
        ContextOptions::new()
    }

    /// Parse a schema document into a reusable [`Schema`].
    ///
    /// Parsing registers resources, anchors and references, then binds every
    /// pending reference; unknown external resources are fetched through the
    /// configured retriever.
    ///
    /// # Errors
    ///
    /// Any malformed schema structure, unknown dialect, keyword dependency
    /// cycle or unresolvable reference fails the parse; no partial state
    /// becomes visible in the context.
    pub fn parse(&mut self, schema: &Value) -> Result<Schema, SchemaError> {
        let mut inner = (*self.inner).clone();
        let base_uri = inner.base_uri.clone();
        let root = parser::parse_and_resolve(&mut inner, Arc::new(schema.clone()), base_uri)?;
        let inner = Arc::new(inner);
        self.inner = Arc::clone(&inner);
        Ok(Schema::new(inner, root))
    }

    /// Parse a document as a dialect definition and register it.
    ///
    /// The document's `$id` names the dialect; `$vocabulary` selects the
    /// keyword sets it bundles. Schemas declaring it in `$schema` parse
    /// under the new dialect afterwards.
    ///
    /// # Errors
    ///
    /// Fails like [`Context::parse`], or with
    /// [`SchemaError::UnknownVocabulary`] when a required vocabulary is not
    /// known to this implementation.
    pub fn parse_dialect(&mut self, schema: &Value) -> Result<(), SchemaError> {
        let mut inner = (*self.inner).clone();
        let dialect = dialect::from_meta(schema)?;
        // Registered before the walk so the meta-schema may declare itself
        // in its own `$schema`.
        inner
            .dialects
            .insert(dialect.uri.clone(), Arc::new(dialect));
        parser::parse_and_resolve(&mut inner, Arc::new(schema.clone()), None)?;
        self.inner = Arc::new(inner);
        Ok(())
    }
}
