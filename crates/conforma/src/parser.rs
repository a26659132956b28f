//! The parse pipeline: walking a schema document, classifying and sorting
//! its keywords, and binding pending references once the walk is complete.
use std::sync::Arc;

use fluent_uri::Uri;
use serde_json::Value;

use crate::{
    context::ContextInner,
    dialect::Dialect,
    error::SchemaError,
    keyword::{sort_program, ProgramEntry},
    meta,
    paths::{self, Chunk},
    registry::{DocId, PendingReference, RefKind, Reference, SchemaAddr, SchemaRecord},
    uri,
};

/// Walk a whole document into the context's registry.
///
/// Does not resolve references; the caller runs [`resolve_pending`] once
/// every document of interest has been walked.
pub(crate) fn parse_document(
    ctx: &mut ContextInner,
    document: Arc<Value>,
    base_uri: Option<Uri<String>>,
) -> Result<SchemaAddr, SchemaError> {
    let doc = ctx.registry.add_document(Arc::clone(&document));
    let root = SchemaAddr::root(doc);
    let base = Arc::new(match base_uri {
        Some(base) => base,
        // Each document gets its own synthetic base so fragment-only
        // references cannot leak across documents sharing a context.
        None => uri::from_str(&format!("conforma:///{doc}"))?,
    });
    ctx.registry.set_canonical(base.as_str(), root.clone());
    let mut scope = ParseScope {
        ctx,
        doc,
        ptr: String::new(),
        base_stack: vec![(base, root.clone())],
        dialect_stack: Vec::new(),
    };
    scope.parse_schema(&document)?;
    Ok(root)
}

/// Parse and resolve in one step: the entry used by the public API.
pub(crate) fn parse_and_resolve(
    ctx: &mut ContextInner,
    document: Arc<Value>,
    base_uri: Option<Uri<String>>,
) -> Result<SchemaAddr, SchemaError> {
    let root = parse_document(ctx, document, base_uri)?;
    resolve_pending(ctx)?;
    Ok(root)
}

/// The state threaded through one document walk.
pub(crate) struct ParseScope<'a> {
    pub(crate) ctx: &'a mut ContextInner,
    doc: DocId,
    ptr: String,
    /// Stack of `(base URI, resource root)` pairs; `$id` pushes.
    base_stack: Vec<(Arc<Uri<String>>, SchemaAddr)>,
    /// Stack of dialects; `$schema` pushes.
    dialect_stack: Vec<Arc<Dialect>>,
}

impl<'a> ParseScope<'a> {
    /// The address of the node currently being parsed.
    pub(crate) fn addr(&self) -> SchemaAddr {
        SchemaAddr {
            doc: self.doc,
            ptr: self.ptr.clone(),
        }
    }

    /// The address of the schema object owning the current keyword.
    pub(crate) fn parent_addr(&self) -> SchemaAddr {
        self.addr().parent().unwrap_or_else(|| self.addr())
    }

    /// Pointer to the current node, for error messages.
    pub(crate) fn location(&self) -> &str {
        &self.ptr
    }

    pub(crate) fn base_uri(&self) -> &Arc<Uri<String>> {
        &self.base_stack.last().expect("Base stack is never empty").0
    }

    fn resource_root(&self) -> &SchemaAddr {
        &self.base_stack.last().expect("Base stack is never empty").1
    }

    pub(crate) fn dialect(&self) -> Arc<Dialect> {
        self.dialect_stack
            .last()
            .unwrap_or(&self.ctx.default_dialect)
            .clone()
    }

    /// Run `body` in a child frame bound to one segment; the frame is popped
    /// on every exit path.
    pub(crate) fn in_child<R>(
        &mut self,
        chunk: Chunk<'_>,
        body: impl FnOnce(&mut Self) -> Result<R, SchemaError>,
    ) -> Result<R, SchemaError> {
        let saved = self.ptr.len();
        paths::push_chunk(&mut self.ptr, chunk);
        let result = body(self);
        self.ptr.truncate(saved);
        result
    }

    /// Parse one schema node by the full pipeline.
    pub(crate) fn parse_schema(&mut self, node: &Value) -> Result<(), SchemaError> {
        let schema = match node {
            // Boolean schemas short-circuit; no resource is created.
            Value::Bool(_) => return Ok(()),
            Value::Object(schema) => schema,
            _ => return Err(SchemaError::not_a_schema(self.location())),
        };
        let addr = self.addr();
        if self.ctx.registry.is_registered(&addr) {
            return Ok(());
        }

        let base_depth = self.base_stack.len();
        let dialect_depth = self.dialect_stack.len();

        // Dialect dispatch: `$schema` must name a registered dialect.
        if let Some(declared) = schema.get("$schema") {
            let Value::String(declared) = declared else {
                return Err(SchemaError::invalid_keyword(
                    "$schema",
                    self.location(),
                    "a string holding a meta-schema URI",
                ));
            };
            let dialect = self
                .ctx
                .dialect(declared)
                .ok_or_else(|| SchemaError::unknown_dialect(declared.clone()))?;
            self.dialect_stack.push(dialect);
        }
        let dialect = self.dialect();

        // Compute and cache the sorted keyword program.
        let entries = schema
            .keys()
            .map(|key| ProgramEntry {
                key: key.clone(),
                keyword: dialect.keyword_for(key),
            })
            .collect();
        let entries = sort_program(entries)?;
        self.ctx.registry.register(
            addr,
            SchemaRecord {
                base_uri: Arc::clone(self.base_uri()),
                canonical_uri: None,
                dialect,
                program: entries.clone().into(),
                root: self.resource_root().clone(),
            },
        );

        // Dispatch each keyword's parse in program order.
        for entry in &entries {
            if let Some(value) = schema.get(&entry.key) {
                self.in_child(Chunk::Key(&entry.key), |scope| {
                    (entry.keyword.parse)(scope, value, schema)
                })?;
            }
        }

        self.base_stack.truncate(base_depth);
        self.dialect_stack.truncate(dialect_depth);
        Ok(())
    }

    /// `$id` side effects: the node becomes a resource root, its resolved URI
    /// becomes the canonical URI and the base for the subtree.
    pub(crate) fn declare_id(&mut self, resolved: Uri<String>) {
        let root = self.parent_addr();
        let base = Arc::new(resolved);
        self.ctx.registry.set_canonical(base.as_str(), root.clone());
        if let Some(record) = self.ctx.registry.record_mut(&root) {
            record.base_uri = Arc::clone(&base);
            record.canonical_uri = Some(Arc::clone(&base));
            record.root = root.clone();
        }
        self.base_stack.push((base, root));
    }

    /// Bind an anchor name in the enclosing resource to the current schema
    /// object.
    pub(crate) fn declare_anchor(&mut self, name: &str, dynamic: bool) {
        let root = self.resource_root().clone();
        let target = self.parent_addr();
        self.ctx.registry.set_anchor(root, name, target, dynamic);
    }

    /// Queue a reference for the post-walk resolution pass.
    pub(crate) fn enqueue_reference(
        &mut self,
        kind: RefKind,
        written: &str,
    ) -> Result<(), SchemaError> {
        let (base_part, fragment) = uri::split_fragment(written);
        let base = if base_part.is_empty() {
            self.base_uri().as_str().to_string()
        } else {
            uri::resolve_against(self.base_uri(), base_part)?
                .as_str()
                .to_string()
        };
        let fragment = fragment.filter(|fragment| !fragment.is_empty());
        self.ctx.registry.register_reference(PendingReference {
            from: self.parent_addr(),
            kind,
            base,
            fragment,
            written: written.to_string(),
        });
        Ok(())
    }

    /// Compile and memoize a pattern; invalid patterns fail the parse.
    pub(crate) fn pattern_for(&mut self, pattern: &str) -> Result<(), SchemaError> {
        self.ctx.pattern_for(pattern).map(|_| ())
    }
}

/// Bind every pending reference, fetching and walking unknown documents as
/// they surface. This is the only stage of a parse that can block on I/O.
pub(crate) fn resolve_pending(ctx: &mut ContextInner) -> Result<(), SchemaError> {
    loop {
        let pending = ctx.registry.take_pending();
        if pending.is_empty() {
            return Ok(());
        }
        for reference in pending {
            let root = match ctx.registry.lookup_by_uri(&reference.base) {
                Some(root) => root.clone(),
                None => load_external(ctx, &reference.base)?,
            };
            let target = match reference.fragment.as_deref() {
                None => root,
                Some(pointer) if pointer.starts_with('/') => {
                    let target = root.join_pointer(pointer);
                    if ctx.registry.value_at(&target).is_none() {
                        return Err(SchemaError::unresolved(&reference.written));
                    }
                    target
                }
                Some(name) => match ctx.registry.anchor(&root, name) {
                    Some(entry) => entry.addr.clone(),
                    None if name.contains('/') => {
                        return Err(SchemaError::invalid_anchor(name));
                    }
                    None => return Err(SchemaError::no_such_anchor(name)),
                },
            };
            ensure_parsed(ctx, &target)?;
            let uri = match &reference.fragment {
                Some(fragment) => format!("{}#{fragment}", reference.base),
                None => reference.base.clone(),
            };
            let anchor = reference
                .fragment
                .clone()
                .filter(|fragment| !fragment.starts_with('/'));
            ctx.registry.bind_reference(
                reference.from,
                reference.kind,
                Reference {
                    uri,
                    target,
                    anchor,
                },
            );
        }
    }
}

/// Bring an unknown base URI into the context: bundled meta-schemas first,
/// then the host retriever.
fn load_external(ctx: &mut ContextInner, base: &str) -> Result<SchemaAddr, SchemaError> {
    let parsed = uri::from_str(base)?;
    if let Some(document) = meta::find(base) {
        return parse_document(ctx, Arc::new(document.clone()), Some(parsed));
    }
    let retriever = Arc::clone(&ctx.retriever);
    let retrieved = retriever
        .retrieve(&parsed.borrow())
        .map_err(|error| SchemaError::unretrievable(base, Some(error)))?;
    parse_document(ctx, Arc::new(retrieved), Some(parsed))
}

/// Parse a reference target that sits outside any walked schema position.
fn ensure_parsed(ctx: &mut ContextInner, target: &SchemaAddr) -> Result<(), SchemaError> {
    if ctx.registry.is_registered(target) {
        return Ok(());
    }
    if let Some(Value::Bool(_)) = ctx.registry.value_at(target) {
        return Ok(());
    }
    let (_, record) = ctx
        .registry
        .enclosing_record(target)
        .ok_or_else(|| SchemaError::pointer_to_nowhere(&target.ptr))?;
    let base_uri = Arc::clone(&record.base_uri);
    let resource_root = record.root.clone();
    let dialect = Arc::clone(&record.dialect);
    let document = Arc::clone(ctx.registry.document(target.doc));
    let node = document
        .pointer(&target.ptr)
        .ok_or_else(|| SchemaError::pointer_to_nowhere(&target.ptr))?;
    let mut scope = ParseScope {
        ctx,
        doc: target.doc,
        ptr: target.ptr.clone(),
        base_stack: vec![(base_uri, resource_root)],
        dialect_stack: vec![dialect],
    };
    scope.parse_schema(node)
}
