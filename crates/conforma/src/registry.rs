//! The resource registry: schema records, canonical URIs, anchors and the
//! pending-reference queue.
//!
//! Schemas reference one another arbitrarily, including through cycles, so
//! nothing here owns a pointer to another node. Every schema node is
//! identified by a [`SchemaAddr`] — the document it lives in plus the JSON
//! Pointer to it — and every cross-schema edge is indirected through the
//! registry.
use std::sync::Arc;

use ahash::AHashMap;
use fluent_uri::Uri;
use serde_json::Value;

use crate::{
    dialect::Dialect,
    error::SchemaError,
    keyword::ProgramEntry,
    paths::{self, Chunk},
};

pub(crate) type DocId = usize;

/// The identity of one schema node: a document and a pointer into it.
///
/// Two distinct nodes with equal contents have distinct addresses, which is
/// what makes them distinct schemas owning distinct resources.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct SchemaAddr {
    pub(crate) doc: DocId,
    pub(crate) ptr: String,
}

impl SchemaAddr {
    pub(crate) fn root(doc: DocId) -> SchemaAddr {
        SchemaAddr {
            doc,
            ptr: String::new(),
        }
    }

    pub(crate) fn child(&self, chunk: Chunk<'_>) -> SchemaAddr {
        SchemaAddr {
            doc: self.doc,
            ptr: paths::join(&self.ptr, chunk),
        }
    }

    pub(crate) fn parent(&self) -> Option<SchemaAddr> {
        let cut = self.ptr.rfind('/')?;
        Some(SchemaAddr {
            doc: self.doc,
            ptr: self.ptr[..cut].to_string(),
        })
    }

    /// The address a pointer fragment reaches from this node.
    pub(crate) fn join_pointer(&self, pointer: &str) -> SchemaAddr {
        SchemaAddr {
            doc: self.doc,
            ptr: format!("{}{}", self.ptr, pointer),
        }
    }
}

/// The kind tag of a reference edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum RefKind {
    Ref,
    DynamicRef,
}

/// A resolved reference edge from a referring schema node.
#[derive(Debug, Clone)]
pub(crate) struct Reference {
    /// The absolute URI the reference resolved to, as registered.
    pub(crate) uri: String,
    /// The target node; bound by the resolution pass.
    pub(crate) target: SchemaAddr,
    /// A retained plain-name fragment, used by `$dynamicRef` scope lookup.
    pub(crate) anchor: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct PendingReference {
    pub(crate) from: SchemaAddr,
    pub(crate) kind: RefKind,
    /// Absolute URI of the referenced resource, without the fragment.
    pub(crate) base: String,
    /// Percent-decoded fragment, if any.
    pub(crate) fragment: Option<String>,
    /// The reference as written, for error reporting.
    pub(crate) written: String,
}

/// The record attached to one object-valued schema node.
#[derive(Debug, Clone)]
pub(crate) struct SchemaRecord {
    /// Base URI used to resolve relative references within this subtree.
    pub(crate) base_uri: Arc<Uri<String>>,
    /// Canonical URI, set by the first `$id` if it resolved to one.
    pub(crate) canonical_uri: Option<Arc<Uri<String>>>,
    pub(crate) dialect: Arc<Dialect>,
    /// The sorted keyword program computed at parse time.
    pub(crate) program: Arc<[ProgramEntry]>,
    /// The resource root this node belongs to (itself, when it carries `$id`
    /// or is a document root).
    pub(crate) root: SchemaAddr,
}

#[derive(Debug, Clone)]
pub(crate) struct AnchorEntry {
    pub(crate) addr: SchemaAddr,
    pub(crate) dynamic: bool,
}

/// Registry of parsed schema resources within one context.
#[derive(Debug, Clone, Default)]
pub(crate) struct Registry {
    documents: Vec<Arc<Value>>,
    records: AHashMap<SchemaAddr, SchemaRecord>,
    by_uri: AHashMap<String, SchemaAddr>,
    anchors: AHashMap<(SchemaAddr, String), AnchorEntry>,
    references: AHashMap<(SchemaAddr, RefKind), Reference>,
    pending: Vec<PendingReference>,
}

impl Registry {
    pub(crate) fn add_document(&mut self, document: Arc<Value>) -> DocId {
        self.documents.push(document);
        self.documents.len() - 1
    }

    pub(crate) fn document(&self, doc: DocId) -> &Arc<Value> {
        &self.documents[doc]
    }

    /// The value a node address points at, if it exists.
    pub(crate) fn value_at(&self, addr: &SchemaAddr) -> Option<&Value> {
        self.documents
            .get(addr.doc)
            .and_then(|document| document.pointer(&addr.ptr))
    }

    pub(crate) fn register(&mut self, addr: SchemaAddr, record: SchemaRecord) {
        self.records.insert(addr, record);
    }

    pub(crate) fn is_registered(&self, addr: &SchemaAddr) -> bool {
        self.records.contains_key(addr)
    }

    pub(crate) fn lookup_by_node(&self, addr: &SchemaAddr) -> Result<&SchemaRecord, SchemaError> {
        self.records
            .get(addr)
            .ok_or_else(|| SchemaError::uninitialized(&addr.ptr))
    }

    pub(crate) fn record_mut(&mut self, addr: &SchemaAddr) -> Option<&mut SchemaRecord> {
        self.records.get_mut(addr)
    }

    /// Index a resource root under its canonical URI.
    pub(crate) fn set_canonical(&mut self, uri: &str, root: SchemaAddr) {
        self.by_uri
            .entry(uri.trim_end_matches('#').to_string())
            .or_insert(root);
    }

    pub(crate) fn lookup_by_uri(&self, uri: &str) -> Option<&SchemaAddr> {
        self.by_uri.get(uri.trim_end_matches('#'))
    }

    /// Bind a plain-name fragment within a resource to a node.
    pub(crate) fn set_anchor(
        &mut self,
        root: SchemaAddr,
        name: impl Into<String>,
        addr: SchemaAddr,
        dynamic: bool,
    ) {
        self.anchors
            .insert((root, name.into()), AnchorEntry { addr, dynamic });
    }

    pub(crate) fn anchor(&self, root: &SchemaAddr, name: &str) -> Option<&AnchorEntry> {
        self.anchors.get(&(root.clone(), name.to_string()))
    }

    /// The node bound to `name` as a `$dynamicAnchor` within the resource
    /// rooted at `root`, if any.
    pub(crate) fn dynamic_anchor(&self, root: &SchemaAddr, name: &str) -> Option<&SchemaAddr> {
        self.anchor(root, name)
            .filter(|entry| entry.dynamic)
            .map(|entry| &entry.addr)
    }

    /// Enqueue a reference for the post-parse resolution pass.
    pub(crate) fn register_reference(&mut self, pending: PendingReference) {
        self.pending.push(pending);
    }

    pub(crate) fn take_pending(&mut self) -> Vec<PendingReference> {
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn bind_reference(&mut self, from: SchemaAddr, kind: RefKind, reference: Reference) {
        self.references.insert((from, kind), reference);
    }

    pub(crate) fn reference(&self, from: &SchemaAddr, kind: RefKind) -> Option<&Reference> {
        self.references.get(&(from.clone(), kind))
    }

    /// The nearest registered record at or above the address, with its own
    /// address.
    pub(crate) fn enclosing_record(
        &self,
        addr: &SchemaAddr,
    ) -> Option<(SchemaAddr, &SchemaRecord)> {
        let mut current = addr.clone();
        loop {
            if let Some(record) = self.records.get(&current) {
                return Some((current, record));
            }
            current = current.parent()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Registry, SchemaAddr};
    use crate::paths::Chunk;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn addresses_identify_nodes_not_contents() {
        let first = SchemaAddr::root(0).child(Chunk::Key("a"));
        let second = SchemaAddr::root(0).child(Chunk::Key("b"));
        assert_ne!(first, second);
        assert_eq!(first.parent(), Some(SchemaAddr::root(0)));
        assert_eq!(SchemaAddr::root(0).parent(), None);
    }

    #[test]
    fn values_resolve_through_escaped_pointers() {
        let mut registry = Registry::default();
        let doc = registry.add_document(Arc::new(json!({"a/b": {"c": 1}})));
        let addr = SchemaAddr::root(doc)
            .child(Chunk::Key("a/b"))
            .child(Chunk::Key("c"));
        assert_eq!(registry.value_at(&addr), Some(&json!(1)));
        assert_eq!(registry.value_at(&addr.child(Chunk::Key("d"))), None);
    }

    #[test]
    fn canonical_uris_keep_the_first_binding() {
        let mut registry = Registry::default();
        registry.set_canonical("https://example.com/s", SchemaAddr::root(0));
        registry.set_canonical("https://example.com/s#", SchemaAddr::root(1));
        assert_eq!(
            registry.lookup_by_uri("https://example.com/s#"),
            Some(&SchemaAddr::root(0))
        );
    }
}
