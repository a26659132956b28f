//! The evaluation stack driving schema validation.
//!
//! Frames mirror the dynamic call tree: one frame per schema node or keyword
//! being evaluated, each owning the output unit its results accumulate into.
//! Frames are pushed and popped around every sub-evaluation, so the output
//! tree always mirrors the stack.
use std::sync::Arc;

use serde_json::Value;

use crate::{
    context::ContextInner,
    output::{Checkpoint, OutputUnit},
    paths::{self, Chunk},
    registry::SchemaAddr,
    uri,
    validator::validate_node,
};

pub(crate) struct Frame {
    keyword_location: String,
    instance_location: String,
    addr: SchemaAddr,
    /// The root of the resource this node belongs to; drives dynamic-scope
    /// anchor lookup and absolute keyword locations.
    resource_root: SchemaAddr,
    output: Option<OutputUnit>,
}

pub(crate) struct EvalScope<'c> {
    pub(crate) ctx: &'c ContextInner,
    frames: Vec<Frame>,
}

impl<'c> EvalScope<'c> {
    pub(crate) fn new(ctx: &'c ContextInner, root: SchemaAddr) -> EvalScope<'c> {
        let mut scope = EvalScope {
            ctx,
            frames: Vec::with_capacity(16),
        };
        scope.push(None, root, None);
        scope
    }

    /// Take the root output; the scope is done.
    pub(crate) fn finish(mut self) -> OutputUnit {
        let mut root = self.frames.pop().expect("Root frame is always present");
        root.output.take().expect("Root output is always present")
    }

    fn resource_root_for(&self, addr: &SchemaAddr) -> SchemaAddr {
        if let Ok(record) = self.ctx.registry.lookup_by_node(addr) {
            return record.root.clone();
        }
        self.frames
            .last()
            .map(|frame| frame.resource_root.clone())
            .unwrap_or_else(|| addr.clone())
    }

    fn absolute_location(&self, addr: &SchemaAddr, resource_root: &SchemaAddr) -> Option<String> {
        let record = self.ctx.registry.lookup_by_node(resource_root).ok()?;
        let base = record.canonical_uri.as_ref().unwrap_or(&record.base_uri);
        if uri::is_internal(base) {
            return None;
        }
        let relative = addr.ptr.strip_prefix(resource_root.ptr.as_str())?;
        Some(uri::with_fragment(base, relative))
    }

    /// Push a frame for a sub-evaluation.
    ///
    /// `schema_chunk` extends the keyword location; `None` keeps it, which is
    /// how reference jumps continue the program path while switching nodes.
    pub(crate) fn push(
        &mut self,
        schema_chunk: Option<Chunk<'_>>,
        addr: SchemaAddr,
        instance_chunk: Option<Chunk<'_>>,
    ) {
        let (keyword_location, instance_location) = match self.frames.last() {
            Some(parent) => (
                match schema_chunk {
                    Some(chunk) => paths::join(&parent.keyword_location, chunk),
                    None => parent.keyword_location.clone(),
                },
                match instance_chunk {
                    Some(chunk) => paths::join(&parent.instance_location, chunk),
                    None => parent.instance_location.clone(),
                },
            ),
            None => (String::new(), String::new()),
        };
        let resource_root = self.resource_root_for(&addr);
        let absolute = self.absolute_location(&addr, &resource_root);
        let output = OutputUnit::new(keyword_location.clone(), absolute, instance_location.clone());
        self.frames.push(Frame {
            keyword_location,
            instance_location,
            addr,
            resource_root,
            output: Some(output),
        });
    }

    /// Pop the current frame and attach its output to the nearest enclosing
    /// frame that owns one.
    pub(crate) fn pop_emit(&mut self) {
        let mut frame = self.frames.pop().expect("Unbalanced frame pop");
        if let Some(child) = frame.output.take() {
            if let Some(parent) = self
                .frames
                .iter_mut()
                .rev()
                .find_map(|frame| frame.output.as_mut())
            {
                parent.emit(child);
            }
        }
    }

    fn current(&self) -> &Frame {
        self.frames.last().expect("At least one frame is present")
    }

    pub(crate) fn addr(&self) -> &SchemaAddr {
        &self.current().addr
    }

    /// The schema-object frame below the current keyword frame.
    pub(crate) fn parent_addr(&self) -> &SchemaAddr {
        &self.frames[self.frames.len() - 2].addr
    }

    pub(crate) fn output(&self) -> &OutputUnit {
        self.current().output.as_ref().expect("Frame owns output")
    }

    pub(crate) fn output_mut(&mut self) -> &mut OutputUnit {
        self.frames
            .last_mut()
            .expect("At least one frame is present")
            .output
            .as_mut()
            .expect("Frame owns output")
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        self.output().checkpoint()
    }

    pub(crate) fn restore(&mut self, checkpoint: &Checkpoint) {
        self.output_mut().restore(checkpoint);
    }

    /// Apply a subschema in a fresh frame; reports whether it validated.
    pub(crate) fn apply(
        &mut self,
        schema_chunk: Option<Chunk<'_>>,
        addr: SchemaAddr,
        node: &Value,
        instance_chunk: Option<Chunk<'_>>,
        instance: &Value,
    ) -> bool {
        self.push(schema_chunk, addr, instance_chunk);
        validate_node(self, node, instance);
        let valid = self.output().valid();
        self.pop_emit();
        valid
    }

    /// Apply the schema that *is* the current keyword value, in the current
    /// frame.
    pub(crate) fn apply_in_place(&mut self, node: &Value, instance: &Value) -> bool {
        validate_node(self, node, instance);
        self.output().valid()
    }

    /// Whether a reference jump to `addr` at the current instance location is
    /// already on the stack. Breaks reference cycles that make no progress
    /// through the instance.
    pub(crate) fn is_active(&self, addr: &SchemaAddr) -> bool {
        let instance_location = &self.current().instance_location;
        self.frames
            .iter()
            .any(|frame| frame.addr == *addr && frame.instance_location == *instance_location)
    }

    /// The annotation attached by an adjacent keyword, if it produced one.
    pub(crate) fn sibling_annotation(&self, name: &str) -> Option<Value> {
        let parent = &self.frames[self.frames.len() - 2];
        let location = paths::join(&parent.keyword_location, Chunk::Key(name));
        parent
            .output
            .as_ref()?
            .annotations()
            .iter()
            .find(|unit| unit.keyword_location() == location)
            .and_then(|unit| unit.annotation().cloned())
    }

    /// Every annotation in the dynamic scope attached by one of `names` at
    /// the current instance location. This aggregates across `allOf`,
    /// `anyOf`, `$ref` and the rest, wherever they validated successfully.
    pub(crate) fn dynamic_annotations(&self, names: &[&str]) -> Vec<Value> {
        fn collect(
            unit: &OutputUnit,
            instance_location: &str,
            names: &[&str],
            into: &mut Vec<Value>,
        ) {
            if unit.instance_location() == instance_location {
                if let Some(annotation) = unit.annotation() {
                    if paths::last_segment(unit.keyword_location())
                        .map_or(false, |segment| names.contains(&segment.as_str()))
                    {
                        into.push(annotation.clone());
                    }
                }
            }
            for child in unit.annotations() {
                collect(child, instance_location, names, into);
            }
        }

        let instance_location = self.current().instance_location.clone();
        let mut found = Vec::new();
        for frame in &self.frames {
            if let Some(output) = &frame.output {
                collect(output, &instance_location, names, &mut found);
            }
        }
        found
    }

    /// The node bound to the outermost `$dynamicAnchor` with this name in the
    /// dynamic scope, walking resources from the root frame inwards.
    pub(crate) fn outermost_dynamic_anchor(&self, name: &str) -> Option<SchemaAddr> {
        let mut previous: Option<&SchemaAddr> = None;
        for frame in &self.frames {
            if previous == Some(&frame.resource_root) {
                continue;
            }
            previous = Some(&frame.resource_root);
            if let Some(addr) = self.ctx.registry.dynamic_anchor(&frame.resource_root, name) {
                return Some(addr.clone());
            }
        }
        None
    }

    /// The resolved reference registered for the current schema object.
    pub(crate) fn reference(
        &self,
        kind: crate::registry::RefKind,
    ) -> Option<&'c crate::registry::Reference> {
        let ctx = self.ctx;
        ctx.registry.reference(self.parent_addr(), kind)
    }

    /// A compiled pattern from the context cache. Parsing compiled every
    /// pattern the schema mentions, so this only misses on internal misuse.
    pub(crate) fn pattern(&self, pattern: &str) -> Option<&'c Arc<fancy_regex::Regex>> {
        let ctx = self.ctx;
        ctx.pattern(pattern)
    }

    /// Whether the dialect governing the current schema object treats
    /// `format` as an assertion.
    pub(crate) fn assert_formats(&self) -> bool {
        self.ctx
            .registry
            .lookup_by_node(self.parent_addr())
            .map_or(false, |record| record.dialect.assert_formats)
    }

    /// Look up a format check, composing context, dialect and builtin
    /// registries with the context taking precedence.
    pub(crate) fn format_check(&self, name: &str) -> Option<crate::formats::FormatCheck<'c>> {
        let ctx = self.ctx;
        let dialect = ctx
            .registry
            .lookup_by_node(self.parent_addr())
            .ok()
            .map(|record| &record.dialect);
        ctx.format_check(name, dialect)
    }
}
