//! The validate pipeline and the parsed-schema handle.
use std::sync::Arc;

use serde_json::Value;

use crate::{
    context::ContextInner, evaluate::EvalScope, output::OutputUnit, paths::Chunk,
    registry::SchemaAddr,
};

/// Walk one schema node against an instance.
///
/// The caller has already pushed a frame for the node; every keyword of the
/// node's sorted program runs in a child frame of its own and emits into it.
pub(crate) fn validate_node(scope: &mut EvalScope<'_>, node: &Value, instance: &Value) {
    match node {
        Value::Bool(true) => {}
        Value::Bool(false) => scope.output_mut().fail("false schema is never valid"),
        Value::Object(schema) => {
            let ctx = scope.ctx;
            let addr = scope.addr().clone();
            match ctx.registry.lookup_by_node(&addr) {
                Ok(record) => {
                    for entry in record.program.iter() {
                        let Some(value) = schema.get(&entry.key) else {
                            continue;
                        };
                        let addr = scope.addr().child(Chunk::Key(&entry.key));
                        scope.push(Some(Chunk::Key(&entry.key)), addr, None);
                        (entry.keyword.validate)(scope, value, schema, instance);
                        scope.pop_emit();
                    }
                }
                Err(error) => scope.output_mut().fail(error.to_string()),
            }
        }
        // Unreachable through the public API: parsing rejects such nodes.
        other => scope.output_mut().fail(format!(
            "value of type {} is not a schema",
            crate::value::type_name(other)
        )),
    }
}

/// A parsed schema bound to the context state it was parsed under.
///
/// Validation is synchronous and the handle is immutable, so one schema can
/// serve concurrent validations; each call builds its own output tree.
#[derive(Debug, Clone)]
pub struct Schema {
    ctx: Arc<ContextInner>,
    root: SchemaAddr,
}

impl Schema {
    pub(crate) fn new(ctx: Arc<ContextInner>, root: SchemaAddr) -> Schema {
        Schema { ctx, root }
    }

    /// Evaluate an instance and produce the full output tree.
    #[must_use]
    pub fn validate(&self, instance: &Value) -> OutputUnit {
        let document = Arc::clone(self.ctx.registry.document(self.root.doc));
        let node = document
            .pointer(&self.root.ptr)
            .expect("Parsed schema root exists");
        let mut scope = EvalScope::new(&self.ctx, self.root.clone());
        validate_node(&mut scope, node, instance);
        scope.finish()
    }

    /// Shortcut for `validate(..).valid()`.
    #[must_use]
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validate(instance).valid()
    }
}
