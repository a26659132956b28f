//! The keyword descriptor model and the dependency-driven program sort.
//!
//! A keyword is a value, not a subclass: a name, dependency edges and two
//! operations. Dialects are maps from names to keyword descriptors, so the
//! keyword set stays open without any class hierarchy.
//!
//! Names starting with `@` in the edge lists are *virtual*: they never match
//! a concrete keyword and act as named ordering barriers. `A < B` holds when
//! some keyword lists a barrier in its `dependents` and another lists the
//! same barrier in its `dependencies`.
use serde_json::{Map, Value};

use crate::{error::SchemaError, evaluate::EvalScope, parser::ParseScope};

pub(crate) type ParseFn =
    fn(&mut ParseScope<'_>, &Value, &Map<String, Value>) -> Result<(), SchemaError>;
pub(crate) type ValidateFn = fn(&mut EvalScope<'_>, &Value, &Map<String, Value>, &Value);

/// A keyword descriptor: identity, ordering edges and the two pipeline
/// operations.
pub(crate) struct Keyword {
    pub(crate) name: &'static str,
    /// Names (or virtual barriers) that must run before this keyword.
    pub(crate) dependencies: &'static [&'static str],
    /// Names (or virtual barriers) that must run after this keyword.
    pub(crate) dependents: &'static [&'static str],
    pub(crate) parse: ParseFn,
    pub(crate) validate: ValidateFn,
}

impl std::fmt::Debug for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keyword").field("name", &self.name).finish()
    }
}

/// One slot of a sorted keyword program: the key as written in the schema
/// and the descriptor it resolved to.
#[derive(Debug, Clone)]
pub(crate) struct ProgramEntry {
    pub(crate) key: String,
    pub(crate) keyword: &'static Keyword,
}

fn is_virtual(name: &str) -> bool {
    name.starts_with('@')
}

/// Collect the precedence edges among the present entries.
///
/// An edge `(a, b)` means the entry with key `a` must precede the one with
/// key `b`. Virtual barriers expand into edges between every producer and
/// every consumer of the barrier.
fn collect_edges(entries: &[ProgramEntry]) -> Vec<(usize, usize)> {
    let position = |key: &str| entries.iter().position(|entry| entry.key == key);
    let mut edges = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        for dependency in entry.keyword.dependencies {
            if is_virtual(dependency) {
                for (other, candidate) in entries.iter().enumerate() {
                    if candidate.keyword.dependents.contains(dependency) {
                        edges.push((other, index));
                    }
                }
            } else if let Some(other) = position(dependency) {
                edges.push((other, index));
            }
        }
        for dependent in entry.keyword.dependents {
            if !is_virtual(dependent) {
                if let Some(other) = position(dependent) {
                    edges.push((index, other));
                }
            }
        }
    }
    edges.retain(|(from, to)| from != to);
    edges.sort_unstable();
    edges.dedup();
    edges
}

/// Sort a keyword program so every dependency precedes its dependents.
///
/// The sort is stable: entries unconstrained relative to each other keep
/// their source order, and sorting a sorted program is the identity. A cycle
/// among the edges fails with [`SchemaError::CycleDetected`] naming the
/// participating keys.
pub(crate) fn sort_program(entries: Vec<ProgramEntry>) -> Result<Vec<ProgramEntry>, SchemaError> {
    let edges = collect_edges(&entries);
    if edges.is_empty() {
        return Ok(entries);
    }
    let mut emitted = vec![false; entries.len()];
    let mut sorted = Vec::with_capacity(entries.len());
    while sorted.len() < entries.len() {
        let next = (0..entries.len()).find(|&candidate| {
            !emitted[candidate]
                && edges
                    .iter()
                    .all(|&(from, to)| to != candidate || emitted[from])
        });
        match next {
            Some(index) => {
                emitted[index] = true;
                sorted.push(entries[index].clone());
            }
            None => {
                let keys = entries
                    .iter()
                    .enumerate()
                    .filter(|(index, _)| !emitted[*index])
                    .map(|(_, entry)| entry.key.clone())
                    .collect();
                return Err(SchemaError::CycleDetected { keys });
            }
        }
    }
    Ok(sorted)
}
