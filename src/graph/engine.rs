//! The core graph engine for CodeSleuth.
//!
//! `GraphBuilder` stages parse results and assembles them into an immutable
//! `CallGraph`: definitions live in a dense arena, edges refer to them by
//! `DefId`, and every edge's resolution slot is filled exactly once.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use super::components;
use super::index::SymbolIndex;
use super::resolver::{ResolutionStats, Resolver};
use super::types::*;

/// A fully assembled call graph.
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    /// Definition arena. `DefId(i)` refers to `definitions[i]`.
    definitions: Vec<Definition>,
    /// All call edges, resolved or not, in ingestion order.
    edges: Vec<CallEdge>,
    /// Index: (qualified name, file path) -> arena slot.
    key_index: HashMap<DefinitionKey, DefId>,
}

impl CallGraph {
    /// Create a new empty call graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a graph from an arena and edges that already point into it.
    ///
    /// # Panics
    ///
    /// Panics if an edge's caller or resolved target is outside the arena.
    pub fn from_parts(definitions: Vec<Definition>, edges: Vec<CallEdge>) -> Self {
        for edge in &edges {
            assert!(
                edge.caller.index() < definitions.len(),
                "call from {} at {}:{} has caller {} outside the definition set",
                edge.callee,
                edge.file_path.display(),
                edge.line,
                edge.caller
            );
            if let Some(target) = edge.target() {
                assert!(
                    target.index() < definitions.len(),
                    "call {} resolved to {} outside the definition set",
                    edge.callee,
                    target
                );
            }
        }

        let key_index = definitions
            .iter()
            .enumerate()
            .map(|(i, def)| (def.key(), DefId(i)))
            .collect();

        Self {
            definitions,
            edges,
            key_index,
        }
    }

    // ─── Definitions ────────────────────────────────────────────

    pub fn definitions(&self) -> &[Definition] {
        &self.definitions
    }

    /// Definition behind a handle issued by this graph.
    pub fn definition(&self, id: DefId) -> &Definition {
        &self.definitions[id.index()]
    }

    pub fn get(&self, id: DefId) -> Option<&Definition> {
        self.definitions.get(id.index())
    }

    /// Iterate over `(handle, definition)` pairs in arena order.
    pub fn iter_definitions(&self) -> impl Iterator<Item = (DefId, &Definition)> + '_ {
        self.definitions
            .iter()
            .enumerate()
            .map(|(i, def)| (DefId(i), def))
    }

    /// Look up a definition by its identity key.
    pub fn id_of(&self, key: &DefinitionKey) -> Option<DefId> {
        self.key_index.get(key).copied()
    }

    /// Find a definition by qualified name within a file.
    pub fn find_qualified(&self, file_path: &Path, qualified_name: &str) -> Option<DefId> {
        self.id_of(&DefinitionKey::new(qualified_name, file_path))
    }

    /// All definitions with this simple name, in arena order.
    pub fn find_by_name(&self, name: &str) -> Vec<DefId> {
        self.iter_definitions()
            .filter(|(_, def)| def.name == name)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    // ─── Edges ──────────────────────────────────────────────────

    pub fn edges(&self) -> &[CallEdge] {
        &self.edges
    }

    /// Edges whose callee was resolved to a definition.
    pub fn resolved_edges(&self) -> impl Iterator<Item = &CallEdge> + '_ {
        self.edges.iter().filter(|e| e.is_resolved())
    }

    /// Edges left unresolved (unknown or ambiguous callee).
    pub fn unresolved_edges(&self) -> impl Iterator<Item = &CallEdge> + '_ {
        self.edges.iter().filter(|e| !e.is_resolved())
    }

    pub fn caller_of(&self, edge: &CallEdge) -> &Definition {
        self.definition(edge.caller)
    }

    pub fn target_of(&self, edge: &CallEdge) -> Option<&Definition> {
        edge.target().map(|id| self.definition(id))
    }

    /// Distinct definitions this one calls, in first-call order.
    pub fn callees(&self, id: DefId) -> Vec<DefId> {
        let mut seen = HashSet::new();
        self.resolved_edges()
            .filter(|e| e.caller == id)
            .filter_map(|e| e.target())
            .filter(|target| seen.insert(*target))
            .collect()
    }

    /// Distinct definitions calling this one, in first-call order.
    pub fn callers(&self, id: DefId) -> Vec<DefId> {
        let mut seen = HashSet::new();
        self.resolved_edges()
            .filter(|e| e.target() == Some(id))
            .map(|e| e.caller)
            .filter(|caller| seen.insert(*caller))
            .collect()
    }

    /// Definitions that make resolved calls but are never called themselves.
    pub fn entry_points(&self) -> Vec<DefId> {
        let called: HashSet<DefId> = self.resolved_edges().filter_map(|e| e.target()).collect();
        let calling: HashSet<DefId> = self.resolved_edges().map(|e| e.caller).collect();
        self.iter_definitions()
            .map(|(id, _)| id)
            .filter(|id| calling.contains(id) && !called.contains(id))
            .collect()
    }

    /// Definitions touched by at least one resolved edge.
    pub fn connected_definitions(&self) -> HashSet<DefId> {
        self.resolved_edges()
            .flat_map(|e| std::iter::once(e.caller).chain(e.target()))
            .collect()
    }

    // ─── Partitioning ───────────────────────────────────────────

    /// Split into independent sub-graphs, largest first.
    ///
    /// See [`components::connected_components`].
    pub fn connected_components(&self) -> Vec<CallGraph> {
        components::connected_components(self)
    }

    // ─── Stats ──────────────────────────────────────────────────

    pub fn stats(&self) -> GraphStats {
        let files: HashSet<&Path> = self
            .definitions
            .iter()
            .map(|d| d.file_path.as_path())
            .collect();
        let resolved_edges = self.resolved_edges().count();
        let unique_names: HashSet<&str> = self.definitions.iter().map(|d| d.name.as_str()).collect();

        GraphStats {
            file_count: files.len(),
            definition_count: self.definitions.len(),
            unique_names: unique_names.len(),
            total_edges: self.edges.len(),
            resolved_edges,
            unresolved_edges: self.edges.len() - resolved_edges,
        }
    }
}

/// Statistics about the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub file_count: usize,
    pub definition_count: usize,
    pub unique_names: usize,
    pub total_edges: usize,
    pub resolved_edges: usize,
    pub unresolved_edges: usize,
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} functions in {} files, {} call sites ({} resolved, {} unresolved)",
            self.definition_count,
            self.file_count,
            self.total_edges,
            self.resolved_edges,
            self.unresolved_edges
        )
    }
}

// ─── Assembly ───────────────────────────────────────────────────

/// Staging area for parse results.
///
/// Ingest any number of results, then call [`GraphBuilder::build`]. Building
/// does not consume the staged data, so building twice without new input
/// yields identical graphs.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    definitions: Vec<Definition>,
    edges: Vec<CallEdge>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one file's definitions and calls.
    ///
    /// # Panics
    ///
    /// Panics if a call names a caller outside `result.definitions`.
    pub fn add_result(&mut self, result: ParseResult) {
        let ParseResult {
            file_path,
            definitions,
            calls,
        } = result;
        let offset = self.definitions.len();

        for call in calls {
            assert!(
                call.caller < definitions.len(),
                "{}:{}: call to {} has caller #{} but the file defines {} functions",
                file_path.display(),
                call.line,
                call.callee,
                call.caller,
                definitions.len()
            );
            self.edges.push(CallEdge {
                caller: DefId(offset + call.caller),
                callee: call.callee,
                file_path: file_path.clone(),
                line: call.line,
                resolution: Resolution::Unresolved,
            });
        }

        self.definitions.extend(definitions);
    }

    /// Ingest many results, in order.
    pub fn add_results(&mut self, results: impl IntoIterator<Item = ParseResult>) {
        for result in results {
            self.add_result(result);
        }
    }

    /// Index every staged definition, resolve every staged edge, and
    /// return the resulting graph.
    pub fn build(&self) -> CallGraph {
        debug!(
            definitions = self.definitions.len(),
            edges = self.edges.len(),
            "building symbol index"
        );
        let index = SymbolIndex::build(&self.definitions);
        let resolver = Resolver::new(&self.definitions, &index);

        // The index is complete here; each edge is resolved independently.
        let outcomes: Vec<_> = self
            .edges
            .par_iter()
            .map(|edge| resolver.resolve_match(edge))
            .collect();

        let mut stats = ResolutionStats::default();
        let edges: Vec<CallEdge> = self
            .edges
            .iter()
            .zip(outcomes)
            .map(|(edge, outcome)| {
                stats.record(outcome);
                CallEdge {
                    resolution: outcome.map(|m| m.target).into(),
                    ..edge.clone()
                }
            })
            .collect();

        info!(
            resolved = stats.resolved(),
            unresolved = stats.unresolved,
            qualified = stats.qualified,
            receiver = stats.receiver,
            same_file = stats.same_file,
            unique = stats.unique,
            "call edges resolved"
        );

        CallGraph::from_parts(self.definitions.clone(), edges)
    }
}
