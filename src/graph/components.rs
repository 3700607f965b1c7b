//! Connected-component splitting for large graphs.
//!
//! Two definitions share a component when a chain of resolved calls joins
//! them, ignoring call direction. Each component is returned as its own
//! `CallGraph` with handles renumbered into the component's arena.

use petgraph::unionfind::UnionFind;
use std::collections::HashMap;
use tracing::debug;

use super::engine::CallGraph;
use super::types::{CallEdge, DefId, Definition};

/// Partition `graph` into independent sub-graphs.
///
/// A component holds its definitions (in arena order) and every edge whose
/// caller belongs to it, including unresolved ones. Components are ordered
/// by descending size; equal sizes keep the order in which their first
/// definition appears. An empty graph yields no components.
pub fn connected_components(graph: &CallGraph) -> Vec<CallGraph> {
    let n = graph.definitions().len();
    if n == 0 {
        return Vec::new();
    }

    let mut sets = UnionFind::<usize>::new(n);
    for edge in graph.resolved_edges() {
        if let Some(target) = edge.target() {
            sets.union(edge.caller.index(), target.index());
        }
    }

    // Group by representative, in encounter order.
    let mut group_of_root: HashMap<usize, usize> = HashMap::new();
    let mut groups: Vec<Vec<DefId>> = Vec::new();
    let mut group_of: Vec<usize> = Vec::with_capacity(n);
    for i in 0..n {
        let root = sets.find_mut(i);
        let group = *group_of_root.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[group].push(DefId(i));
        group_of.push(group);
    }

    let mut edges_of: Vec<Vec<&CallEdge>> = vec![Vec::new(); groups.len()];
    for edge in graph.edges() {
        edges_of[group_of[edge.caller.index()]].push(edge);
    }

    let mut components: Vec<CallGraph> = groups
        .iter()
        .zip(edges_of)
        .map(|(members, edges)| subgraph(graph, members, &edges))
        .collect();

    // Stable: ties keep encounter order.
    components.sort_by(|a, b| b.definitions().len().cmp(&a.definitions().len()));

    debug!(
        definitions = n,
        components = components.len(),
        "partitioned call graph"
    );
    components
}

/// Copy `members` and `edges` into a fresh arena.
fn subgraph(graph: &CallGraph, members: &[DefId], edges: &[&CallEdge]) -> CallGraph {
    let local: HashMap<DefId, DefId> = members
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, DefId(i)))
        .collect();

    let definitions: Vec<Definition> = members
        .iter()
        .map(|&id| graph.definition(id).clone())
        .collect();

    let edges = edges
        .iter()
        .map(|edge| CallEdge {
            caller: local[&edge.caller],
            // A resolved target is always in its caller's component.
            resolution: edge
                .target()
                .and_then(|target| local.get(&target).copied())
                .into(),
            ..(*edge).clone()
        })
        .collect();

    CallGraph::from_parts(definitions, edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphBuilder, ParseResult, Resolution};
    use std::path::PathBuf;

    fn def(name: &str, file: &str) -> Definition {
        Definition::new(name, format!("{}.{}", file.trim_end_matches(".py"), name), file, 1)
    }

    fn resolved(caller: usize, target: usize, file: &str) -> CallEdge {
        CallEdge {
            caller: DefId(caller),
            callee: format!("f{}", target),
            file_path: PathBuf::from(file),
            line: 1,
            resolution: Resolution::Resolved(DefId(target)),
        }
    }

    fn unresolved(caller: usize, callee: &str, file: &str) -> CallEdge {
        CallEdge {
            caller: DefId(caller),
            callee: callee.to_string(),
            file_path: PathBuf::from(file),
            line: 1,
            resolution: Resolution::Unresolved,
        }
    }

    fn sizes(components: &[CallGraph]) -> Vec<usize> {
        components.iter().map(|c| c.definitions().len()).collect()
    }

    #[test]
    fn test_empty_graph_has_no_components() {
        assert!(CallGraph::new().connected_components().is_empty());
    }

    #[test]
    fn test_single_component() {
        let graph = CallGraph::from_parts(
            vec![def("a", "x.py"), def("b", "x.py"), def("c", "x.py")],
            vec![resolved(0, 1, "x.py"), resolved(1, 2, "x.py")],
        );
        assert_eq!(sizes(&graph.connected_components()), vec![3]);
    }

    #[test]
    fn test_two_components_of_two() {
        let graph = CallGraph::from_parts(
            vec![def("a", "x.py"), def("b", "x.py"), def("c", "y.py"), def("d", "y.py")],
            vec![resolved(0, 1, "x.py"), resolved(2, 3, "y.py")],
        );
        let comps = graph.connected_components();
        assert_eq!(sizes(&comps), vec![2, 2]);
        assert_eq!(comps[0].definitions()[0].name, "a");
        assert_eq!(comps[1].definitions()[0].name, "c");
    }

    #[test]
    fn test_isolated_definitions_are_singletons() {
        let graph = CallGraph::from_parts(
            vec![def("a", "x.py"), def("b", "x.py"), def("c", "x.py")],
            vec![],
        );
        assert_eq!(sizes(&graph.connected_components()), vec![1, 1, 1]);
    }

    #[test]
    fn test_sorted_largest_first() {
        let graph = CallGraph::from_parts(
            vec![def("d", "y.py"), def("a", "x.py"), def("b", "x.py"), def("c", "x.py")],
            vec![resolved(1, 2, "x.py"), resolved(2, 3, "x.py")],
        );
        let comps = graph.connected_components();
        assert_eq!(sizes(&comps), vec![3, 1]);
        assert_eq!(comps[1].definitions()[0].name, "d");
    }

    #[test]
    fn test_direction_is_ignored() {
        // b -> a and c -> a join all three.
        let graph = CallGraph::from_parts(
            vec![def("a", "x.py"), def("b", "x.py"), def("c", "x.py")],
            vec![resolved(1, 0, "x.py"), resolved(2, 0, "x.py")],
        );
        assert_eq!(sizes(&graph.connected_components()), vec![3]);
    }

    #[test]
    fn test_unresolved_edges_follow_their_caller() {
        let graph = CallGraph::from_parts(
            vec![def("a", "x.py"), def("b", "x.py"), def("lonely", "z.py")],
            vec![
                resolved(0, 1, "x.py"),
                unresolved(1, "print", "x.py"),
                unresolved(2, "missing", "z.py"),
            ],
        );
        let comps = graph.connected_components();
        assert_eq!(sizes(&comps), vec![2, 1]);

        assert_eq!(comps[0].edges().len(), 2);
        assert_eq!(comps[0].resolved_edges().count(), 1);
        assert_eq!(comps[1].edges().len(), 1);
        assert_eq!(comps[1].edges()[0].callee, "missing");
        assert_eq!(comps[1].edges()[0].caller, DefId(0));
    }

    #[test]
    fn test_handles_are_renumbered() {
        let graph = CallGraph::from_parts(
            vec![def("solo", "s.py"), def("a", "x.py"), def("b", "x.py"), def("c", "x.py")],
            vec![resolved(3, 1, "x.py"), resolved(1, 2, "x.py")],
        );
        let comps = graph.connected_components();
        let big = &comps[0];
        assert_eq!(big.definitions().len(), 3);
        for edge in big.edges() {
            let caller = big.caller_of(edge);
            let target = big.target_of(edge).unwrap();
            assert!(["a", "b", "c"].contains(&caller.name.as_str()));
            assert!(["a", "b", "c"].contains(&target.name.as_str()));
        }
        let first = &big.edges()[0];
        assert_eq!(big.caller_of(first).name, "c");
        assert_eq!(big.target_of(first).unwrap().name, "a");
    }

    #[test]
    fn test_components_of_built_graph() {
        let mut builder = GraphBuilder::new();
        let mut a = ParseResult::empty("a.py");
        a.push_definition(def("main", "a.py"));
        a.push_definition(def("load", "a.py"));
        a.push_call(0, "load", 2);
        let mut b = ParseResult::empty("b.py");
        b.push_definition(def("parse", "b.py"));
        b.push_call(0, "unknown", 3);
        builder.add_results(vec![a, b]);

        let comps = builder.build().connected_components();
        assert_eq!(sizes(&comps), vec![2, 1]);
        let total_edges: usize = comps.iter().map(|c| c.edges().len()).sum();
        assert_eq!(total_edges, 2);
    }
}
