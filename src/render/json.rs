//! JSON output for tooling that wants the raw graph.

use serde::Serialize;
use std::path::Path;

use super::{RenderOptions, Renderer};
use crate::error::{CodesleuthError, Result};
use crate::graph::{CallGraph, DefId, GraphStats};

/// Serialises definitions, edges (with resolved target names) and summary
/// counts. Pretty-printed unless built with [`JsonRenderer::compact`].
#[derive(Debug, Clone, Copy)]
pub struct JsonRenderer {
    pretty: bool,
}

impl Default for JsonRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonRenderer {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

#[derive(Serialize)]
struct Document<'a> {
    summary: GraphStats,
    definitions: Vec<DefinitionOut<'a>>,
    edges: Vec<EdgeOut<'a>>,
}

#[derive(Serialize)]
struct DefinitionOut<'a> {
    id: usize,
    name: &'a str,
    qualified_name: &'a str,
    file: &'a Path,
    line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    class_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    docstring: Option<&'a str>,
    params: &'a [String],
}

#[derive(Serialize)]
struct EdgeOut<'a> {
    caller: &'a str,
    callee: &'a str,
    file: &'a Path,
    line: usize,
    /// Qualified name of the resolved definition.
    target: Option<&'a str>,
    target_file: Option<&'a Path>,
}

impl Renderer for JsonRenderer {
    fn render(&self, graph: &CallGraph, options: &RenderOptions) -> Result<String> {
        let connected = graph.connected_definitions();
        let listed = |id: &DefId| options.include_orphans || connected.contains(id);

        let definitions = graph
            .iter_definitions()
            .filter(|(id, _)| listed(id))
            .map(|(id, def)| DefinitionOut {
                id: id.index(),
                name: &def.name,
                qualified_name: &def.qualified_name,
                file: &def.file_path,
                line: def.line,
                class_name: def.class_name.as_deref(),
                docstring: def.docstring.as_deref(),
                params: &def.params,
            })
            .collect();

        let edges = graph
            .edges()
            .iter()
            .filter(|edge| listed(&edge.caller))
            .map(|edge| {
                let target = graph.target_of(edge);
                EdgeOut {
                    caller: &graph.caller_of(edge).qualified_name,
                    callee: &edge.callee,
                    file: &edge.file_path,
                    line: edge.line,
                    target: target.map(|t| t.qualified_name.as_str()),
                    target_file: target.map(|t| t.file_path.as_path()),
                }
            })
            .collect();

        let document = Document {
            summary: graph.stats(),
            definitions,
            edges,
        };

        let encoded = if self.pretty {
            serde_json::to_string_pretty(&document)
        } else {
            serde_json::to_string(&document)
        };
        encoded.map_err(|e| CodesleuthError::Render(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Definition, GraphBuilder, ParseResult};
    use serde_json::Value;

    fn graph() -> CallGraph {
        let mut a = ParseResult::empty("a.py");
        a.push_definition(Definition::new("main", "a.main", "a.py", 1));
        a.push_definition(
            Definition::new("helper", "a.helper", "a.py", 5).with_docstring("Helps."),
        );
        a.push_definition(Definition::new("idle", "a.idle", "a.py", 9));
        a.push_call(0, "helper", 2);
        a.push_call(0, "print", 3);
        a.push_call(2, "log", 10);
        let mut builder = GraphBuilder::new();
        builder.add_result(a);
        builder.build()
    }

    fn render(options: &RenderOptions) -> Value {
        let text = JsonRenderer::new().render(&graph(), options).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn test_summary_and_edges() {
        let doc = render(&RenderOptions::default());
        assert_eq!(doc["summary"]["definition_count"], 3);
        assert_eq!(doc["summary"]["resolved_edges"], 1);
        assert_eq!(doc["summary"]["unresolved_edges"], 2);

        let edges = doc["edges"].as_array().unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0]["caller"], "a.main");
        assert_eq!(edges[0]["target"], "a.helper");
        assert_eq!(edges[1]["callee"], "print");
        assert!(edges[1]["target"].is_null());
    }

    #[test]
    fn test_orphans_filtered() {
        let doc = render(&RenderOptions::default());
        let names: Vec<&str> = doc["definitions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["main", "helper"]);
        assert_eq!(doc["definitions"][1]["docstring"], "Helps.");

        let all = render(&RenderOptions {
            include_orphans: true,
            ..Default::default()
        });
        assert_eq!(all["definitions"].as_array().unwrap().len(), 3);
        assert_eq!(all["edges"].as_array().unwrap().len(), 3);
        assert_eq!(all["edges"][2]["caller"], "a.idle");
    }

    #[test]
    fn test_edges_only_from_listed_definitions() {
        let doc = render(&RenderOptions::default());
        let listed: Vec<&str> = doc["definitions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["qualified_name"].as_str().unwrap())
            .collect();
        for edge in doc["edges"].as_array().unwrap() {
            assert!(listed.contains(&edge["caller"].as_str().unwrap()));
        }
    }

    #[test]
    fn test_compact() {
        let text = JsonRenderer::compact()
            .render(&graph(), &RenderOptions::default())
            .unwrap();
        assert!(!text.contains('\n'));
    }
}
