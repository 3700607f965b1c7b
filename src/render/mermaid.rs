//! Mermaid flowchart output wrapped in Markdown.
//!
//! One subgraph per source file, one node per definition, one arrow per
//! resolved call labelled with its line. Unresolved calls are not drawn.

use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{RenderOptions, Renderer};
use crate::error::{CodesleuthError, Result};
use crate::graph::{CallGraph, DefId, Definition};

const TITLE: &str = "CodeSleuth Call Graph";

/// Raised from Mermaid's 50k default so large repositories still render.
const INIT_DIRECTIVE: &str = r#"%%{init: {"theme": "default", "maxTextSize": 200000, "flowchart": {"useMaxWidth": true}}}%%"#;

const EMPTY_PLACEHOLDER: &str = r#"NoNodes["No call relationships detected"]"#;

#[derive(Debug, Clone, Copy, Default)]
pub struct MermaidRenderer;

impl MermaidRenderer {
    pub fn new() -> Self {
        Self
    }

    /// The `flowchart` body without the Markdown wrapper.
    pub fn diagram(&self, graph: &CallGraph, options: &RenderOptions) -> String {
        let mut out = format!("flowchart {}\n", options.direction);

        let nodes: Vec<DefId> = if options.include_orphans {
            graph.iter_definitions().map(|(id, _)| id).collect()
        } else {
            let connected = graph.connected_definitions();
            graph
                .iter_definitions()
                .map(|(id, _)| id)
                .filter(|id| connected.contains(id))
                .collect()
        };

        if nodes.is_empty() {
            let _ = writeln!(out, "    {}", EMPTY_PLACEHOLDER);
            return out;
        }

        let node_ids: HashMap<DefId, String> = nodes
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, format!("n{}", i)))
            .collect();

        let mut by_file: BTreeMap<&Path, Vec<DefId>> = BTreeMap::new();
        for &id in &nodes {
            by_file
                .entry(graph.definition(id).file_path.as_path())
                .or_default()
                .push(id);
        }

        for (file, mut ids) in by_file {
            ids.sort_by_key(|&id| graph.definition(id).line);
            let _ = writeln!(
                out,
                "    subgraph {}[\"{}\"]",
                subgraph_id(file),
                escape(&file.display().to_string())
            );
            for id in ids {
                let _ = writeln!(
                    out,
                    "        {}[\"{}\"]",
                    node_ids[&id],
                    node_label(graph.definition(id), options.max_docstring_length)
                );
            }
            out.push_str("    end\n");
        }

        for edge in graph.resolved_edges() {
            let src = node_ids.get(&edge.caller);
            let dst = edge.target().and_then(|t| node_ids.get(&t));
            if let (Some(src), Some(dst)) = (src, dst) {
                let _ = writeln!(out, "    {} -->|L{}| {}", src, edge.line, dst);
            }
        }

        out
    }

    fn document(&self, title: &str, graph: &CallGraph, options: &RenderOptions) -> String {
        format!(
            "# {}\n\n_Auto-generated by CodeSleuth._\n\n```mermaid\n{}\n{}```\n",
            title,
            INIT_DIRECTIVE,
            self.diagram(graph, options)
        )
    }

    /// Write one document per connected component plus an `index.md`.
    ///
    /// Components without a resolved call are skipped unless orphans are
    /// included. Returns every written path, the index last.
    pub fn render_components(
        &self,
        graph: &CallGraph,
        out_dir: &Path,
        options: &RenderOptions,
    ) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(out_dir).map_err(|e| CodesleuthError::io(out_dir, e))?;

        let components: Vec<CallGraph> = graph
            .connected_components()
            .into_iter()
            .filter(|c| options.include_orphans || c.resolved_edges().next().is_some())
            .collect();

        let mut written = Vec::with_capacity(components.len() + 1);
        let mut index = format!(
            "# {}: Components\n\n{} connected component(s).\n\n",
            TITLE,
            components.len()
        );

        for (i, component) in components.iter().enumerate() {
            let number = i + 1;
            let file_name = format!("component_{:03}.md", number);
            let path = out_dir.join(&file_name);

            let title = format!("{} (component {} of {})", TITLE, number, components.len());
            let document = self.document(&title, component, options);
            fs::write(&path, document).map_err(|e| CodesleuthError::io(&path, e))?;
            debug!(path = %path.display(), definitions = component.definitions().len(), "wrote component");

            let entries: Vec<String> = component
                .entry_points()
                .into_iter()
                .map(|id| component.definition(id).display_name())
                .collect();
            let _ = writeln!(
                index,
                "- [Component {}]({}): {} function(s), entry points: {}",
                number,
                file_name,
                component.definitions().len(),
                if entries.is_empty() {
                    "none".to_string()
                } else {
                    entries.join(", ")
                }
            );
            written.push(path);
        }

        let index_path = out_dir.join("index.md");
        fs::write(&index_path, index).map_err(|e| CodesleuthError::io(&index_path, e))?;
        written.push(index_path);

        info!(
            dir = %out_dir.display(),
            components = components.len(),
            "wrote split call graph"
        );
        Ok(written)
    }
}

impl Renderer for MermaidRenderer {
    fn render(&self, graph: &CallGraph, options: &RenderOptions) -> Result<String> {
        Ok(self.document(TITLE, graph, options))
    }
}

/// `sg_<stem>_<hash>`: readable, and distinct for same-named files.
fn subgraph_id(file: &Path) -> String {
    let stem: String = file
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    let digest = Sha256::digest(file.to_string_lossy().as_bytes());
    let hash: String = digest.iter().take(3).map(|b| format!("{:02x}", b)).collect();
    format!("sg_{}_{}", stem, hash)
}

fn node_label(def: &Definition, max_doc: usize) -> String {
    let file_name = def
        .file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut label = format!(
        "<b>{}</b><br/><i>{}:{}</i>",
        escape(&def.display_name()),
        escape(&file_name),
        def.line
    );

    if let Some(doc) = def.docstring.as_deref().and_then(|d| d.lines().next()) {
        let doc = truncate(doc.trim(), max_doc);
        if !doc.is_empty() {
            let _ = write!(label, "<br/><i>{}</i>", escape(&doc));
        }
    }
    label
}

/// Cut to at most `max` characters, the last one an ellipsis.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Characters that would end a quoted Mermaid label.
pub(crate) fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Mermaid sources inside a Markdown document, if any.
pub(crate) fn extract_mermaid_block(markdown: &str) -> Option<&str> {
    let start = markdown.find("```mermaid")?;
    let body_start = start + markdown[start..].find('\n')? + 1;
    let body_len = markdown[body_start..].find("```")?;
    Some(&markdown[body_start..body_start + body_len])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphBuilder, ParseResult};
    use crate::render::Direction;

    fn sample_graph() -> CallGraph {
        let mut main = ParseResult::empty("main.py");
        main.push_definition(
            Definition::new("greet", "main.greet", "main.py", 4)
                .with_docstring("Return a greeting string.\n\nMore text."),
        );
        main.push_definition(
            Definition::new("add", "main.Calculator.add", "main.py", 18).with_class("Calculator"),
        );
        main.push_definition(
            Definition::new("run", "main.Calculator.run", "main.py", 22).with_class("Calculator"),
        );
        main.push_call(2, "self.add", 23);
        main.push_call(2, "greet", 24);
        main.push_call(2, "print", 25);

        let mut utils = ParseResult::empty("utils.py");
        utils.push_definition(Definition::new("unused", "utils.unused", "utils.py", 1));

        let mut builder = GraphBuilder::new();
        builder.add_results(vec![main, utils]);
        builder.build()
    }

    fn render(graph: &CallGraph, options: &RenderOptions) -> String {
        MermaidRenderer::new().render(graph, options).unwrap()
    }

    #[test]
    fn test_document_shape() {
        let out = render(&sample_graph(), &RenderOptions::default());
        assert!(out.starts_with("# CodeSleuth Call Graph\n"));
        assert!(out.contains("```mermaid\n%%{init:"));
        assert!(out.contains("\"maxTextSize\": 200000"));
        assert!(out.contains("\nflowchart TD\n"));
        assert!(out.trim_end().ends_with("```"));
    }

    #[test]
    fn test_direction() {
        let options = RenderOptions {
            direction: Direction::LeftRight,
            ..Default::default()
        };
        assert!(render(&sample_graph(), &options).contains("flowchart LR"));
    }

    #[test]
    fn test_nodes_labels_and_edges() {
        let out = render(&sample_graph(), &RenderOptions::default());
        assert!(out.contains(
            "n0[\"<b>greet</b><br/><i>main.py:4</i><br/><i>Return a greeting string.</i>\"]"
        ));
        assert!(out.contains("n1[\"<b>Calculator.add</b><br/><i>main.py:18</i>\"]"));
        assert!(out.contains("n2 -->|L23| n1"));
        assert!(out.contains("n2 -->|L24| n0"));
        assert!(!out.contains("print"), "unresolved calls are not drawn");
        assert_eq!(out.matches("-->").count(), 2);
    }

    #[test]
    fn test_orphans_hidden_by_default() {
        let out = render(&sample_graph(), &RenderOptions::default());
        assert!(!out.contains("unused"));
        assert_eq!(out.matches("subgraph").count(), 1);

        let options = RenderOptions {
            include_orphans: true,
            ..Default::default()
        };
        let out = render(&sample_graph(), &options);
        assert!(out.contains("<b>unused</b>"));
        assert_eq!(out.matches("subgraph").count(), 2);
    }

    #[test]
    fn test_empty_graph_placeholder() {
        let out = render(&CallGraph::new(), &RenderOptions::default());
        assert!(out.contains(EMPTY_PLACEHOLDER));
        assert!(!out.contains("subgraph"));
    }

    #[test]
    fn test_nodes_sorted_by_line_within_file() {
        let mut result = ParseResult::empty("a.py");
        result.push_definition(Definition::new("late", "a.late", "a.py", 30));
        result.push_definition(Definition::new("early", "a.early", "a.py", 2));
        result.push_call(0, "early", 31);
        let mut builder = GraphBuilder::new();
        builder.add_result(result);

        let out = render(&builder.build(), &RenderOptions::default());
        let early = out.find("<b>early</b>").unwrap();
        let late = out.find("<b>late</b>").unwrap();
        assert!(early < late);
        assert!(out.contains("n0 -->|L31| n1"));
    }

    #[test]
    fn test_subgraph_ids() {
        let a = subgraph_id(Path::new("pkg/util.py"));
        let b = subgraph_id(Path::new("other/util.py"));
        assert!(a.starts_with("sg_util_"));
        assert_eq!(a.len(), "sg_util_".len() + 6);
        assert_ne!(a, b);
        assert_eq!(a, subgraph_id(Path::new("pkg/util.py")));
        assert!(subgraph_id(Path::new("my-app.test.js")).starts_with("sg_my_app_test_"));
    }

    #[test]
    fn test_escape_and_truncate() {
        assert_eq!(escape("a < b && \"c\" > d"), "a &lt; b &amp;&amp; &quot;c&quot; &gt; d");
        assert_eq!(truncate("short", 80), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("ééééé", 5), "ééééé");
    }

    #[test]
    fn test_long_docstring_is_truncated() {
        let mut result = ParseResult::empty("a.py");
        result.push_definition(
            Definition::new("f", "a.f", "a.py", 1).with_docstring("x".repeat(200)),
        );
        let mut builder = GraphBuilder::new();
        builder.add_result(result);
        let options = RenderOptions {
            include_orphans: true,
            max_docstring_length: 10,
            ..Default::default()
        };
        let out = render(&builder.build(), &options);
        assert!(out.contains(&format!("<i>{}…</i>", "x".repeat(9))));
    }

    #[test]
    fn test_render_components() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("graphs");
        let written = MermaidRenderer::new()
            .render_components(&sample_graph(), &out_dir, &RenderOptions::default())
            .unwrap();

        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("component_001.md"));
        assert!(written[1].ends_with("index.md"));

        let component = fs::read_to_string(&written[0]).unwrap();
        assert!(component.contains("(component 1 of 1)"));
        assert!(component.contains("Calculator.run"));

        let index = fs::read_to_string(&written[1]).unwrap();
        assert!(index.contains("[Component 1](component_001.md): 3 function(s)"));
        assert!(index.contains("entry points: Calculator.run"));
    }

    #[test]
    fn test_render_components_with_orphans() {
        let dir = tempfile::tempdir().unwrap();
        let options = RenderOptions {
            include_orphans: true,
            ..Default::default()
        };
        let written = MermaidRenderer::new()
            .render_components(&sample_graph(), dir.path(), &options)
            .unwrap();
        assert_eq!(written.len(), 3);
        assert!(written[1].ends_with("component_002.md"));
        let index = fs::read_to_string(written.last().unwrap()).unwrap();
        assert!(index.contains("entry points: none"));
    }

    #[test]
    fn test_extract_mermaid_block() {
        let out = render(&sample_graph(), &RenderOptions::default());
        let block = extract_mermaid_block(&out).unwrap();
        assert!(block.starts_with("%%{init:"));
        assert!(block.contains("flowchart TD"));
        assert!(!block.contains("```"));
        assert_eq!(extract_mermaid_block("# nothing here"), None);
    }
}
