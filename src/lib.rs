//! # CodeSleuth
//!
//! Cross-file call graphs for Python and JavaScript/TypeScript codebases,
//! rendered as Mermaid diagrams.
//!
//! ## Key Features
//!
//! - **Cross-file resolution**: raw call names are matched to definitions
//!   through qualified names, `self`/`this` receivers, same-file scope and
//!   unique names, in that order
//! - **Ambiguity-aware**: a call that could mean several functions stays
//!   unresolved instead of drawing a wrong arrow
//! - **Splittable**: large graphs break into connected components, one
//!   diagram each
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use codesleuth::{build_graph, MermaidRenderer, Renderer, SleuthConfig};
//! use std::path::Path;
//!
//! let root = Path::new(".");
//! let config = SleuthConfig::load_from_root(root);
//! let graph = build_graph(root, &config)?;
//!
//! MermaidRenderer::new().render_to_file(&graph, &config.output, &config.render_options())?;
//! # Ok::<(), codesleuth::CodesleuthError>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod graph;
pub mod parser;
pub mod render;

// Re-exports for convenience
pub use config::SleuthConfig;
pub use error::{CodesleuthError, Result};

// Graph re-exports
pub use graph::{
    build_graph, connected_components, scan_stats, CallEdge, CallGraph, DefId, Definition,
    FileScanner, GraphBuilder, GraphStats, ParseResult, Resolution,
};
pub use parser::{parse_file, LanguageParser, ParserRegistry, SupportedLanguage};
pub use render::{Direction, JsonRenderer, MermaidRenderer, RenderOptions, Renderer};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn assemble(files: &[(&str, &str)]) -> CallGraph {
        let mut builder = GraphBuilder::new();
        for (path, source) in files {
            builder.add_result(parse_file(&PathBuf::from(path), source).unwrap());
        }
        builder.build()
    }

    fn target_name(graph: &CallGraph, caller: &str, callee: &str) -> Option<String> {
        let caller = graph.find_by_name(caller)[0];
        graph
            .edges()
            .iter()
            .find(|e| e.caller == caller && e.callee == callee)
            .and_then(|e| graph.target_of(e))
            .map(|d| d.qualified_name.clone())
    }

    #[test]
    fn test_python_project_end_to_end() {
        let main = r#"
from utils import process


def greet(name: str) -> str:
    """Return a greeting string."""
    return format_greeting(name)


def format_greeting(name: str) -> str:
    return f"Hello, {name}!"


class Calculator:
    def add(self, a, b):
        return a + b

    def add_and_greet(self, a, b, name):
        total = self.add(a, b)
        print(total)
        return greet(name)
"#;
        let utils = r#"
from main import greet


def process(data):
    """Process data and greet."""
    cleaned = data.strip()
    return greet(cleaned)
"#;
        let graph = assemble(&[("main.py", main), ("utils.py", utils)]);

        assert_eq!(
            target_name(&graph, "process", "greet").as_deref(),
            Some("main.greet")
        );
        assert_eq!(
            target_name(&graph, "add_and_greet", "self.add").as_deref(),
            Some("main.Calculator.add")
        );
        assert_eq!(
            target_name(&graph, "greet", "format_greeting").as_deref(),
            Some("main.format_greeting")
        );
        assert_eq!(target_name(&graph, "add_and_greet", "print"), None);
        assert_eq!(target_name(&graph, "process", "data.strip"), None);

        let stats = graph.stats();
        assert_eq!(stats.file_count, 2);
        assert_eq!(stats.definition_count, 5);
        assert_eq!(stats.resolved_edges, 4);

        let components = graph.connected_components();
        assert_eq!(components[0].definitions().len(), 5);
    }

    #[test]
    fn test_mixed_languages_render() {
        let api = r#"
export class ApiClient {
  fetchData(endpoint) {
    return this.request(endpoint);
  }

  request(path) {
    return fetch(path);
  }
}
"#;
        let tool = "def run():\n    helper()\n\ndef helper():\n    pass\n";
        let graph = assemble(&[("src/api.ts", api), ("tools/run.py", tool)]);

        assert_eq!(
            target_name(&graph, "fetchData", "this.request").as_deref(),
            Some("src.api.ApiClient.request")
        );
        assert_eq!(graph.connected_components().len(), 2);

        let out = MermaidRenderer::new()
            .render(&graph, &RenderOptions::default())
            .unwrap();
        assert!(out.contains("<b>ApiClient.fetchData</b>"));
        assert!(out.contains("<b>run</b>"));
        assert_eq!(out.matches("subgraph").count(), 2);
        assert_eq!(out.matches("-->").count(), 2);
    }

    #[test]
    fn test_ambiguous_names_stay_unresolved() {
        let a = "def save():\n    pass\n";
        let b = "def save():\n    pass\n";
        let c = "def main():\n    save()\n";
        let graph = assemble(&[("a.py", a), ("b.py", b), ("c.py", c)]);
        assert_eq!(target_name(&graph, "main", "save"), None);
        assert_eq!(graph.stats().unresolved_edges, 1);
    }

    #[test]
    fn test_optional_receiver_is_not_a_method_call() {
        let source = r#"function foo() {}

class K {
  foo() {}

  bar() {
    this?.foo();
  }
}
"#;
        let graph = assemble(&[("k.js", source)]);
        assert_eq!(
            target_name(&graph, "bar", "this?.foo").as_deref(),
            Some("k.foo")
        );
        assert_eq!(graph.edges().len(), 1);
    }

    #[test]
    fn test_unsupported_and_degenerate_sources() {
        assert!(matches!(
            parse_file(&PathBuf::from("main.go"), "package main"),
            Err(CodesleuthError::UnsupportedLanguage(_))
        ));
        assert!(parse_file(&PathBuf::from("empty.py"), "").unwrap().is_empty());
        assert!(parse_file(&PathBuf::from("x.js"), "\u{feff}").unwrap().is_empty());

        // Python with a syntax error contributes nothing; the rest still builds.
        let graph = assemble(&[
            ("bad.py", "def ok():\n    go()\n\ndef broken(:\n"),
            ("bad.ts", "function ((( {"),
            ("good.py", "def fine():\n    pass\n"),
        ]);
        assert!(graph.find_by_name("ok").is_empty());
        assert_eq!(graph.find_by_name("fine").len(), 1);
    }
}
