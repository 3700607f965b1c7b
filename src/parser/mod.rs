//! Source parsers: turn one file's text into definitions and call sites.
//!
//! Each language implements [`LanguageParser`]; a [`ParserRegistry`] maps
//! file extensions to parsers. Parsers never fail: anything they cannot
//! make sense of is simply left out of the [`ParseResult`].

pub mod javascript;
pub mod language;
pub mod python;

pub use javascript::JsTsParser;
pub use language::SupportedLanguage;
pub use python::PythonParser;

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

use crate::error::{CodesleuthError, Result};
use crate::graph::ParseResult;

/// A parser for one or more source languages.
pub trait LanguageParser: Send + Sync {
    /// Extensions handled by this parser, without the leading dot.
    fn supported_extensions(&self) -> &[&'static str];

    /// Extract definitions and calls from `source`.
    ///
    /// `file_path` is relative to the scanned root and is used for labels
    /// and qualified names only; it is never read.
    fn parse(&self, file_path: &Path, source: &str) -> ParseResult;
}

/// Maps file extensions to parsers.
#[derive(Clone)]
pub struct ParserRegistry {
    parsers: HashMap<String, Arc<dyn LanguageParser>>,
}

impl ParserRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Register `parser` for every extension it supports. Later
    /// registrations replace earlier ones for the same extension.
    pub fn register<P: LanguageParser + 'static>(&mut self, parser: P) {
        let parser: Arc<dyn LanguageParser> = Arc::new(parser);
        for ext in parser.supported_extensions() {
            self.parsers
                .insert(ext.trim_start_matches('.').to_string(), Arc::clone(&parser));
        }
    }

    /// Parser for an extension (leading dot optional).
    pub fn get(&self, extension: &str) -> Option<&dyn LanguageParser> {
        self.parsers
            .get(extension.trim_start_matches('.'))
            .map(|p| p.as_ref())
    }

    /// Parser for a file, by its extension.
    pub fn for_path(&self, path: &Path) -> Option<&dyn LanguageParser> {
        self.get(path.extension()?.to_str()?)
    }

    /// All registered extensions, sorted.
    pub fn supported_extensions(&self) -> BTreeSet<&str> {
        self.parsers.keys().map(String::as_str).collect()
    }

    /// Parse a file with whichever parser handles its extension.
    pub fn parse(&self, file_path: &Path, source: &str) -> Result<ParseResult> {
        let parser = self.for_path(file_path).ok_or_else(|| {
            CodesleuthError::UnsupportedLanguage(file_path.display().to_string())
        })?;
        Ok(parser.parse(file_path, source))
    }
}

impl Default for ParserRegistry {
    /// A registry holding the built-in Python and JavaScript/TypeScript parsers.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(PythonParser::new());
        registry.register(JsTsParser::new());
        registry
    }
}

/// Parse a single file with the built-in parsers.
pub fn parse_file(file_path: &Path, source: &str) -> Result<ParseResult> {
    ParserRegistry::default().parse(file_path, source)
}

// ─── Shared helpers ─────────────────────────────────────────────

/// Parse `source` with a fresh tree-sitter parser.
pub(crate) fn parse_tree(language: SupportedLanguage, file_path: &Path, source: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&language.tree_sitter_language()) {
        debug!(file = %file_path.display(), error = %e, "grammar failed to load");
        return None;
    }
    let tree = parser.parse(source, None);
    if tree.is_none() {
        debug!(file = %file_path.display(), "tree-sitter returned no tree");
    }
    tree
}

pub(crate) fn node_text<'s>(node: Node<'_>, source: &'s [u8]) -> Option<&'s str> {
    node.utf8_text(source).ok()
}

pub(crate) fn field_text(node: Node<'_>, field: &str, source: &[u8]) -> Option<String> {
    node.child_by_field_name(field)
        .and_then(|n| node_text(n, source))
        .map(str::to_string)
}

/// 1-indexed line of a node.
pub(crate) fn line_of(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

pub(crate) fn first_named_child(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let first = node.named_children(&mut cursor).next();
    first
}

/// Dotted module path: `pkg/util.py` -> `pkg.util`.
pub(crate) fn module_path(file_path: &Path) -> String {
    file_path
        .with_extension("")
        .iter()
        .map(|part| part.to_string_lossy())
        .filter(|part| !part.is_empty() && part != "." && part != "/" && part != "\\")
        .collect::<Vec<_>>()
        .join(".")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScopeKind {
    Class,
    Function,
}

/// Enclosing classes and functions while walking a syntax tree.
#[derive(Debug, Clone)]
pub(crate) struct ScopeStack {
    module: String,
    frames: Vec<(String, ScopeKind)>,
}

impl ScopeStack {
    pub(crate) fn new(file_path: &Path) -> Self {
        Self {
            module: module_path(file_path),
            frames: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, name: impl Into<String>, kind: ScopeKind) {
        self.frames.push((name.into(), kind));
    }

    pub(crate) fn pop(&mut self) {
        self.frames.pop();
    }

    /// `module.Scope.Inner.name`.
    pub(crate) fn qualify(&self, name: &str) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(self.frames.len() + 2);
        if !self.module.is_empty() {
            parts.push(&self.module);
        }
        parts.extend(self.frames.iter().map(|(n, _)| n.as_str()));
        parts.push(name);
        parts.join(".")
    }

    /// The class a definition at this point belongs to: only when the
    /// innermost scope is a class body.
    pub(crate) fn enclosing_class(&self) -> Option<String> {
        match self.frames.last() {
            Some((name, ScopeKind::Class)) => Some(name.clone()),
            _ => None,
        }
    }
}
