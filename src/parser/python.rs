//! Python extraction via tree-sitter-python.
//!
//! Records every `def` (sync or async, at any nesting depth) and every call
//! made from inside one. Class bodies open a scope so methods get
//! `module.Class.method` qualified names and an enclosing class.

use std::path::Path;
use tree_sitter::Node;
use tracing::debug;

use super::{
    field_text, first_named_child, line_of, node_text, parse_tree, LanguageParser, ScopeKind,
    ScopeStack, SupportedLanguage,
};
use crate::graph::{Definition, ParseResult};

/// Parameters that name the receiver rather than an argument.
const RECEIVER_PARAMS: &[&str] = &["self", "cls"];

/// Parser for Python source files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonParser;

impl PythonParser {
    pub fn new() -> Self {
        Self
    }
}

impl LanguageParser for PythonParser {
    fn supported_extensions(&self) -> &[&'static str] {
        SupportedLanguage::Python.extensions()
    }

    fn parse(&self, file_path: &Path, source: &str) -> ParseResult {
        let Some(tree) = parse_tree(SupportedLanguage::Python, file_path, source) else {
            return ParseResult::empty(file_path);
        };
        // A file Python itself would reject contributes nothing.
        if tree.root_node().has_error() {
            debug!(file = %file_path.display(), "syntax error, skipping file");
            return ParseResult::empty(file_path);
        }

        let mut walker = Walker {
            source: source.as_bytes(),
            scopes: ScopeStack::new(file_path),
            current: None,
            result: ParseResult::empty(file_path),
        };
        walker.walk(tree.root_node());
        walker.result
    }
}

struct Walker<'s> {
    source: &'s [u8],
    scopes: ScopeStack,
    /// Position of the innermost enclosing function in `result.definitions`.
    current: Option<usize>,
    result: ParseResult,
}

impl Walker<'_> {
    fn walk(&mut self, node: Node<'_>) {
        match node.kind() {
            "class_definition" => {
                if let Some(name) = field_text(node, "name", self.source) {
                    self.scopes.push(name, ScopeKind::Class);
                    self.walk_children(node);
                    self.scopes.pop();
                    return;
                }
            }
            "function_definition" => {
                if let Some(name) = field_text(node, "name", self.source) {
                    let definition = self.definition(node, &name);
                    let id = self.result.push_definition(definition);

                    let outer = self.current.replace(id);
                    self.scopes.push(name, ScopeKind::Function);
                    self.walk_children(node);
                    self.scopes.pop();
                    self.current = outer;
                    return;
                }
            }
            "call" => {
                if let Some(caller) = self.current {
                    if let Some(callee) = node
                        .child_by_field_name("function")
                        .and_then(|f| callee_name(f, self.source))
                    {
                        self.result.push_call(caller, callee, line_of(node));
                    }
                }
            }
            _ => {}
        }
        self.walk_children(node);
    }

    fn walk_children(&mut self, node: Node<'_>) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk(child);
        }
    }

    fn definition(&self, node: Node<'_>, name: &str) -> Definition {
        Definition {
            name: name.to_string(),
            qualified_name: self.scopes.qualify(name),
            file_path: self.result.file_path.clone(),
            line: line_of(node),
            class_name: self.scopes.enclosing_class(),
            docstring: docstring(node, self.source),
            params: params(node, self.source),
        }
    }
}

/// `foo`, `self.bar`, `a.b.c`. Attribute access on something that is not a
/// name (a call, a subscript) keeps only the attribute.
fn callee_name(node: Node<'_>, source: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" => node_text(node, source).map(str::to_string),
        "attribute" => {
            let attr = field_text(node, "attribute", source)?;
            match node
                .child_by_field_name("object")
                .and_then(|object| callee_name(object, source))
            {
                Some(object) => Some(format!("{}.{}", object, attr)),
                None => Some(attr),
            }
        }
        _ => None,
    }
}

fn params(function: Node<'_>, source: &[u8]) -> Vec<String> {
    let Some(parameters) = function.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut cursor = parameters.walk();
    let names: Vec<String> = parameters
        .named_children(&mut cursor)
        .filter_map(|p| param_name(p, source))
        .filter(|name| !RECEIVER_PARAMS.contains(&name.as_str()))
        .collect();
    names
}

fn param_name(node: Node<'_>, source: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" => node_text(node, source).map(str::to_string),
        "default_parameter" | "typed_default_parameter" => field_text(node, "name", source),
        "typed_parameter" | "list_splat_pattern" | "dictionary_splat_pattern" => {
            first_named_child(node).and_then(|inner| param_name(inner, source))
        }
        _ => None,
    }
}

/// The string literal opening a function body, cleaned up.
fn docstring(function: Node<'_>, source: &[u8]) -> Option<String> {
    let body = function.child_by_field_name("body")?;
    let statement = first_named_child(body)?;
    if statement.kind() != "expression_statement" {
        return None;
    }
    let literal = first_named_child(statement)?;
    if literal.kind() != "string" {
        return None;
    }
    clean_docstring(strip_string_quotes(node_text(literal, source)?))
}

/// Drop string prefixes and the surrounding quotes.
fn strip_string_quotes(literal: &str) -> &str {
    let s = literal.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if s.len() >= 2 * quote.len() && s.starts_with(quote) && s.ends_with(quote) {
            return &s[quote.len()..s.len() - quote.len()];
        }
    }
    s
}

/// Dedent a docstring the way Python's `inspect.cleandoc` does.
pub(crate) fn clean_docstring(raw: &str) -> Option<String> {
    let mut lines = raw.lines();
    let first = lines.next().unwrap_or("").trim();
    let rest: Vec<&str> = lines.collect();

    let indent = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<&str> = Vec::with_capacity(rest.len() + 1);
    cleaned.push(first);
    for line in rest {
        cleaned.push(line.get(indent..).unwrap_or("").trim_end());
    }

    while cleaned.last().is_some_and(|l| l.is_empty()) {
        cleaned.pop();
    }
    while cleaned.first().is_some_and(|l| l.is_empty()) {
        cleaned.remove(0);
    }

    let text = cleaned.join("\n");
    (!text.is_empty()).then_some(text)
}
