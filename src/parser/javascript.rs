//! JavaScript and TypeScript extraction.
//!
//! One walker serves `.js`/`.jsx`/`.mjs`/`.cjs`, `.ts`/`.mts`/`.cts` and
//! `.tsx`; only the grammar differs. Definitions are function and generator
//! declarations, class methods, and functions bound to a variable or a
//! class field (`const f = () => {}`, `handler = function () {}`).

use std::path::Path;
use tree_sitter::Node;

use super::{
    field_text, first_named_child, line_of, node_text, parse_tree, LanguageParser, ScopeKind,
    ScopeStack, SupportedLanguage,
};
use crate::graph::{Definition, ParseResult};

const EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "ts", "mts", "cts", "tsx"];

/// Node kinds that are a function value when bound to a name.
const FUNCTION_VALUES: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function",
    "generator_function",
];

/// Parser for JavaScript, TypeScript and TSX.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsTsParser;

impl JsTsParser {
    pub fn new() -> Self {
        Self
    }
}

impl LanguageParser for JsTsParser {
    fn supported_extensions(&self) -> &[&'static str] {
        EXTENSIONS
    }

    fn parse(&self, file_path: &Path, source: &str) -> ParseResult {
        let language = match SupportedLanguage::from_path(file_path) {
            Some(SupportedLanguage::Python) | None => SupportedLanguage::JavaScript,
            Some(lang) => lang,
        };
        let Some(tree) = parse_tree(language, file_path, source) else {
            return ParseResult::empty(file_path);
        };

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
    current: Option<usize>,
    result: ParseResult,
}

impl Walker<'_> {
    fn walk(&mut self, node: Node<'_>) {
        match node.kind() {
            "class_declaration" | "abstract_class_declaration" | "class" => {
                if let Some(name) = field_text(node, "name", self.source) {
                    self.scopes.push(name, ScopeKind::Class);
                    self.walk_children(node);
                    self.scopes.pop();
                    return;
                }
            }
            "function_declaration" | "generator_function_declaration" | "method_definition" => {
                if let Some(name) = field_text(node, "name", self.source) {
                    self.enter_function(node, node, name);
                    return;
                }
            }
            "variable_declarator" => {
                if let Some((name, function)) = self.bound_function(node, "name") {
                    self.enter_function(node, function, name);
                    return;
                }
            }
            "field_definition" => {
                if let Some((name, function)) = self.bound_function(node, "property") {
                    self.enter_function(node, function, name);
                    return;
                }
            }
            "public_field_definition" => {
                if let Some((name, function)) = self.bound_function(node, "name") {
                    self.enter_function(node, function, name);
                    return;
                }
            }
            "call_expression" => {
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

    /// `name = <function>` where the value is a function literal.
    fn bound_function<'t>(&self, node: Node<'t>, name_field: &str) -> Option<(String, Node<'t>)> {
        let value = node.child_by_field_name("value")?;
        if !FUNCTION_VALUES.contains(&value.kind()) {
            return None;
        }
        let name = node.child_by_field_name(name_field)?;
        // Destructuring patterns don't name a function.
        if !matches!(
            name.kind(),
            "identifier" | "property_identifier" | "private_property_identifier"
        ) {
            return None;
        }
        Some((node_text(name, self.source)?.to_string(), value))
    }

    /// Record a definition declared at `decl` whose parameters and body
    /// live on `function`, then walk the body with it as the caller.
    fn enter_function(&mut self, decl: Node<'_>, function: Node<'_>, name: String) {
        let definition = Definition {
            qualified_name: self.scopes.qualify(&name),
            file_path: self.result.file_path.clone(),
            line: line_of(decl),
            class_name: self.scopes.enclosing_class(),
            docstring: jsdoc(decl, self.source),
            params: params(function, self.source),
            name: name.clone(),
        };
        let id = self.result.push_definition(definition);

        let outer = self.current.replace(id);
        self.scopes.push(name, ScopeKind::Function);
        self.walk_children(function);
        self.scopes.pop();
        self.current = outer;
    }
}

/// Callee text exactly as written: `foo`, `this.bar`, `this?.x`,
/// `a.b().c`. Calls through anything else (`super()`, `(f)()`, `f()()`)
/// are not recorded.
fn callee_name(node: Node<'_>, source: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" | "member_expression" => node_text(node, source).map(str::to_string),
        _ => None,
    }
}

fn params(function: Node<'_>, source: &[u8]) -> Vec<String> {
    // `x => x + 1` has a bare `parameter` instead of a list.
    if let Some(single) = function.child_by_field_name("parameter") {
        return param_name(single, source).into_iter().collect();
    }
    let Some(parameters) = function.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut cursor = parameters.walk();
    let names: Vec<String> = parameters
        .named_children(&mut cursor)
        .filter_map(|p| param_name(p, source))
        .collect();
    names
}

fn param_name(node: Node<'_>, source: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" => node_text(node, source).map(str::to_string),
        "required_parameter" | "optional_parameter" => node
            .child_by_field_name("pattern")
            .and_then(|pattern| param_name(pattern, source)),
        "assignment_pattern" => node
            .child_by_field_name("left")
            .and_then(|left| param_name(left, source)),
        "rest_pattern" => first_named_child(node).and_then(|inner| param_name(inner, source)),
        // Destructured parameters are kept as written.
        "object_pattern" | "array_pattern" => node_text(node, source).map(str::to_string),
        _ => None,
    }
}

/// A `/** ... */` comment directly above the declaration. For `const f =
/// () => {}` and `export function f() {}` the comment sits above the
/// enclosing statement, so look there too.
fn jsdoc(decl: Node<'_>, source: &[u8]) -> Option<String> {
    let mut statement = decl;
    loop {
        match statement.parent() {
            Some(parent)
                if matches!(
                    parent.kind(),
                    "lexical_declaration" | "variable_declaration" | "export_statement"
                ) =>
            {
                statement = parent;
            }
            _ => break,
        }
    }

    let comment = statement.prev_named_sibling()?;
    if comment.kind() != "comment" {
        return None;
    }
    // Only adjacent comments count.
    if comment.end_position().row + 1 < statement.start_position().row {
        return None;
    }
    clean_jsdoc(node_text(comment, source)?)
}

pub(crate) fn clean_jsdoc(comment: &str) -> Option<String> {
    let body = comment.trim().strip_prefix("/**")?;
    let body = body.strip_suffix("*/").unwrap_or(body);

    let lines: Vec<&str> = body
        .lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix('*').map(str::trim_start).unwrap_or(line)
        })
        .collect();

    let text = lines.join("\n").trim().to_string();
    (!text.is_empty()).then_some(text)
}
