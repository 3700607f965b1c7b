//! Core types for the CodeSleuth call graph.
//!
//! Defines the function definitions and call edges produced by parsers,
//! the per-file parse result, and the handles the graph uses to refer
//! to definitions stored in its arena.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// Handle to a definition in a graph's definition arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DefId(pub usize);

impl DefId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for DefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A function or method definition.
///
/// Identity is the pair (qualified name, file path). Two definitions with the
/// same pair are equal even if their line, docs or parameters differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Definition {
    /// Simple name, e.g. `parse_file`.
    pub name: String,
    /// Dotted path: module (from file path) + scope chain + name.
    pub qualified_name: String,
    /// Path relative to the scanned root.
    pub file_path: PathBuf,
    /// Line of the definition (1-indexed).
    pub line: usize,
    /// Enclosing class/type, if this is a method.
    pub class_name: Option<String>,
    /// Docstring or JSDoc comment.
    pub docstring: Option<String>,
    /// Parameter names in declaration order.
    pub params: Vec<String>,
}

impl Definition {
    pub fn new(
        name: impl Into<String>,
        qualified_name: impl Into<String>,
        file_path: impl Into<PathBuf>,
        line: usize,
    ) -> Self {
        Self {
            name: name.into(),
            qualified_name: qualified_name.into(),
            file_path: file_path.into(),
            line,
            class_name: None,
            docstring: None,
            params: Vec::new(),
        }
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_docstring(mut self, docstring: impl Into<String>) -> Self {
        self.docstring = Some(docstring.into());
        self
    }

    pub fn with_params(mut self, params: Vec<String>) -> Self {
        self.params = params;
        self
    }

    /// The identity key of this definition.
    pub fn key(&self) -> DefinitionKey {
        DefinitionKey {
            qualified_name: self.qualified_name.clone(),
            file_path: self.file_path.clone(),
        }
    }

    /// `Class.method` for methods, the bare name otherwise.
    pub fn display_name(&self) -> String {
        match &self.class_name {
            Some(class) => format!("{}.{}", class, self.name),
            None => self.name.clone(),
        }
    }
}

impl PartialEq for Definition {
    fn eq(&self, other: &Self) -> bool {
        self.qualified_name == other.qualified_name && self.file_path == other.file_path
    }
}

impl Eq for Definition {}

impl Hash for Definition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.qualified_name.hash(state);
        self.file_path.hash(state);
    }
}

/// Composite identity of a definition: (qualified name, file path).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefinitionKey {
    pub qualified_name: String,
    pub file_path: PathBuf,
}

impl DefinitionKey {
    pub fn new(qualified_name: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            file_path: file_path.into(),
        }
    }
}

/// Outcome of resolving a call edge. Filled once, after the index is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "target")]
pub enum Resolution {
    /// No candidate, or more than one.
    #[default]
    Unresolved,
    /// Exactly one definition matched.
    Resolved(DefId),
}

impl Resolution {
    pub fn target(self) -> Option<DefId> {
        match self {
            Resolution::Resolved(id) => Some(id),
            Resolution::Unresolved => None,
        }
    }

    pub fn is_resolved(self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

impl From<Option<DefId>> for Resolution {
    fn from(target: Option<DefId>) -> Self {
        target.map_or(Resolution::Unresolved, Resolution::Resolved)
    }
}

/// A call site inside a function, as stored in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEdge {
    /// The definition that lexically contains the call.
    pub caller: DefId,
    /// Callee expression as written (`foo`, `self.bar`, `a.b.c`).
    pub callee: String,
    /// File where the call occurs.
    pub file_path: PathBuf,
    /// Line of the call site (1-indexed).
    pub line: usize,
    /// Resolved target, if any.
    pub resolution: Resolution,
}

impl CallEdge {
    pub fn target(&self) -> Option<DefId> {
        self.resolution.target()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution.is_resolved()
    }

    /// Last dot-separated segment of the callee text.
    pub fn simple_name(&self) -> &str {
        self.callee.rsplit('.').next().unwrap_or(&self.callee)
    }
}

/// A call site extracted from a single file, before it joins a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedCall {
    /// Position of the caller in the same file's definition list.
    pub caller: usize,
    /// Callee expression as written.
    pub callee: String,
    /// Line of the call (1-indexed).
    pub line: usize,
}

/// Everything extracted from one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    /// Path to the source file, relative to the scanned root.
    pub file_path: PathBuf,
    /// Functions and methods defined in this file, in source order.
    pub definitions: Vec<Definition>,
    /// Calls made from those functions.
    pub calls: Vec<ExtractedCall>,
}

impl ParseResult {
    pub fn empty(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            definitions: Vec::new(),
            calls: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty() && self.calls.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Record a definition and return its local position for later calls.
    pub fn push_definition(&mut self, definition: Definition) -> usize {
        self.definitions.push(definition);
        self.definitions.len() - 1
    }

    /// Record a call made from the definition at `caller`.
    pub fn push_call(&mut self, caller: usize, callee: impl Into<String>, line: usize) {
        self.calls.push(ExtractedCall {
            caller,
            callee: callee.into(),
            line,
        });
    }
}
