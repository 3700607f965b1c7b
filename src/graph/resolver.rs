//! Call resolution: maps a raw callee expression to at most one definition.
//!
//! Rules are tried in a fixed order and the first one that produces a
//! candidate wins:
//!
//! 1. the callee text is exactly some definition's qualified name;
//! 2. `self.method` / `this.method` inside a method: same-class method,
//!    same file first, then any file;
//! 3. a definition with the callee's simple name in the call's own file;
//! 4. the only definition in the codebase with that simple name.
//!
//! Ambiguous calls stay unresolved. Resolving one edge never looks at
//! another edge, so edges can be resolved in any order or in parallel.

use serde::Serialize;
use std::fmt;

use super::index::SymbolIndex;
use super::types::{CallEdge, DefId, Definition, Resolution};
use crate::parser::SupportedLanguage;

/// Receiver keyword assumed for callers in files of no known language.
const DEFAULT_RECEIVER: &str = "self";

/// Which rule produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    Qualified,
    Receiver,
    SameFile,
    Unique,
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchRule::Qualified => write!(f, "qualified"),
            MatchRule::Receiver => write!(f, "receiver"),
            MatchRule::SameFile => write!(f, "same_file"),
            MatchRule::Unique => write!(f, "unique"),
        }
    }
}

/// A successful resolution and the rule that found it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub target: DefId,
    pub rule: MatchRule,
}

/// Per-rule tallies for one resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionStats {
    pub qualified: usize,
    pub receiver: usize,
    pub same_file: usize,
    pub unique: usize,
    pub unresolved: usize,
}

impl ResolutionStats {
    pub fn record(&mut self, outcome: Option<Match>) {
        match outcome.map(|m| m.rule) {
            Some(MatchRule::Qualified) => self.qualified += 1,
            Some(MatchRule::Receiver) => self.receiver += 1,
            Some(MatchRule::SameFile) => self.same_file += 1,
            Some(MatchRule::Unique) => self.unique += 1,
            None => self.unresolved += 1,
        }
    }

    pub fn resolved(&self) -> usize {
        self.qualified + self.receiver + self.same_file + self.unique
    }
}

/// Read-only resolver over a definition arena and its index.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    definitions: &'a [Definition],
    index: &'a SymbolIndex,
}

impl<'a> Resolver<'a> {
    /// `index` must have been built from `definitions`.
    pub fn new(definitions: &'a [Definition], index: &'a SymbolIndex) -> Self {
        Self { definitions, index }
    }

    /// Resolve one edge into its slot value.
    pub fn resolve(&self, edge: &CallEdge) -> Resolution {
        self.resolve_match(edge).map(|m| m.target).into()
    }

    /// Resolve one edge, reporting which rule matched.
    pub fn resolve_match(&self, edge: &CallEdge) -> Option<Match> {
        let raw = edge.callee.as_str();

        if let Some(target) = self.index.by_qualified(raw) {
            return Some(Match {
                target,
                rule: MatchRule::Qualified,
            });
        }

        let simple_name = edge.simple_name();

        if let Some(target) = self.receiver_method(edge) {
            return Some(Match {
                target,
                rule: MatchRule::Receiver,
            });
        }

        if let Some(target) = self
            .index
            .by_file(&edge.file_path)
            .iter()
            .copied()
            .find(|&id| self.definitions[id.index()].name == simple_name)
        {
            return Some(Match {
                target,
                rule: MatchRule::SameFile,
            });
        }

        match self.index.by_name(simple_name) {
            [only] => Some(Match {
                target: *only,
                rule: MatchRule::Unique,
            }),
            _ => None,
        }
    }

    /// Rule 2. Only applies to exactly `<receiver>.<method>` from inside a class.
    ///
    /// The cross-file fallback takes the first same-class method it finds and
    /// does not check for a second one.
    fn receiver_method(&self, edge: &CallEdge) -> Option<DefId> {
        let caller = self.definitions.get(edge.caller.index())?;
        let class_name = caller.class_name.as_deref()?;

        let (receiver, method) = edge.callee.split_once('.')?;
        if method.contains('.') || receiver != receiver_keyword(caller) {
            return None;
        }

        let is_sibling = |id: DefId| {
            let def = &self.definitions[id.index()];
            def.name == method && def.class_name.as_deref() == Some(class_name)
        };

        self.index
            .by_file(&edge.file_path)
            .iter()
            .copied()
            .find(|&id| is_sibling(id))
            .or_else(|| {
                self.index
                    .by_name(method)
                    .iter()
                    .copied()
                    .find(|&id| is_sibling(id))
            })
    }
}

/// The receiver keyword in the caller's language.
fn receiver_keyword(caller: &Definition) -> &'static str {
    SupportedLanguage::from_path(&caller.file_path)
        .map(|lang| lang.receiver_keyword())
        .unwrap_or(DEFAULT_RECEIVER)
}
