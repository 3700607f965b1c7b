//! Lookup tables over a definition arena.
//!
//! Built once, before any call is resolved, and read-only afterwards.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::types::{DefId, Definition};

/// The three indexes the resolver consults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolIndex {
    /// Index: simple name -> definitions with that name, in arena order.
    by_name: HashMap<String, Vec<DefId>>,
    /// Index: qualified name -> definition. Last write wins.
    by_qualified: HashMap<String, DefId>,
    /// Index: file path -> definitions declared in that file, in arena order.
    by_file: HashMap<PathBuf, Vec<DefId>>,
}

impl SymbolIndex {
    /// Build all three indexes in a single pass over `definitions`.
    pub fn build(definitions: &[Definition]) -> Self {
        let mut index = Self::default();
        for (i, def) in definitions.iter().enumerate() {
            let id = DefId(i);
            index.by_name.entry(def.name.clone()).or_default().push(id);
            index.by_qualified.insert(def.qualified_name.clone(), id);
            index
                .by_file
                .entry(def.file_path.clone())
                .or_default()
                .push(id);
        }
        index
    }

    pub fn by_name(&self, name: &str) -> &[DefId] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn by_qualified(&self, qualified_name: &str) -> Option<DefId> {
        self.by_qualified.get(qualified_name).copied()
    }

    pub fn by_file(&self, path: &Path) -> &[DefId] {
        self.by_file.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct simple names.
    pub fn unique_names(&self) -> usize {
        self.by_name.len()
    }

    pub fn file_count(&self) -> usize {
        self.by_file.len()
    }
}
