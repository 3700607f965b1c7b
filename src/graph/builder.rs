//! Graph builder: scans a directory and builds the call graph.
//!
//! Walks source files respecting .gitignore, parses each with the parser
//! registered for its extension, and assembles the resolved call graph.

use ignore::overrides::{Override, OverrideBuilder};
use ignore::{DirEntry, WalkBuilder};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

use super::engine::{CallGraph, GraphBuilder};
use super::types::ParseResult;
use crate::config::SleuthConfig;
use crate::error::{CodesleuthError, Result};
use crate::parser::{ParserRegistry, SupportedLanguage};

/// Directory names never descended into, whatever .gitignore says.
const ALWAYS_SKIP: &[&str] = &[
    ".git",
    "__pycache__",
    "node_modules",
    ".venv",
    "venv",
    "env",
    ".env",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    "dist",
    "build",
    ".eggs",
];

fn is_always_skipped(entry: &DirEntry) -> bool {
    if !entry.file_type().is_some_and(|ft| ft.is_dir()) || entry.depth() == 0 {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    ALWAYS_SKIP.contains(&name.as_ref()) || name.ends_with(".egg-info")
}

/// Recursively finds and parses supported source files under a root.
pub struct FileScanner {
    root: PathBuf,
    registry: ParserRegistry,
    excludes: Vec<String>,
}

impl FileScanner {
    pub fn new(root: impl Into<PathBuf>, registry: ParserRegistry) -> Self {
        Self {
            root: root.into(),
            registry,
            excludes: Vec::new(),
        }
    }

    /// Additional gitignore-style globs to skip. Patterns without a `/`
    /// match file or directory names at any depth; others are anchored at
    /// the root.
    pub fn with_excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excludes.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn overrides(&self) -> Result<Override> {
        let mut builder = OverrideBuilder::new(&self.root);
        for pattern in &self.excludes {
            builder
                .add(&format!("!{}", pattern))
                .map_err(|e| CodesleuthError::Pattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
        }
        builder.build().map_err(|e| CodesleuthError::Pattern {
            pattern: self.excludes.join(", "),
            message: e.to_string(),
        })
    }

    /// Files that would be parsed, absolute (root-joined), sorted.
    pub fn candidates(&self) -> Result<Vec<PathBuf>> {
        fs::metadata(&self.root).map_err(|e| CodesleuthError::io(&self.root, e))?;
        let overrides = self.overrides()?;

        let mut files: Vec<PathBuf> = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .require_git(false)
            .overrides(overrides)
            .filter_entry(|entry| !is_always_skipped(entry))
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .filter(|entry| self.registry.for_path(entry.path()).is_some())
            .map(|entry| entry.into_path())
            .collect();
        files.sort();
        Ok(files)
    }

    /// Parse every candidate file in parallel.
    ///
    /// Paths in the results are relative to the root. Files yielding
    /// neither definitions nor calls are dropped; the rest come back
    /// sorted by path.
    pub fn scan(&self) -> Result<Vec<ParseResult>> {
        let files = self.candidates()?;
        info!(root = %self.root.display(), files = files.len(), "scanning");

        let results: Mutex<Vec<ParseResult>> = Mutex::new(Vec::with_capacity(files.len()));

        files.par_iter().for_each(|file_path| {
            let bytes = match fs::read(file_path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(file = %file_path.display(), error = %e, "skipping unreadable file");
                    return;
                }
            };
            let source = String::from_utf8_lossy(&bytes);
            let relative = file_path.strip_prefix(&self.root).unwrap_or(file_path);

            match self.registry.parse(relative, &source) {
                Ok(result) if !result.is_empty() => {
                    debug!(
                        file = %relative.display(),
                        definitions = result.definitions.len(),
                        calls = result.calls.len(),
                        "parsed"
                    );
                    if let Ok(mut all) = results.lock() {
                        all.push(result);
                    }
                }
                Ok(_) => debug!(file = %relative.display(), "nothing extracted"),
                Err(e) => debug!(file = %relative.display(), error = %e, "not parsed"),
            }
        });

        let mut results = results.into_inner().unwrap_or_default();
        results.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        Ok(results)
    }
}

/// Scan `root` with the built-in parsers and resolve the call graph.
pub fn build_graph(root: &Path, config: &SleuthConfig) -> Result<CallGraph> {
    let results = FileScanner::new(root, ParserRegistry::default())
        .with_excludes(config.exclude.iter().cloned())
        .scan()?;

    let mut builder = GraphBuilder::new();
    builder.add_results(results);
    Ok(builder.build())
}

/// Count the files a scan of `root` would parse, per language.
pub fn scan_stats(root: &Path) -> Result<ScanStats> {
    let mut stats = ScanStats::default();

    for path in FileScanner::new(root, ParserRegistry::default()).candidates()? {
        if let Some(lang) = SupportedLanguage::from_path(&path) {
            stats.total_files += 1;
            match lang {
                SupportedLanguage::Python => stats.python_files += 1,
                SupportedLanguage::JavaScript => stats.js_files += 1,
                SupportedLanguage::TypeScript | SupportedLanguage::Tsx => stats.ts_files += 1,
            }
        }
    }

    Ok(stats)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub total_files: usize,
    pub python_files: usize,
    pub js_files: usize,
    pub ts_files: usize,
}

impl std::fmt::Display for ScanStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Found {} source files (Python: {}, JS: {}, TS: {})",
            self.total_files, self.python_files, self.js_files, self.ts_files
        )
    }
}
