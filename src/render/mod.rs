//! Output renderers for a resolved call graph.

pub mod json;
pub mod mermaid;

pub use json::JsonRenderer;
pub use mermaid::MermaidRenderer;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{CodesleuthError, Result};
use crate::graph::CallGraph;

/// Flowchart layout direction.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum Direction {
    /// Top to bottom.
    #[default]
    #[serde(rename = "TD")]
    #[value(name = "TD")]
    TopDown,
    /// Left to right.
    #[serde(rename = "LR")]
    #[value(name = "LR")]
    LeftRight,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::TopDown => "TD",
            Direction::LeftRight => "LR",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Knobs shared by all renderers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub direction: Direction,
    /// Docstring excerpts longer than this many characters are cut.
    pub max_docstring_length: usize,
    /// Also show definitions that take part in no resolved call.
    pub include_orphans: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            direction: Direction::TopDown,
            max_docstring_length: 80,
            include_orphans: false,
        }
    }
}

/// Turns a call graph into a textual document.
pub trait Renderer {
    fn render(&self, graph: &CallGraph, options: &RenderOptions) -> Result<String>;

    /// Render and write to `path`, creating parent directories.
    fn render_to_file(&self, graph: &CallGraph, path: &Path, options: &RenderOptions) -> Result<()> {
        let document = self.render(graph, options)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CodesleuthError::io(parent, e))?;
        }
        fs::write(path, document).map_err(|e| CodesleuthError::io(path, e))?;
        info!(path = %path.display(), "wrote call graph");
        Ok(())
    }
}
