//! Error types for CodeSleuth.
//!
//! The resolution core is infallible; these cover the I/O edges around it
//! (scanning, configuration, rendering to disk, image export).

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by CodeSleuth operations.
#[derive(Debug, Error)]
pub enum CodesleuthError {
    /// I/O failure with the path that caused it.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No parser is registered for this file.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The config file exists but could not be read or parsed.
    #[error("invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// An exclude glob could not be compiled.
    #[error("invalid exclude pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// A renderer could not produce its output.
    #[error("render failed: {0}")]
    Render(String),

    /// Image export via mermaid-cli failed.
    #[error("export failed: {0}")]
    Export(String),
}

impl CodesleuthError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, CodesleuthError>;
