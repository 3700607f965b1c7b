//! Project configuration from `.codesleuth.toml`.
//!
//! Every field is optional; command-line flags override what the file says.
//!
//! ```toml
//! direction = "LR"
//! max_docstring_length = 60
//! include_orphans = false
//! split = true
//! exclude = ["tests/*", "*_pb2.py"]
//! output = "docs/call_graph.md"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{CodesleuthError, Result};
use crate::render::{Direction, RenderOptions};

/// Config file looked up in the scanned root.
pub const CONFIG_FILE_NAME: &str = ".codesleuth.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SleuthConfig {
    pub direction: Direction,
    pub max_docstring_length: usize,
    pub include_orphans: bool,
    /// Write one diagram per connected component instead of a single file.
    pub split: bool,
    /// Extra exclude globs, gitignore syntax.
    pub exclude: Vec<String>,
    pub output: PathBuf,
}

impl Default for SleuthConfig {
    fn default() -> Self {
        Self {
            direction: Direction::TopDown,
            max_docstring_length: 80,
            include_orphans: false,
            split: false,
            exclude: Vec::new(),
            output: PathBuf::from("call_graph.md"),
        }
    }
}

impl SleuthConfig {
    /// Load from `path`, falling back to defaults if the file is missing
    /// or broken.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "ignoring config file, using defaults");
                Self::default()
            }
        }
    }

    /// Load from `path`. A missing file is not an error.
    pub fn try_load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file");
                return Ok(Self::default());
            }
            Err(e) => return Err(CodesleuthError::io(path, e)),
        };
        let config: Self = toml::from_str(&text).map_err(|e| CodesleuthError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// `<root>/.codesleuth.toml`, or defaults.
    pub fn load_from_root(root: &Path) -> Self {
        Self::load(&root.join(CONFIG_FILE_NAME))
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            direction: self.direction,
            max_docstring_length: self.max_docstring_length,
            include_orphans: self.include_orphans,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_defaults() {
        let config = SleuthConfig::default();
        assert_eq!(config.direction, Direction::TopDown);
        assert_eq!(config.max_docstring_length, 80);
        assert!(!config.include_orphans);
        assert!(!config.split);
        assert!(config.exclude.is_empty());
        assert_eq!(config.output, PathBuf::from("call_graph.md"));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = SleuthConfig::try_load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, SleuthConfig::default());
        assert_eq!(SleuthConfig::load_from_root(dir.path()), SleuthConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let (_dir, path) = write_config("direction = \"LR\"\nexclude = [\"tests/*\"]\n");
        let config = SleuthConfig::try_load(&path).unwrap();
        assert_eq!(config.direction, Direction::LeftRight);
        assert_eq!(config.exclude, vec!["tests/*"]);
        assert_eq!(config.max_docstring_length, 80);
    }

    #[test]
    fn test_invalid_file() {
        let (_dir, path) = write_config("direction = \"sideways\"\n");
        assert!(matches!(
            SleuthConfig::try_load(&path),
            Err(CodesleuthError::Config { .. })
        ));
        assert_eq!(SleuthConfig::load(&path), SleuthConfig::default());

        let (_dir, path) = write_config("colour = \"blue\"\n");
        assert!(SleuthConfig::try_load(&path).is_err());
    }

    #[test]
    fn test_render_options() {
        let (_dir, path) =
            write_config("max_docstring_length = 20\ninclude_orphans = true\n");
        let options = SleuthConfig::load(&path).render_options();
        assert_eq!(options.max_docstring_length, 20);
        assert!(options.include_orphans);
        assert_eq!(options.direction, Direction::TopDown);
    }
}
