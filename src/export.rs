//! PNG export through mermaid-cli (`mmdc`).
//!
//! `mmdc` is an optional external tool; nothing else in the crate needs it.

use std::env;
use std::ffi::OsStr;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::error::{CodesleuthError, Result};
use crate::render::mermaid::extract_mermaid_block;

const MMDC: &str = "mmdc";
const TIMEOUT: Duration = Duration::from_secs(120);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub const DEFAULT_WIDTH: u32 = 1920;
pub const DEFAULT_HEIGHT: u32 = 1080;

/// Full path of `mmdc` if it is on `PATH`.
pub fn find_mmdc() -> Option<PathBuf> {
    find_mmdc_in(&env::var_os("PATH")?)
}

fn find_mmdc_in(search_path: &OsStr) -> Option<PathBuf> {
    let names: &[&str] = if cfg!(windows) {
        &["mmdc.cmd", "mmdc.exe", "mmdc"]
    } else {
        &[MMDC]
    };
    env::split_paths(search_path)
        .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

pub fn mmdc_available() -> bool {
    find_mmdc().is_some()
}

/// Convert the Mermaid block of a Markdown file to a PNG.
///
/// `png_path` defaults to `md_path` with a `.png` extension. Returns the
/// written image path.
pub fn export_png(
    md_path: &Path,
    png_path: Option<&Path>,
    width: u32,
    height: u32,
) -> Result<PathBuf> {
    let mmdc = find_mmdc().ok_or_else(|| {
        CodesleuthError::Export(
            "mmdc (mermaid-cli) is not installed; install it with `npm install -g @mermaid-js/mermaid-cli`"
                .to_string(),
        )
    })?;

    export_png_with(&mmdc, md_path, png_path, width, height)
}

fn export_png_with(
    mmdc: &Path,
    md_path: &Path,
    png_path: Option<&Path>,
    width: u32,
    height: u32,
) -> Result<PathBuf> {
    let png_path = png_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| md_path.with_extension("png"));

    let markdown = fs::read_to_string(md_path).map_err(|e| CodesleuthError::io(md_path, e))?;
    let diagram = extract_mermaid_block(&markdown).ok_or_else(|| {
        CodesleuthError::Export(format!("no mermaid block in {}", md_path.display()))
    })?;

    // Removed when dropped, never next to the user's files.
    let scratch = tempfile::Builder::new()
        .prefix("codesleuth-")
        .suffix(".mmd")
        .tempfile()
        .map_err(|e| CodesleuthError::io(env::temp_dir(), e))?;
    fs::write(scratch.path(), diagram).map_err(|e| CodesleuthError::io(scratch.path(), e))?;
    debug!(diagram = %scratch.path().display(), "wrote temporary diagram");

    run_mmdc(mmdc, scratch.path(), &png_path, width, height)?;

    info!(png = %png_path.display(), "exported image");
    Ok(png_path)
}

fn run_mmdc(mmdc: &Path, input: &Path, output: &Path, width: u32, height: u32) -> Result<()> {
    let mut child = Command::new(mmdc)
        .arg("-i")
        .arg(input)
        .arg("-o")
        .arg(output)
        .arg("-w")
        .arg(width.to_string())
        .arg("-H")
        .arg(height.to_string())
        .args(["-b", "white"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| CodesleuthError::Export(format!("failed to start mmdc: {}", e)))?;

    // Drain stderr on a side thread so a chatty mmdc can't fill the pipe.
    let stderr = child.stderr.take();
    let reader = thread::spawn(move || {
        let mut text = String::new();
        if let Some(mut pipe) = stderr {
            let _ = pipe.read_to_string(&mut text);
        }
        text
    });

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if started.elapsed() >= TIMEOUT => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CodesleuthError::Export(format!(
                    "mmdc timed out after {}s",
                    TIMEOUT.as_secs()
                )));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(CodesleuthError::Export(format!("waiting for mmdc: {}", e))),
        }
    };

    let stderr = reader.join().unwrap_or_default();
    if status.success() {
        Ok(())
    } else {
        Err(CodesleuthError::Export(format!(
            "mmdc failed ({}): {}",
            status,
            stderr.trim()
        )))
    }
}

/// Export every `component_*.md` in `dir` (not the index), in name order.
pub fn export_pngs_from_dir(dir: &Path, width: u32, height: u32) -> Result<Vec<PathBuf>> {
    let mut sources: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| CodesleuthError::io(dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_component_file(path))
        .collect();
    sources.sort();

    sources
        .iter()
        .map(|md| export_png(md, None, width, height))
        .collect()
}

fn is_component_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.starts_with("component_") && name.ends_with(".md")
}
