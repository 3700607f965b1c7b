//! Command-line front end.
//!
//! `codesleuth <TARGET_DIR>` scans the directory, resolves the call graph
//! and writes it as Mermaid Markdown (or JSON). Settings come from
//! `<TARGET_DIR>/.codesleuth.toml` first, then from flags.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::config::SleuthConfig;
use crate::export::{self, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::graph::{FileScanner, GraphBuilder};
use crate::parser::ParserRegistry;
use crate::render::{Direction, JsonRenderer, MermaidRenderer, Renderer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Mermaid,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "codesleuth")]
#[command(about = "Scan a directory and generate a Mermaid call-graph diagram", long_about = None)]
pub struct Cli {
    /// Directory to scan
    pub target_dir: PathBuf,

    /// Output file (single mode) or directory (split mode) [default: call_graph.md]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write one diagram per connected component
    #[arg(long, overrides_with = "no_split")]
    pub split: bool,

    /// Write a single diagram even if the config file asks to split
    #[arg(long, overrides_with = "split")]
    pub no_split: bool,

    /// Flowchart direction [default: TD]
    #[arg(long, value_enum, ignore_case = true)]
    pub direction: Option<Direction>,

    /// Truncate docstrings to this many characters [default: 80]
    #[arg(long)]
    pub max_docstring_length: Option<usize>,

    /// Include functions with no resolved calls
    #[arg(long, overrides_with = "no_include_orphans")]
    pub include_orphans: bool,

    /// Leave out functions with no resolved calls
    #[arg(long, overrides_with = "include_orphans")]
    pub no_include_orphans: bool,

    /// Glob pattern to exclude (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Mermaid)]
    pub format: OutputFormat,

    /// Also export PNG images with mermaid-cli (mmdc)
    #[arg(long)]
    pub png: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Overlay the flags on top of the file configuration.
    pub fn apply(&self, mut config: SleuthConfig) -> SleuthConfig {
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(direction) = self.direction {
            config.direction = direction;
        }
        if let Some(max) = self.max_docstring_length {
            config.max_docstring_length = max;
        }
        if let Some(include) = switch(self.include_orphans, self.no_include_orphans) {
            config.include_orphans = include;
        }
        if let Some(split) = switch(self.split, self.no_split) {
            config.split = split;
        }
        config.exclude.extend(self.exclude.iter().cloned());
        config
    }
}

/// `--flag` / `--no-flag` pair; `None` when neither was given.
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

pub fn run(cli: Cli) -> Result<()> {
    let root = &cli.target_dir;
    if !root.is_dir() {
        bail!("target directory '{}' does not exist", root.display());
    }
    if cli.png && !export::mmdc_available() {
        bail!("--png needs mmdc (mermaid-cli); install it with `npm install -g @mermaid-js/mermaid-cli`");
    }
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());
    let config = cli.apply(SleuthConfig::load_from_root(&root));
    debug!(?config, "effective configuration");

    println!("Scanning {} ...", root.display());
    let results = FileScanner::new(&root, ParserRegistry::default())
        .with_excludes(config.exclude.iter().cloned())
        .scan()
        .with_context(|| format!("failed to scan {}", root.display()))?;

    let definitions: usize = results.iter().map(|r| r.definitions.len()).sum();
    let calls: usize = results.iter().map(|r| r.calls.len()).sum();
    println!(
        "   Found {} functions and {} call sites across {} files.",
        definitions,
        calls,
        results.len()
    );

    println!("Building call graph ...");
    let mut builder = GraphBuilder::new();
    builder.add_results(results);
    let graph = builder.build();
    let stats = graph.stats();
    println!(
        "   Resolved {} edges ({} unresolved).",
        stats.resolved_edges, stats.unresolved_edges
    );

    let options = config.render_options();

    if cli.format == OutputFormat::Json {
        if config.split {
            warn!("--split only applies to Mermaid output; writing a single JSON file");
        }
        let out = json_output_path(&config.output);
        println!("Rendering -> {}", out.display());
        JsonRenderer::new().render_to_file(&graph, &out, &options)?;
        println!("Done!");
        return Ok(());
    }

    let renderer = MermaidRenderer::new();
    if config.split {
        let out_dir = config.output.with_extension("");
        println!("Splitting into components -> {}/", out_dir.display());
        let written = renderer.render_components(&graph, &out_dir, &options)?;
        println!("Wrote {} files (including index.md).", written.len());

        if cli.png {
            let pngs = export::export_pngs_from_dir(&out_dir, DEFAULT_WIDTH, DEFAULT_HEIGHT)
                .context("PNG export failed")?;
            println!("Exported {} PNG images.", pngs.len());
        }
    } else {
        println!("Rendering -> {}", config.output.display());
        renderer.render_to_file(&graph, &config.output, &options)?;

        if cli.png {
            let png = export::export_png(&config.output, None, DEFAULT_WIDTH, DEFAULT_HEIGHT)
                .context("PNG export failed")?;
            println!("Exported {}", png.display());
        }
        println!("Done!");
    }

    Ok(())
}

/// `call_graph.md` becomes `call_graph.json`; other names are kept.
fn json_output_path(output: &Path) -> PathBuf {
    match output.extension().and_then(|e| e.to_str()) {
        Some("md") => output.with_extension("json"),
        _ => output.to_path_buf(),
    }
}
