//! CodeSleuth CLI - call graphs for Python and JavaScript/TypeScript.
//!
//! Usage:
//!   codesleuth ./project                      # writes call_graph.md
//!   codesleuth ./project --split -o graphs    # one diagram per component
//!   codesleuth ./project --direction LR --include-orphans
//!   codesleuth ./project --format json -o graph.json

use clap::Parser;
use codesleuth::cli::{init_tracing, run, Cli};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
