//! Call graph module: data model, resolution and assembly.
//!
//! Provides the definition/call data model, the symbol index and resolver,
//! graph assembly, component splitting, and directory scanning.

pub mod builder;
pub mod components;
pub mod engine;
pub mod index;
pub mod resolver;
pub mod types;

pub use builder::{build_graph, scan_stats, FileScanner, ScanStats};
pub use components::connected_components;
pub use engine::{CallGraph, GraphBuilder, GraphStats};
pub use index::SymbolIndex;
pub use resolver::{Match, MatchRule, ResolutionStats, Resolver};
pub use types::{
    CallEdge, DefId, Definition, DefinitionKey, ExtractedCall, ParseResult, Resolution,
};
