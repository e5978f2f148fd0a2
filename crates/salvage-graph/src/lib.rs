//! Build-graph reconstruction from a compilation database.
//!
//! [`CompilationGraph::consume`] parses each record and files it under
//! canonical paths:
//!
//! - `sources`: source -> {target -> command}
//! - `objects`: target -> {source -> command}
//! - `targets`: command -> {target -> sources}
//! - `linkings`: targets other targets may depend on (everything but
//!   objects, locales and installs), with per-generator sub-buckets for
//!   moc/uic/rcc outputs
//! - `installs`: install command -> {installed path -> source}
//!
//! Commands are deduplicated structurally, so two records that normalise
//! to the same flags share one [`CommandId`](salvage_common::CommandId).

mod graph;
mod probe;

pub use graph::{CompilationGraph, LinkIndex, MigratedInstall, PathIndex};
pub use probe::{dependency_args, parse_dependency_output, CompilerProbe, DependencyProbe, NullProbe};
