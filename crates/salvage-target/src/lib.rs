//! Typed build targets derived from a compilation graph.
//!
//! [`classify`] walks a finished [`salvage_graph::CompilationGraph`] and
//! emits executables, libraries, generated-source commands, locale and
//! install rules. Names come from a [`NameRegistry`] the caller owns, so
//! one registry can span several graphs. [`hoist_common_config`] then
//! lifts the compile flags a scope's targets share.

pub mod classify;
pub mod hoist;
pub mod names;
pub mod target;

pub use classify::{classify, ClassifyOptions, Classifier};
pub use hoist::{hoist_common_config, CommonConfig};
pub use names::NameRegistry;
pub use target::{LibraryType, Target, TargetKind};
