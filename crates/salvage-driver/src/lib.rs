//! Pipeline from a compilation database to a build description.
//!
//! Stages run strictly in order: every record is consumed into a
//! [`CompilationGraph`], single-file installs are regrouped under
//! templates, the graph is classified into targets, and compile flags a
//! scope shares are hoisted. The result is handed to a [`Renderer`].

mod packages;
mod render;

pub use packages::{PackageResolver, TablePackageResolver};
pub use render::{JsonRenderer, Renderer, ResolvedPackages, SummaryRenderer};

use miette::Result;
use salvage_build::{CompilationDatabase, ProbeMode, SalvageConfig};
use salvage_common::{OrderedMap, ProjectRoot};
use salvage_graph::{CompilationGraph, CompilerProbe, DependencyProbe, NullProbe};
use salvage_target::{classify, hoist_common_config, ClassifyOptions, CommonConfig, NameRegistry, Target};
use serde::Serialize;

/// Everything a renderer needs.
#[derive(Debug, Clone, Serialize)]
pub struct BuildDescription {
    pub project: String,
    pub root: String,
    pub targets: Vec<Target>,
    /// Hoisted compile configuration per scope.
    pub common: OrderedMap<String, CommonConfig>,
}

/// Runs the pipeline under one configuration.
pub struct Driver {
    config: SalvageConfig,
}

impl Driver {
    pub fn new(config: SalvageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SalvageConfig {
        &self.config
    }

    /// The configured root, else the directory holding the database.
    pub fn project_root(&self, database: &CompilationDatabase) -> Result<ProjectRoot> {
        self.config
            .project
            .root
            .as_deref()
            .or(database.directory())
            .map(ProjectRoot::new)
            .ok_or_else(|| {
                miette::miette!("No project root: set [project] root or load the database from a file")
            })
    }

    /// The probe selected by `[probe] mode`.
    pub fn probe(&self, root: &ProjectRoot) -> Box<dyn DependencyProbe> {
        match self.config.probe.mode {
            ProbeMode::None => Box::new(NullProbe),
            ProbeMode::Compiler => Box::new(CompilerProbe::new(root.clone(), self.config.probe.cache)),
        }
    }

    /// Build the description of `database`.
    pub fn run(&self, database: &CompilationDatabase, probe: &dyn DependencyProbe) -> Result<BuildDescription> {
        self.config
            .validate()
            .map_err(|e| miette::miette!("Invalid configuration: {}", e))?;
        let root = self.project_root(database)?;
        tracing::info!("Project root {}", root.directory());

        let mut graph = CompilationGraph::new(root.clone());
        let mut skipped = 0;
        for entry in database.entries() {
            if graph.consume(entry, probe).is_none() {
                skipped += 1;
            }
        }
        tracing::info!(
            "Indexed {} records into {} commands and {} install commands, {} skipped",
            database.entries().len(),
            graph.command_count(),
            graph.install_command_count(),
            skipped
        );

        graph.extract_migrated_commands(self.config.pattern.max_fields);

        let mut names = NameRegistry::new();
        let options = ClassifyOptions {
            max_fields: self.config.pattern.max_fields,
            install_prefix: self.config.install.prefix.clone(),
            single_scope: self.config.project.single_scope,
        };
        let mut targets = classify(&graph, &mut names, options);
        let common = hoist_common_config(&mut targets);
        tracing::info!("Classified {} targets in {} scopes", targets.len(), common.len());

        Ok(BuildDescription {
            project: self.config.project_name(root.directory()),
            root: root.directory().to_string(),
            targets,
            common,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_falls_back_to_database_directory() {
        let db = CompilationDatabase::from_str("[]").unwrap();
        let driver = Driver::new(SalvageConfig::default());
        assert!(driver.project_root(&db).is_err());

        let db = db.with_directory("/git/gdb/");
        assert_eq!(driver.project_root(&db).unwrap().directory(), "/git/gdb");

        let mut config = SalvageConfig::default();
        config.project.root = Some("/git/other".into());
        assert_eq!(Driver::new(config).project_root(&db).unwrap().directory(), "/git/other");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = SalvageConfig::default();
        config.pattern.max_fields = 0;
        let db = CompilationDatabase::from_str("[]").unwrap().with_directory("/git/gdb");
        assert!(Driver::new(config).run(&db, &NullProbe).is_err());
    }

    #[test]
    fn test_empty_database() {
        let db = CompilationDatabase::from_str("[{}]").unwrap().with_directory("/git/gdb");
        let description = Driver::new(SalvageConfig::default()).run(&db, &NullProbe).unwrap();

        assert_eq!(description.project, "gdb");
        assert!(description.targets.is_empty());
        assert!(description.common.is_empty());
    }
}
