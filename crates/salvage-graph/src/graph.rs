//! The compilation graph.

use crate::probe::DependencyProbe;
use salvage_build::RawEntry;
use salvage_command::{parse_command, Command, CommandKey, Linkage, QtGenerator};
use salvage_common::{CommandId, Interner, OrderedMap, OrderedSet, ProjectRoot};
use salvage_pattern::{PatternEngine, PatternGroup};
use serde::Serialize;

/// path -> {path -> command}
pub type PathIndex = OrderedMap<String, OrderedMap<String, CommandId>>;

/// target -> {command -> sources}
pub type LinkIndex = OrderedMap<String, OrderedMap<CommandId, OrderedSet<String>>>;

/// Install commands that each copied a single file and share one
/// configuration apart from where they copied it.
#[derive(Debug, Clone, Serialize)]
pub struct MigratedInstall {
    /// The shared configuration, destination cleared.
    pub command: Command,
    /// The install commands folded into this one.
    pub merged: Vec<CommandId>,
    pub groups: Vec<PatternGroup>,
}

/// Index of every parsed entry.
///
/// Paths are canonical absolute strings. Compile, link and generate
/// commands share one id space; install commands have their own.
#[derive(Debug)]
pub struct CompilationGraph {
    root: ProjectRoot,
    commands: Interner<CommandKey, Command>,
    install_commands: Interner<CommandKey, Command>,
    sources: PathIndex,
    objects: PathIndex,
    targets: OrderedMap<CommandId, OrderedMap<String, OrderedSet<String>>>,
    linkings: LinkIndex,
    generated: OrderedMap<QtGenerator, LinkIndex>,
    installs: OrderedMap<CommandId, OrderedMap<String, String>>,
    migrated: Vec<MigratedInstall>,
}

impl CompilationGraph {
    pub fn new(root: ProjectRoot) -> Self {
        Self {
            root,
            commands: Interner::new(),
            install_commands: Interner::new(),
            sources: PathIndex::new(),
            objects: PathIndex::new(),
            targets: OrderedMap::new(),
            linkings: LinkIndex::new(),
            generated: OrderedMap::new(),
            installs: OrderedMap::new(),
            migrated: Vec::new(),
        }
    }

    /// Parse one record and index it. Returns the id of its command (in
    /// the install id space for install commands), or `None` when the
    /// record was skipped.
    pub fn consume(&mut self, entry: &RawEntry, probe: &dyn DependencyProbe) -> Option<CommandId> {
        if entry.is_empty() {
            tracing::debug!("Skipping empty record");
            return None;
        }
        let file = entry.file.as_deref()?;
        let cwd = self.root.resolve(entry.directory.as_deref().unwrap_or(""), None);
        let source = salvage_common::resolve(file, &cwd);

        let parsed = parse_command(&entry.tokens(), &source, &cwd, &self.root);
        let recorded = entry.output.as_deref().map(|output| salvage_common::resolve(output, &cwd));
        let Some(target) = recorded.or(parsed.target) else {
            tracing::warn!(
                "No output recognised for {} {}",
                parsed.command.tool,
                self.root.relpath(&source)
            );
            return None;
        };

        let mut command = parsed.command;
        if command.linkage == Linkage::Install {
            return Some(self.add_install(command, target, source));
        }

        let mut missing = std::mem::take(&mut command.missing_depends);
        if command.linkage == Linkage::Object {
            for relative in probe.probe(&command, &source) {
                missing.insert(self.root.resolve(&relative, None));
            }
            if !missing.is_empty() {
                tracing::info!(
                    "OBJECT {} depends on missing {}",
                    self.root.relpath(&target),
                    missing
                        .iter()
                        .map(|f| self.root.relpath(f))
                        .collect::<Vec<_>>()
                        .join(" ")
                );
            }
        }

        let linkage = command.linkage;
        let (id, new) = self.commands.intern(command.key(), command);
        if new {
            tracing::debug!("New cmd {}: {:?}", id, self.commands.get(id));
        }
        self.add_target(id, &target, &source, linkage, parsed.tool.qt_generator());

        if !missing.is_empty() {
            if linkage == Linkage::Object {
                for depend in &missing {
                    self.add_target(id, &target, depend, linkage, None);
                }
            }
            self.commands.get_mut(id).missing_depends.extend(missing);
        }
        Some(id)
    }

    fn add_install(&mut self, command: Command, target: String, source: String) -> CommandId {
        let (id, _) = self.install_commands.intern(command.key(), command);
        tracing::debug!(
            "Install cmd {} install {} => {}",
            id,
            self.root.relpath(&source),
            self.root.relpath(&target)
        );
        self.installs.entry(id).or_default().insert(target, source);
        id
    }

    fn add_target(
        &mut self,
        id: CommandId,
        target: &str,
        source: &str,
        linkage: Linkage,
        generator: Option<QtGenerator>,
    ) {
        tracing::debug!(
            "entry {} cmd {} => {} {}",
            self.root.relpath(source),
            id,
            linkage,
            self.root.relpath(target)
        );
        self.sources
            .entry(source.to_string())
            .or_default()
            .insert(target.to_string(), id);
        self.objects
            .entry(target.to_string())
            .or_default()
            .insert(source.to_string(), id);
        self.targets
            .entry(id)
            .or_default()
            .entry(target.to_string())
            .or_default()
            .insert(source.to_string());

        if matches!(linkage, Linkage::Object | Linkage::Locale | Linkage::Install) {
            return;
        }
        insert_link(&mut self.linkings, target, id, source);
        if let Some(generator) = generator {
            insert_link(self.generated.entry(generator).or_default(), target, id, source);
        }
    }

    /// Pull every single-file install out of `installs` and regroup the
    /// ones sharing a configuration under inferred templates.
    pub fn extract_migrated_commands(&mut self, max_fields: usize) -> &[MigratedInstall] {
        let singles: Vec<CommandId> = self
            .installs
            .iter()
            .filter(|(_, files)| files.len() == 1)
            .map(|(id, _)| *id)
            .collect();

        let mut batches: OrderedMap<CommandKey, (MigratedInstall, PatternEngine)> = OrderedMap::new();
        for id in singles {
            let Some(files) = self.installs.shift_remove(&id) else {
                continue;
            };
            let command = self.install_commands.get(id);
            let (batch, engine) = batches.entry(command.migration_key()).or_insert_with(|| {
                let mut shared = command.clone();
                shared.destination = None;
                let batch = MigratedInstall {
                    command: shared,
                    merged: Vec::new(),
                    groups: Vec::new(),
                };
                (batch, PatternEngine::new(max_fields))
            });
            batch.merged.push(id);
            for (target, source) in &files {
                engine.add(target, source);
            }
        }

        for (_, (mut batch, engine)) in batches {
            batch.groups = engine.into_groups();
            tracing::info!(
                "Migrated {} install commands into {} rule(s) in {}",
                batch.merged.len(),
                batch.groups.len(),
                self.root.relpath(&batch.command.cwd)
            );
            self.migrated.push(batch);
        }
        &self.migrated
    }

    pub fn root(&self) -> &ProjectRoot {
        &self.root
    }

    pub fn command(&self, id: CommandId) -> &Command {
        self.commands.get(id)
    }

    pub fn commands(&self) -> impl Iterator<Item = (CommandId, &Command)> {
        self.commands.iter()
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub fn install_command(&self, id: CommandId) -> &Command {
        self.install_commands.get(id)
    }

    pub fn install_command_count(&self) -> usize {
        self.install_commands.len()
    }

    /// source -> {target -> command}
    pub fn sources(&self) -> &PathIndex {
        &self.sources
    }

    /// target -> {source -> command}
    pub fn objects(&self) -> &PathIndex {
        &self.objects
    }

    /// command -> {target -> sources}
    pub fn targets(&self) -> &OrderedMap<CommandId, OrderedMap<String, OrderedSet<String>>> {
        &self.targets
    }

    /// Targets other targets may depend on.
    pub fn linkings(&self) -> &LinkIndex {
        &self.linkings
    }

    /// The Qt generator that produces `path`, if any.
    pub fn generator_of(&self, path: &str) -> Option<QtGenerator> {
        self.generated
            .iter()
            .find(|(_, index)| index.contains_key(path))
            .map(|(&generator, _)| generator)
    }

    /// install command -> {installed path -> source}
    pub fn installs(&self) -> &OrderedMap<CommandId, OrderedMap<String, String>> {
        &self.installs
    }

    pub fn migrated(&self) -> &[MigratedInstall] {
        &self.migrated
    }
}

fn insert_link(index: &mut LinkIndex, target: &str, id: CommandId, source: &str) {
    index
        .entry(target.to_string())
        .or_default()
        .entry(id)
        .or_default()
        .insert(source.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::NullProbe;
    use salvage_build::CompilationDatabase;

    struct FixedProbe(Vec<&'static str>);

    impl DependencyProbe for FixedProbe {
        fn probe(&self, _command: &Command, _source: &str) -> OrderedSet<String> {
            self.0.iter().map(|s| s.to_string()).collect()
        }
    }

    fn entry(directory: &str, file: &str, command: &str) -> RawEntry {
        RawEntry {
            directory: Some(directory.to_string()),
            file: Some(file.to_string()),
            command: Some(command.to_string()),
            ..Default::default()
        }
    }

    fn graph_of(entries: &[RawEntry]) -> CompilationGraph {
        let mut graph = CompilationGraph::new(ProjectRoot::new("/git/gdb"));
        for e in entries {
            graph.consume(e, &NullProbe);
        }
        graph
    }

    #[test]
    fn test_empty_database() {
        let db = CompilationDatabase::from_str("[]").unwrap();
        let graph = graph_of(db.entries());

        assert!(graph.objects().is_empty());
        assert!(graph.linkings().is_empty());
        assert!(graph.targets().is_empty());
        assert!(graph.installs().is_empty());
        assert_eq!(graph.command_count(), 0);
        assert_eq!(graph.install_command_count(), 0);
    }

    #[test]
    fn test_single_object() {
        let db = CompilationDatabase::from_str(
            r#"[
                {
                    "directory": "/git/gdb",
                    "command": "/usr/bin/g++ -g -O2 -I. -Iconfig -DTUI=1 -I/usr/include -Werror -c -o ada-lang.o ada-lang.c",
                    "file": "ada-lang.c"
                },
                {}
            ]"#,
        )
        .unwrap();
        let graph = graph_of(db.entries());
        let id = graph.commands().next().map(|(id, _)| id).unwrap();

        assert_eq!(graph.objects()["/git/gdb/ada-lang.o"]["/git/gdb/ada-lang.c"], id);
        assert_eq!(graph.sources()["/git/gdb/ada-lang.c"]["/git/gdb/ada-lang.o"], id);
        assert!(graph.targets()[&id]["/git/gdb/ada-lang.o"].contains("/git/gdb/ada-lang.c"));
        assert!(graph.linkings().is_empty());
        assert_eq!(graph.command_count(), 1);
        assert_eq!(graph.command(id).definitions, vec![r#"TUI="1""#]);
    }

    #[test]
    fn test_paths_collapse_and_commands_dedup() {
        let graph = graph_of(&[
            entry("/git/gdb", "./dictionary.c", "cc -c -o dictionary.o dictionary.c"),
            entry("/git/gdb/", "../gdb/dictionary.c", "cc -c -o ./dictionary.o dictionary.c"),
            entry("/git/gdb", "utils.c", "cc -c utils.c"),
            entry("/git/gdb", "dictionary.o", "cc -o gdb dictionary.o utils.o"),
            entry("/git/gdb", "utils.o", "cc -o gdb dictionary.o utils.o"),
        ]);

        assert_eq!(graph.command_count(), 2);
        assert_eq!(graph.sources().len(), 4);
        assert_eq!(graph.objects()["/git/gdb/dictionary.o"].len(), 1);

        let link = &graph.linkings()["/git/gdb/gdb"];
        assert_eq!(link.len(), 1);
        let sources: Vec<&String> = link.values().next().unwrap().iter().collect();
        assert_eq!(sources, vec!["/git/gdb/dictionary.o", "/git/gdb/utils.o"]);
    }

    #[test]
    fn test_recorded_output_wins() {
        let mut record = entry("/git/gdb", "utils.c", "cc -c utils.c");
        record.output = Some("build/utils.o".to_string());
        let graph = graph_of(&[record]);

        assert!(graph.objects().contains_key("/git/gdb/build/utils.o"));
        assert!(!graph.objects().contains_key("/git/gdb/utils.o"));
    }

    #[test]
    fn test_missing_dependencies_are_folded() {
        let mut graph = CompilationGraph::new(ProjectRoot::new("/git/gdb"));
        let id = graph
            .consume(
                &entry("/git/gdb", "main.c", "cc -c -o main.o main.c"),
                &FixedProbe(vec!["version.h"]),
            )
            .unwrap();

        assert!(graph.command(id).missing_depends.contains("/git/gdb/version.h"));
        assert_eq!(graph.objects()["/git/gdb/main.o"].len(), 2);
        assert_eq!(graph.sources()["/git/gdb/version.h"]["/git/gdb/main.o"], id);
    }

    #[test]
    fn test_generators_are_bucketed() {
        let mut graph = CompilationGraph::new(ProjectRoot::new("/git/goldendict"));
        graph.consume(
            &entry("/git/goldendict", "mainwindow.hh", "moc --include build/predefs.h mainwindow.hh -o build/moc_mainwindow.cpp"),
            &NullProbe,
        );
        graph.consume(
            &entry("/git/goldendict", "locale/ar.ts", "lrelease locale/ar.ts -qm locale/ar.qm"),
            &NullProbe,
        );

        assert_eq!(
            graph.generator_of("/git/goldendict/build/moc_mainwindow.cpp"),
            Some(QtGenerator::Moc)
        );
        assert_eq!(graph.generator_of("/git/goldendict/locale/ar.qm"), None);
        assert_eq!(graph.linkings().len(), 1);
        assert_eq!(graph.targets().len(), 2);

        let (_, moc_command) = graph.commands().next().unwrap();
        assert!(moc_command.missing_depends.contains("/git/goldendict/build/predefs.h"));
    }

    #[test]
    fn test_extract_migrated_commands() {
        let mut graph = graph_of(&[
            entry("/git/gdb/gdb", "gdb", "install -c gdb /usr/local/bin/x86_64-pc-linux-gdb"),
            entry("/git/gdb/gdb", "gcore", "install -c gcore /usr/local/bin/x86_64-pc-linux-gcore"),
            entry("/git/gdb/doc", "gdb.1", "install -c -m 644 gdb.1 /usr/local/share/man/man1/gdb.1"),
            entry("/git/gdb/doc", "a.info", "install -c -m 644 a.info /opt/gdb-docs/info/a.info"),
            entry("/git/gdb/doc", "b.info", "install -c -m 644 b.info /opt/gdb-docs/info/b.info"),
        ]);
        assert_eq!(graph.installs().len(), 4);

        let migrated = graph.extract_migrated_commands(1);
        assert_eq!(migrated.len(), 2);
        assert_eq!(migrated[0].merged.len(), 2);
        assert_eq!(migrated[0].command.destination, None);
        assert_eq!(migrated[0].groups.len(), 1);
        assert_eq!(migrated[0].groups[0].src_pattern, "/git/gdb/gdb/%(0)s");
        assert_eq!(migrated[0].groups[0].dest_pattern, "/usr/local/bin/x86_64-pc-linux-%(0)s");
        assert_eq!(migrated[1].groups.len(), 1);
        assert!(!migrated[1].groups[0].is_parameterized());

        // The shared info install copied two files and stays put.
        assert_eq!(graph.installs().len(), 1);
    }
}
