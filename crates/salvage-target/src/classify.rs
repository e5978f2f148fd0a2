//! Graph nodes to typed targets.

use crate::names::NameRegistry;
use crate::target::{LibraryType, Target, TargetKind};
use salvage_command::{Command, InstallKind, Linkage};
use salvage_common::{basename, dirname, name_by_common_prefix, CommandId, OrderedMap, OrderedSet, ProjectRoot};
use salvage_graph::CompilationGraph;
use salvage_pattern::{PatternEngine, PatternGroup, PatternMember};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ClassifyOptions {
    /// Upper bound on captured fields per locale template.
    pub max_fields: usize,
    /// Install destinations are reported relative to this directory.
    pub install_prefix: String,
    /// Put every target in the project root scope.
    pub single_scope: bool,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            max_fields: 1,
            install_prefix: "/usr/local".to_string(),
            single_scope: false,
        }
    }
}

/// Walks a finished graph and emits targets in a fixed order: linked
/// artifacts, locales and orphan objects, then installs.
pub struct Classifier<'a> {
    graph: &'a CompilationGraph,
    names: &'a mut NameRegistry,
    options: ClassifyOptions,
    prefix: ProjectRoot,
    targets: Vec<Target>,
    /// Object files folded into some linked target.
    absorbed: OrderedSet<String>,
    /// Artifact path -> index of its Executable/Library target.
    compiled: OrderedMap<String, usize>,
    /// Static/shared twin path -> path of the target it collapsed into.
    twins: OrderedMap<String, String>,
}

impl<'a> Classifier<'a> {
    pub fn new(graph: &'a CompilationGraph, names: &'a mut NameRegistry, options: ClassifyOptions) -> Self {
        let prefix = ProjectRoot::new(&options.install_prefix);
        Self {
            graph,
            names,
            options,
            prefix,
            targets: Vec::new(),
            absorbed: OrderedSet::new(),
            compiled: OrderedMap::new(),
            twins: OrderedMap::new(),
        }
    }

    pub fn classify(mut self) -> Vec<Target> {
        self.classify_linked();
        self.collapse_library_twins();
        self.index_compiled();
        self.classify_compilations();
        self.classify_migrated_installs();
        self.classify_installs();
        self.targets
    }

    fn root(&self) -> &str {
        self.graph.root().directory()
    }

    fn scope(&self, cwd: &str) -> String {
        if self.options.single_scope || cwd.is_empty() {
            self.root().to_string()
        } else {
            cwd.to_string()
        }
    }

    fn classify_linked(&mut self) {
        let graph = self.graph;
        for (path, producers) in graph.linkings() {
            let Some((&id, files)) = producers.first() else {
                continue;
            };
            if producers.len() > 1 {
                warn!(
                    "Target {} created by multiple commands: {}; using {}",
                    graph.root().relpath(path),
                    producers.keys().map(ToString::to_string).collect::<Vec<_>>().join(" "),
                    id
                );
            }
            let kind = match graph.command(id).linkage {
                Linkage::Source => {
                    self.custom_command(path, id, files);
                    continue;
                }
                Linkage::Executable => TargetKind::Executable,
                Linkage::Static => TargetKind::Library(LibraryType::Static),
                Linkage::Shared => TargetKind::Library(LibraryType::Shared),
                _ => continue,
            };
            self.linked_target(path, id, files, kind);
        }
    }

    fn custom_command(&mut self, path: &str, id: CommandId, files: &OrderedSet<String>) {
        let command = self.graph.command(id);
        let name = self.names.name_for_path(path);
        let mut target = Target::new(TargetKind::CustomCommand, name, self.scope(&command.cwd))
            .with_path(path)
            .with_command(command.clone());
        target.sources.extend(files.iter().cloned());
        target.depends.extend(command.missing_depends.iter().cloned());
        if let Some(generator) = self.graph.generator_of(path) {
            debug!("{} runs {} over {} inputs", target.name, generator.as_str(), files.len());
            target.depends.extend(files.iter().cloned());
        }
        info!(
            "cmd {} output custom target {} from {}",
            id,
            target.name,
            self.graph.root().relpath(path)
        );
        self.targets.push(target);
    }

    /// Executable or library: resolve every linked file to a source, a
    /// referenced target or a prebuilt library, and fold the compile
    /// commands of its objects into the link command.
    fn linked_target(&mut self, path: &str, id: CommandId, files: &OrderedSet<String>, kind: TargetKind) {
        let graph = self.graph;
        let mut command = graph.command(id).clone();
        let name = self.names.name_for_path(path);
        let mut target = Target::new(kind, name, self.scope(&command.cwd)).with_path(path);
        let mut compilations: OrderedMap<CommandId, Vec<(String, String)>> = OrderedMap::new();

        for file in files {
            if let Some(producers) = graph.linkings().get(file) {
                self.refer_linked(&mut target, &mut command, file, producers.keys().copied().collect());
                continue;
            }
            let Some(objects) = graph.objects().get(file) else {
                if is_prebuilt_library(file) {
                    target.referenced_libs.insert(file.clone());
                } else {
                    debug!("{} links opaque file {}", target.name, graph.root().relpath(file));
                    target.sources.insert(file.clone());
                }
                continue;
            };
            for (source, &cid) in objects {
                if graph.command(cid).linkage == Linkage::Object {
                    compilations
                        .entry(cid)
                        .or_default()
                        .push((source.clone(), file.clone()));
                } else {
                    target.sources.insert(file.clone());
                }
            }
        }

        if compilations.len() > 1 {
            warn!(
                "Objects of {} are compiled by {} different commands: {}",
                target.name,
                compilations.len(),
                compilations.keys().map(ToString::to_string).collect::<Vec<_>>().join(" ")
            );
        }
        if !command.missing_depends.is_empty() {
            target.include_binary_dir = true;
        }
        for (cid, pairs) in compilations {
            let compile = graph.command(cid);
            command.merge(compile);
            for (source, object) in pairs {
                // Missing headers are indexed as extra sources of the object that needs them.
                if self.is_generated(&source) || compile.missing_depends.contains(&source) {
                    target.include_binary_dir = true;
                }
                target.sources.insert(source);
                self.absorbed.insert(object);
            }
        }

        info!(
            "cmd {} output {} target {} with {} sources",
            id,
            command.linkage,
            target.name,
            target.sources.len()
        );
        target.command = Some(command);
        self.targets.push(target);
    }

    fn refer_linked(&mut self, target: &mut Target, command: &mut Command, file: &str, producers: Vec<CommandId>) {
        let Some(&producer) = producers.first() else {
            return;
        };
        if producers.len() > 1 {
            warn!("Multiple commands create {}", self.graph.root().relpath(file));
        }
        let linkage = self.graph.command(producer).linkage;
        match linkage {
            Linkage::Static | Linkage::Shared => {
                let name = self.names.name_for_path(file);
                target.referenced_libs.insert(name.clone());
                target.depends.insert(name);
                command.referenced_libs.insert(file.to_string(), linkage);
            }
            Linkage::Source => {
                target.referenced_libs.insert(file.to_string());
                target.depends.insert(self.names.name_for_path(file));
                target.include_binary_dir = true;
            }
            _ => {
                target.sources.insert(file.to_string());
            }
        }
        debug!("{} refers linked {} {}", target.name, linkage, self.graph.root().relpath(file));
    }

    fn is_generated(&self, source: &str) -> bool {
        self.graph
            .linkings()
            .get(source)
            .is_some_and(|producers| producers.keys().any(|&id| self.graph.command(id).linkage == Linkage::Source))
    }

    /// A static and a shared library over the same sources become one
    /// target building both.
    fn collapse_library_twins(&mut self) {
        let mut renamed: OrderedMap<String, String> = OrderedMap::new();
        let mut i = 0;
        while i < self.targets.len() {
            let TargetKind::Library(flavour @ (LibraryType::Static | LibraryType::Shared)) = self.targets[i].kind else {
                i += 1;
                continue;
            };
            let twin = (i + 1..self.targets.len()).find(|&j| {
                matches!(self.targets[j].kind, TargetKind::Library(other @ (LibraryType::Static | LibraryType::Shared)) if other != flavour)
                    && same_sources(&self.targets[i].sources, &self.targets[j].sources)
            });
            if let Some(j) = twin {
                let other = self.targets.remove(j);
                let kept = &mut self.targets[i];
                info!("{} and {} build the same sources, emitting both forms", kept.name, other.name);
                kept.kind = TargetKind::Library(LibraryType::Both);
                kept.referenced_libs.extend(other.referenced_libs);
                kept.depends.extend(other.depends);
                kept.destinations.extend(other.destinations);
                kept.include_binary_dir |= other.include_binary_dir;
                if let (Some(command), Some(other_command)) = (kept.command.as_mut(), other.command.as_ref()) {
                    command.merge(other_command);
                }
                renamed.insert(other.name, kept.name.clone());
                if let (Some(path), Some(other_path)) = (kept.path.clone(), other.path) {
                    self.twins.insert(other_path, path);
                }
            }
            i += 1;
        }

        if renamed.is_empty() {
            return;
        }
        let rename = |set: &OrderedSet<String>| -> OrderedSet<String> {
            set.iter()
                .map(|name| renamed.get(name).unwrap_or(name).clone())
                .collect()
        };
        for target in &mut self.targets {
            target.depends = rename(&target.depends);
            target.referenced_libs = rename(&target.referenced_libs);
        }
    }

    fn index_compiled(&mut self) {
        for (index, target) in self.targets.iter().enumerate() {
            match &target.path {
                Some(path) if target.kind.is_compiled() => {
                    self.compiled.insert(path.clone(), index);
                }
                _ => {}
            }
        }
        for (twin, path) in &self.twins {
            if let Some(&index) = self.compiled.get(path) {
                self.compiled.insert(twin.clone(), index);
            }
        }
    }

    fn classify_compilations(&mut self) {
        let graph = self.graph;
        for (&id, products) in graph.targets() {
            match graph.command(id).linkage {
                Linkage::Locale => self.locales(id, products),
                Linkage::Object => self.orphan_objects(id, products),
                _ => {}
            }
        }
    }

    fn locales(&mut self, id: CommandId, products: &OrderedMap<String, OrderedSet<String>>) {
        let graph = self.graph;
        let command = graph.command(id);
        let scope = self.scope(&command.cwd);
        let mut engine = PatternEngine::new(self.options.max_fields);
        for (product, sources) in products {
            for source in sources {
                engine.add(product, source);
            }
        }

        for group in engine.into_groups() {
            if group.is_parameterized() {
                let name = self.group_name(&group, |m| m.target.as_str(), &group.dest_pattern);
                let mut child = Target::new(TargetKind::Locale, name.clone(), scope.clone())
                    .with_path(group.dest_pattern.clone())
                    .with_command(command.clone());
                child.sources.insert(group.src_pattern.clone());
                info!("Locale {} covers {} files", name, group.members.len());
                self.targets.push(Target::foreach(name, scope.clone(), member_fields(&group), child));
                continue;
            }
            for member in group.members {
                let name = self.names.name_for_path(&member.target);
                let mut target = Target::new(TargetKind::Locale, name, scope.clone())
                    .with_path(member.target)
                    .with_command(command.clone());
                target.sources.insert(member.source);
                self.targets.push(target);
            }
        }
    }

    /// Compiled but never linked: an OBJECT library.
    fn orphan_objects(&mut self, id: CommandId, products: &OrderedMap<String, OrderedSet<String>>) {
        let graph = self.graph;
        let sources: Vec<String> = products
            .iter()
            .filter(|(object, _)| !self.absorbed.contains(*object) && !graph.linkings().contains_key(*object))
            .flat_map(|(_, sources)| sources.iter().cloned())
            .collect();
        if sources.is_empty() {
            return;
        }

        let command = graph.command(id);
        let name = name_by_common_prefix(&sources, self.root());
        let name = self.names.claim(&name, &format!("objects {}", id));
        let mut target = Target::new(TargetKind::Library(LibraryType::Object), name, self.scope(&command.cwd))
            .with_command(command.clone());
        target.include_binary_dir = !command.missing_depends.is_empty();
        target.sources.extend(sources);
        info!("cmd {} objects are not linked, output object library {}", id, target.name);
        self.targets.push(target);
    }

    fn classify_migrated_installs(&mut self) {
        let graph = self.graph;
        for batch in graph.migrated() {
            let command = &batch.command;
            let scope = self.scope(&command.cwd);
            for group in &batch.groups {
                if !group.is_parameterized() {
                    for member in &group.members {
                        let destination = install_destination(&member.target, &member.source);
                        self.install_files(command, &destination, vec![(member.target.clone(), member.source.clone())]);
                    }
                    continue;
                }

                let key = format!("install {}", group.dest_pattern);
                let name = self.group_name(group, |m| m.source.as_str(), &key);
                let kind = self.install_kind(command, group.members.first().map(|m| m.source.as_str()));
                let destination = install_destination(&group.dest_pattern, &group.src_pattern);
                let mut child = Target::new(TargetKind::Install(kind), name.clone(), scope.clone())
                    .with_path(group.dest_pattern.clone())
                    .with_command(command.clone());
                child.sources.insert(group.src_pattern.clone());
                child.destinations.insert(self.display_destination(&destination));
                info!(
                    "Install {} of {} files to {}",
                    name,
                    group.members.len(),
                    group.dest_pattern
                );
                self.targets.push(Target::foreach(name, scope.clone(), member_fields(group), child));
            }
        }
    }

    fn classify_installs(&mut self) {
        let graph = self.graph;
        for (&id, files) in graph.installs() {
            let command = graph.install_command(id);
            let Some(destination) = command.destination.as_deref() else {
                warn!("Install cmd {} has no destination", id);
                continue;
            };
            let mut batches: OrderedMap<Option<CommandId>, Vec<(String, String)>> = OrderedMap::new();
            for (installed, source) in files {
                batches
                    .entry(self.producer(source))
                    .or_default()
                    .push((installed.clone(), source.clone()));
            }
            for (_, batch) in batches {
                self.install_files(command, destination, batch);
            }
        }
    }

    /// Attach `destination` to the targets that build these files under
    /// their own name; install whatever is left as one Install target.
    /// Files no recorded command produces are reported, whether or not
    /// they exist on disk.
    fn install_files(&mut self, command: &Command, destination: &str, files: Vec<(String, String)>) {
        let shown = self.display_destination(destination);
        let mut rest = Vec::with_capacity(files.len());
        for (installed, source) in files {
            match self.compiled.get(&source) {
                Some(&index) if basename(&installed) == basename(&source) => {
                    debug!("Installing {} to {}", self.targets[index].name, shown);
                    self.targets[index].destinations.insert(shown.clone());
                }
                _ => rest.push(source),
            }
        }
        let Some(first) = rest.first() else {
            return;
        };

        for source in self.unproduced(&rest) {
            warn!("No command to create installed file {}", self.graph.root().relpath(source));
        }
        let kind = self.install_kind(command, Some(first));
        let name = name_by_common_prefix(&rest, self.root());
        let name = self.names.claim(&name, &format!("install {} {}", destination, first));
        let mut target = Target::new(TargetKind::Install(kind), name, self.scope(&command.cwd))
            .with_command(command.clone());
        target.sources.extend(rest);
        target.destinations.insert(shown);
        info!("Install {} of {} files", target.name, target.sources.len());
        self.targets.push(target);
    }

    fn install_kind(&self, command: &Command, source: Option<&str>) -> InstallKind {
        if command.install_kind == Some(InstallKind::Programs) {
            return InstallKind::Programs;
        }
        let built_executable = source
            .and_then(|s| self.producer(s))
            .is_some_and(|id| self.graph.command(id).linkage == Linkage::Executable);
        if built_executable {
            InstallKind::Programs
        } else {
            InstallKind::Files
        }
    }

    fn unproduced<'s, 'f>(&'s self, files: &'f [String]) -> impl Iterator<Item = &'f String> + 's
    where
        'f: 's,
    {
        files.iter().filter(move |file| self.producer(file).is_none())
    }

    fn producer(&self, path: &str) -> Option<CommandId> {
        self.graph
            .objects()
            .get(path)
            .and_then(|sources| sources.values().next().copied())
    }

    fn display_destination(&self, destination: &str) -> String {
        self.prefix
            .strip(destination)
            .unwrap_or_else(|| destination.to_string())
    }

    fn group_name(&mut self, group: &PatternGroup, pick: impl Fn(&PatternMember) -> &str, key: &str) -> String {
        let paths: Vec<&str> = group.members.iter().map(pick).collect();
        let name = name_by_common_prefix(&paths, self.root());
        self.names.claim(&name, key)
    }
}

/// Classify every node of `graph`.
pub fn classify(graph: &CompilationGraph, names: &mut NameRegistry, options: ClassifyOptions) -> Vec<Target> {
    Classifier::new(graph, names, options).classify()
}

/// Where an installed file lands: its directory when the file keeps its
/// name, the file path itself when it is renamed.
fn install_destination(target: &str, source: &str) -> String {
    if basename(target) == basename(source) {
        dirname(target).to_string()
    } else {
        target.to_string()
    }
}

fn member_fields(group: &PatternGroup) -> Vec<Vec<String>> {
    group.members.iter().map(|m| m.fields.clone()).collect()
}

fn is_prebuilt_library(path: &str) -> bool {
    let base = basename(path);
    base.contains(".so.")
        || [".a", ".so", ".dylib", ".lib"]
            .iter()
            .any(|ext| base.ends_with(ext))
}

fn same_sources(a: &OrderedSet<String>, b: &OrderedSet<String>) -> bool {
    !a.is_empty() && a.len() == b.len() && a.iter().all(|s| b.contains(s))
}
