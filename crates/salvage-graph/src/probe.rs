//! Missing-dependency discovery for compile entries.
//!
//! A compile step may include headers that another build step generates.
//! Those files are absent from a fresh tree and absent from the database
//! as sources, so the only way to learn about them is to ask the compiler.

use salvage_command::Command;
use salvage_common::{basename, resolve, OrderedSet, ProjectRoot};
use std::path::Path;
use std::process::Command as Process;

/// Finds files a compile step needs that do not exist on disk.
pub trait DependencyProbe {
    /// Project-relative paths (or absolute ones, for files outside the
    /// tree) of the missing dependencies of `source` under `command`.
    fn probe(&self, command: &Command, source: &str) -> OrderedSet<String>;
}

/// Never reports anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProbe;

impl DependencyProbe for NullProbe {
    fn probe(&self, _command: &Command, _source: &str) -> OrderedSet<String> {
        OrderedSet::new()
    }
}

/// Asks the recorded compiler for `-MM -MG` output.
///
/// Output is read from `<cwd>/.deps/<stem>.Po` when that sidecar exists and
/// written there after a compiler run when caching is on.
#[derive(Debug, Clone)]
pub struct CompilerProbe {
    root: ProjectRoot,
    cache: bool,
}

impl CompilerProbe {
    pub fn new(root: ProjectRoot, cache: bool) -> Self {
        Self { root, cache }
    }

    fn sidecar(command: &Command, source: &str) -> String {
        let base = basename(source);
        let stem = base.rsplit_once('.').map_or(base, |(stem, _)| stem);
        format!("{}/.deps/{}.Po", command.cwd, stem)
    }

    fn run_compiler(&self, command: &Command, source: &str) -> Option<String> {
        let mut cmd = Process::new(command.tool.as_str());
        cmd.current_dir(&command.cwd);
        cmd.args(dependency_args(command, source));

        let output = match cmd.output() {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Failed to run {} for dependencies of {}: {}", command.tool, source, e);
                return None;
            }
        };
        if !output.status.success() {
            tracing::debug!("{} exited with {} listing {}", command.tool, output.status, source);
        }
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn store(&self, path: &str, output: &str) {
        if let Some(dir) = Path::new(path).parent() {
            if let Err(e) = std::fs::create_dir_all(dir) {
                tracing::warn!("Failed to create {}: {}", dir.display(), e);
                return;
            }
        }
        if let Err(e) = std::fs::write(path, output) {
            tracing::warn!("Failed to cache dependencies in {}: {}", path, e);
        }
    }
}

impl DependencyProbe for CompilerProbe {
    fn probe(&self, command: &Command, source: &str) -> OrderedSet<String> {
        let source = resolve(source, &command.cwd);
        if !Path::new(&source).exists() {
            let mut missing = OrderedSet::new();
            missing.insert(self.root.strip(&source).unwrap_or(source));
            return missing;
        }

        let sidecar = Self::sidecar(command, &source);
        let output = match std::fs::read_to_string(&sidecar) {
            Ok(cached) => cached,
            Err(_) => {
                let Some(output) = self.run_compiler(command, &source) else {
                    return OrderedSet::new();
                };
                if self.cache {
                    self.store(&sidecar, &output);
                }
                output
            }
        };

        parse_dependency_output(&output, &command.cwd, &self.root)
            .into_iter()
            .filter(|relative| !Path::new(&self.root.resolve(relative, None)).exists())
            .collect()
    }
}

/// Arguments for a `-MM -MG` run reproducing the command's preprocessor
/// state.
pub fn dependency_args(command: &Command, source: &str) -> Vec<String> {
    let mut args = vec!["-MM".to_string(), "-MG".to_string(), source.to_string()];
    args.extend(command.definitions.iter().map(|d| format!("-D{}", d)));
    args.extend(command.includes.iter().map(|i| format!("-I{}", i)));
    for dir in &command.system_includes {
        args.push("-isystem".to_string());
        args.push(dir.clone());
    }
    for dir in &command.iquote_includes {
        args.push("-iquote".to_string());
        args.push(dir.clone());
    }
    if command.options.iter().any(|o| o == "-fPIC") {
        args.push("-fPIC".to_string());
    }
    args
}

/// Project-relative prerequisites from make-style dependency output.
/// Paths outside the project are dropped.
pub fn parse_dependency_output(output: &str, cwd: &str, root: &ProjectRoot) -> OrderedSet<String> {
    let joined = output.replace("\\\r\n", " ").replace("\\\n", " ");
    let mut depends = OrderedSet::new();

    for line in joined.lines() {
        let Some((rule, prerequisites)) = line.split_once(": ") else {
            continue;
        };
        if rule.trim().is_empty() {
            continue;
        }
        for file in prerequisites.split_whitespace() {
            if let Some(relative) = root.strip(&resolve(file, cwd)) {
                depends.insert(relative);
            }
        }
    }
    depends
}
