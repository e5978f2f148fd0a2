//! Output stand-ins for a real build-system generator.

use crate::packages::PackageResolver;
use crate::BuildDescription;
use miette::Result;
use salvage_common::{OrderedMap, ProjectRoot};
use salvage_target::{CommonConfig, Target};
use serde::Serialize;
use std::fmt::Write;

/// Turns a build description into text.
pub trait Renderer {
    fn render(&self, description: &BuildDescription) -> Result<String>;
}

/// Package references for every library and include directory the
/// description mentions that a resolver recognises.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedPackages {
    pub libraries: OrderedMap<String, String>,
    pub includes: OrderedMap<String, String>,
}

impl ResolvedPackages {
    pub fn collect(description: &BuildDescription, resolver: &dyn PackageResolver) -> Self {
        let mut packages = Self::default();
        for target in &description.targets {
            packages.visit(target, resolver);
        }
        for common in description.common.values() {
            packages.add_includes(common.includes.iter().chain(&common.system_includes), resolver);
        }
        packages
    }

    fn visit(&mut self, target: &Target, resolver: &dyn PackageResolver) {
        if let Some(command) = &target.command {
            for lib in &command.libs {
                if self.libraries.contains_key(lib) {
                    continue;
                }
                if let Some(package) = resolver.resolve_library(lib) {
                    self.libraries.insert(lib.clone(), package);
                }
            }
            self.add_includes(command.includes.iter().chain(&command.system_includes), resolver);
        }
        for child in &target.children {
            self.visit(child, resolver);
        }
    }

    fn add_includes<'a>(&mut self, dirs: impl Iterator<Item = &'a String>, resolver: &dyn PackageResolver) {
        for dir in dirs {
            if self.includes.contains_key(dir) {
                continue;
            }
            if let Some(package) = resolver.resolve_include(dir) {
                self.includes.insert(dir.clone(), package);
            }
        }
    }
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    #[serde(flatten)]
    description: &'a BuildDescription,
    packages: ResolvedPackages,
}

/// Pretty JSON of the whole description plus resolved packages.
pub struct JsonRenderer<'r> {
    resolver: &'r dyn PackageResolver,
}

impl<'r> JsonRenderer<'r> {
    pub fn new(resolver: &'r dyn PackageResolver) -> Self {
        Self { resolver }
    }
}

impl Renderer for JsonRenderer<'_> {
    fn render(&self, description: &BuildDescription) -> Result<String> {
        let document = JsonDocument {
            description,
            packages: ResolvedPackages::collect(description, self.resolver),
        };
        serde_json::to_string_pretty(&document)
            .map_err(|e| miette::miette!("Failed to serialize build description: {}", e))
    }
}

/// One line per target, paths relative to the project root.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryRenderer;

impl Renderer for SummaryRenderer {
    fn render(&self, description: &BuildDescription) -> Result<String> {
        let root = ProjectRoot::new(&description.root);
        let mut out = String::new();
        let _ = writeln!(
            out,
            "project {} ({} targets)",
            description.project,
            description.targets.len()
        );
        for target in &description.targets {
            summarize(&mut out, target, &root, 0);
        }
        for (scope, common) in &description.common {
            summarize_common(&mut out, scope, common, &root);
        }
        Ok(out)
    }
}

fn summarize(out: &mut String, target: &Target, root: &ProjectRoot, depth: usize) {
    let _ = write!(
        out,
        "{:indent$}{} {} [{}]",
        "",
        target.kind,
        target.name,
        root.relpath(&target.scope),
        indent = depth * 2
    );
    if !target.fields.is_empty() {
        let _ = write!(out, " x{}", target.fields.len());
    }
    if !target.sources.is_empty() {
        let _ = write!(out, " sources={}", target.sources.len());
    }
    if !target.depends.is_empty() {
        let depends: Vec<String> = target.depends.iter().map(|d| root.relpath(d)).collect();
        let _ = write!(out, " depends={}", depends.join(","));
    }
    if !target.destinations.is_empty() {
        let destinations: Vec<&str> = target.destinations.iter().map(String::as_str).collect();
        let _ = write!(out, " dest={}", destinations.join(","));
    }
    if target.include_binary_dir {
        out.push_str(" binary-dir");
    }
    out.push('\n');

    for child in &target.children {
        summarize(out, child, root, depth + 1);
    }
}

fn summarize_common(out: &mut String, scope: &str, common: &CommonConfig, root: &ProjectRoot) {
    let _ = write!(out, "common [{}]", root.relpath(scope));
    let lists = [
        ("includes", &common.includes),
        ("system-includes", &common.system_includes),
        ("iquote-includes", &common.iquote_includes),
        ("options", &common.options),
        ("definitions", &common.definitions),
    ];
    for (label, values) in lists {
        if values.is_empty() {
            continue;
        }
        let shown: Vec<String> = values.iter().map(|v| root.relpath(v)).collect();
        let _ = write!(out, " {}={}", label, shown.join(","));
    }
    out.push('\n');
}
