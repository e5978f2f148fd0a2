//! Classified build targets.

use salvage_command::{Command, InstallKind};
use salvage_common::OrderedSet;
use serde::Serialize;
use std::fmt;

/// Library flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LibraryType {
    Static,
    Shared,
    /// Static and shared forms built from the same sources.
    Both,
    /// Compiled objects never linked into anything.
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "variant", rename_all = "snake_case")]
pub enum TargetKind {
    Executable,
    Library(LibraryType),
    CustomCommand,
    Locale,
    Install(InstallKind),
    /// Replicates its children once per captured field value.
    ForeachWrapper,
}

impl TargetKind {
    /// Kinds that compile code and carry compile configuration.
    pub fn is_compiled(self) -> bool {
        matches!(self, TargetKind::Executable | TargetKind::Library(_))
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Executable => write!(f, "executable"),
            TargetKind::Library(LibraryType::Static) => write!(f, "static-library"),
            TargetKind::Library(LibraryType::Shared) => write!(f, "shared-library"),
            TargetKind::Library(LibraryType::Both) => write!(f, "library"),
            TargetKind::Library(LibraryType::Object) => write!(f, "object-library"),
            TargetKind::CustomCommand => write!(f, "custom-command"),
            TargetKind::Locale => write!(f, "locale"),
            TargetKind::Install(InstallKind::Files) => write!(f, "install-files"),
            TargetKind::Install(InstallKind::Programs) => write!(f, "install-programs"),
            TargetKind::ForeachWrapper => write!(f, "foreach"),
        }
    }
}

fn is_empty_set(set: &OrderedSet<String>) -> bool {
    set.is_empty()
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// One build-description target.
#[derive(Debug, Clone, Serialize)]
pub struct Target {
    pub kind: TargetKind,
    pub name: String,
    /// Produced artifact (a `%(N)s` template inside a wrapper).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Output scope: the producing command's directory, or the project
    /// root in single-scope runs.
    pub scope: String,
    /// Effective configuration: for compiled targets the union of the link
    /// command and every compile command feeding it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Command>,
    #[serde(skip_serializing_if = "is_empty_set")]
    pub sources: OrderedSet<String>,
    /// Library target names, generated sources and prebuilt archives this
    /// target links against.
    #[serde(skip_serializing_if = "is_empty_set")]
    pub referenced_libs: OrderedSet<String>,
    /// Names of targets that must be built first, or files they need.
    #[serde(skip_serializing_if = "is_empty_set")]
    pub depends: OrderedSet<String>,
    #[serde(skip_serializing_if = "is_empty_set")]
    pub destinations: OrderedSet<String>,
    /// Sources include generated files living in the build directory.
    #[serde(skip_serializing_if = "is_false")]
    pub include_binary_dir: bool,
    /// Captured values per iteration (one entry per template field).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Target>,
}

impl Target {
    pub fn new(kind: TargetKind, name: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            path: None,
            scope: scope.into(),
            command: None,
            sources: OrderedSet::new(),
            referenced_libs: OrderedSet::new(),
            depends: OrderedSet::new(),
            destinations: OrderedSet::new(),
            include_binary_dir: false,
            fields: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_command(mut self, command: Command) -> Self {
        self.command = Some(command);
        self
    }

    /// A wrapper replicating `child` for every value in `fields`.
    pub fn foreach(name: impl Into<String>, scope: impl Into<String>, fields: Vec<Vec<String>>, child: Target) -> Self {
        let mut wrapper = Self::new(TargetKind::ForeachWrapper, name, scope);
        wrapper.fields = fields;
        wrapper.children.push(child);
        wrapper
    }
}
