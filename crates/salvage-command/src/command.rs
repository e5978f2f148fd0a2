//! The normalized command model.

use salvage_common::{OrderedMap, OrderedSet};
use serde::Serialize;
use smol_str::SmolStr;

/// Placeholder library standing in for the platform thread library.
pub const THREAD_LIBS: &str = "${CMAKE_THREAD_LIBS_INIT}";

/// Symbolic prefix for files rewritten relative to the project root.
pub const PROJECT_ROOT_VAR: &str = "${CMAKE_SOURCE_DIR}";

/// What a command ultimately produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Linkage {
    /// An intermediate object file.
    Object,
    /// A linked program.
    Executable,
    /// A static archive.
    Static,
    /// A shared library.
    Shared,
    /// A single generated source file.
    Source,
    /// A compiled locale/translation artifact.
    Locale,
    /// A file copied into an install location.
    Install,
}

impl Linkage {
    /// Linked kinds are the ones other targets may depend on.
    pub fn is_linked(self) -> bool {
        !matches!(self, Linkage::Object | Linkage::Locale | Linkage::Install)
    }

    pub fn is_library(self) -> bool {
        matches!(self, Linkage::Static | Linkage::Shared)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Linkage::Object => "OBJECT",
            Linkage::Executable => "EXECUTABLE",
            Linkage::Static => "STATIC",
            Linkage::Shared => "SHARED",
            Linkage::Source => "SOURCE",
            Linkage::Locale => "LOCALE",
            Linkage::Install => "INSTALL",
        }
    }
}

impl std::fmt::Display for Linkage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which install variant an install command maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallKind {
    Files,
    Programs,
}

/// One canonical tool invocation.
///
/// The three include lists stay separate: quoted, system and regular
/// includes render differently and are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    /// Tool identity (`clang++`, `ar`, `install`, `moc`, ...).
    pub tool: SmolStr,
    /// Working directory of the invocation.
    pub cwd: String,
    pub linkage: Linkage,
    /// Passthrough compile options, in command-line order.
    pub options: Vec<String>,
    /// Preprocessor defines (`NAME` or `NAME="VALUE"`).
    pub definitions: Vec<String>,
    /// `-I` directories, absolute.
    pub includes: Vec<String>,
    /// `-isystem` directories, absolute.
    pub system_includes: Vec<String>,
    /// `-iquote` directories, absolute.
    pub iquote_includes: Vec<String>,
    /// Raw linker options.
    pub link_options: Vec<String>,
    /// External libraries and `-L`/`-m` pseudo-libraries, first-seen order.
    pub libs: OrderedSet<String>,
    /// Sub-targets this command links against, by path.
    pub referenced_libs: OrderedMap<String, Linkage>,
    /// Files the compiler needs that do not exist yet. Not part of the
    /// command's identity.
    pub missing_depends: OrderedSet<String>,
    pub compile_c_as_cxx: bool,
    pub use_thread: bool,
    /// Install destination (install commands only).
    pub destination: Option<String>,
    pub install_kind: Option<InstallKind>,
}

impl Command {
    pub fn new(tool: impl Into<SmolStr>, cwd: impl Into<String>, linkage: Linkage) -> Self {
        Self {
            tool: tool.into(),
            cwd: cwd.into(),
            linkage,
            options: Vec::new(),
            definitions: Vec::new(),
            includes: Vec::new(),
            system_includes: Vec::new(),
            iquote_includes: Vec::new(),
            link_options: Vec::new(),
            libs: OrderedSet::new(),
            referenced_libs: OrderedMap::new(),
            missing_depends: OrderedSet::new(),
            compile_c_as_cxx: false,
            use_thread: false,
            destination: None,
            install_kind: None,
        }
    }

    /// Frozen structural identity. Set-valued fields are sorted so
    /// insertion order does not matter.
    pub fn key(&self) -> CommandKey {
        let mut libs: Vec<String> = self.libs.iter().cloned().collect();
        libs.sort();
        let mut referenced_libs: Vec<(String, Linkage)> = self
            .referenced_libs
            .iter()
            .map(|(path, linkage)| (path.clone(), *linkage))
            .collect();
        referenced_libs.sort();

        CommandKey {
            tool: self.tool.clone(),
            cwd: self.cwd.clone(),
            linkage: self.linkage,
            options: self.options.clone(),
            definitions: self.definitions.clone(),
            includes: self.includes.clone(),
            system_includes: self.system_includes.clone(),
            iquote_includes: self.iquote_includes.clone(),
            link_options: self.link_options.clone(),
            libs,
            referenced_libs,
            compile_c_as_cxx: self.compile_c_as_cxx,
            use_thread: self.use_thread,
            destination: self.destination.clone(),
            install_kind: self.install_kind,
        }
    }

    /// Identity with the install destination blanked, so install commands
    /// that differ only in where they copy to compare equal.
    pub fn migration_key(&self) -> CommandKey {
        let mut key = self.key();
        key.destination = None;
        key
    }

    /// Point-wise union with `other`: lists concatenate without
    /// duplicates, sets union, scalars are filled only when empty.
    pub fn merge(&mut self, other: &Command) {
        extend_unique(&mut self.options, &other.options);
        extend_unique(&mut self.definitions, &other.definitions);
        extend_unique(&mut self.includes, &other.includes);
        extend_unique(&mut self.system_includes, &other.system_includes);
        extend_unique(&mut self.iquote_includes, &other.iquote_includes);
        extend_unique(&mut self.link_options, &other.link_options);
        self.libs.extend(other.libs.iter().cloned());
        for (path, linkage) in &other.referenced_libs {
            self.referenced_libs.entry(path.clone()).or_insert(*linkage);
        }
        self.missing_depends
            .extend(other.missing_depends.iter().cloned());

        if self.tool.is_empty() {
            self.tool = other.tool.clone();
        }
        if self.cwd.is_empty() {
            self.cwd = other.cwd.clone();
        }
        self.compile_c_as_cxx |= other.compile_c_as_cxx;
        self.use_thread |= other.use_thread;
        if self.destination.is_none() {
            self.destination = other.destination.clone();
        }
        if self.install_kind.is_none() {
            self.install_kind = other.install_kind;
        }
    }
}

fn extend_unique(values: &mut Vec<String>, more: &[String]) {
    for value in more {
        if !values.contains(value) {
            values.push(value.clone());
        }
    }
}

/// Hashable frozen form of a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandKey {
    tool: SmolStr,
    cwd: String,
    linkage: Linkage,
    options: Vec<String>,
    definitions: Vec<String>,
    includes: Vec<String>,
    system_includes: Vec<String>,
    iquote_includes: Vec<String>,
    link_options: Vec<String>,
    libs: Vec<String>,
    referenced_libs: Vec<(String, Linkage)>,
    compile_c_as_cxx: bool,
    use_thread: bool,
    destination: Option<String>,
    install_kind: Option<InstallKind>,
}
