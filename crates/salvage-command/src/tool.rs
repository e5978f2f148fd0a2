//! Tool identification.

use salvage_common::basename;
use serde::Serialize;
use smol_str::SmolStr;

/// Qt code generators. Each produces one source file that a later
/// compile step consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QtGenerator {
    Moc,
    Uic,
    Rcc,
}

impl QtGenerator {
    pub fn as_str(self) -> &'static str {
        match self {
            QtGenerator::Moc => "moc",
            QtGenerator::Uic => "uic",
            QtGenerator::Rcc => "rcc",
        }
    }
}

/// Grammar selector. Unknown tools fall through to [`Tool::Cxx`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    /// The generic C/C++ driver grammar.
    Cxx,
    Archiver,
    Installer,
    Qmake,
    Qt(QtGenerator),
    Lrelease,
    GenMarshal,
    DbusBindingTool,
    Msgfmt,
    Git,
}

impl Tool {
    /// Select the grammar for a tool basename.
    pub fn from_name(name: &str) -> Self {
        match name {
            "install" | "ginstall" => Tool::Installer,
            "glib-genmarshal" => Tool::GenMarshal,
            "dbus-binding-tool" => Tool::DbusBindingTool,
            "msgfmt" => Tool::Msgfmt,
            "git" => Tool::Git,
            "ar" => Tool::Archiver,
            _ if name.ends_with("-ar") => Tool::Archiver,
            _ if name.starts_with("qmake") => Tool::Qmake,
            _ if name.starts_with("lrelease") => Tool::Lrelease,
            _ if name.starts_with("moc") => Tool::Qt(QtGenerator::Moc),
            _ if name.starts_with("uic") => Tool::Qt(QtGenerator::Uic),
            _ if name.starts_with("rcc") => Tool::Qt(QtGenerator::Rcc),
            _ => Tool::Cxx,
        }
    }

    pub fn qt_generator(self) -> Option<QtGenerator> {
        match self {
            Tool::Qt(generator) => Some(generator),
            _ => None,
        }
    }
}

fn is_interpreter(name: &str) -> bool {
    name.starts_with("python") || matches!(name, "perl" | "sh" | "bash")
}

/// Work out the tool identity from the leading tokens.
///
/// Returns the identity and the number of tokens it consumed. Script
/// launchers are skipped; `ccache` resolves to the compiler it wraps, or
/// to `clang` when it is handed flags directly.
pub fn identify(tokens: &[String], source: &str) -> Option<(SmolStr, usize)> {
    let first = basename(tokens.first()?);
    if is_interpreter(first) {
        return match tokens.get(1) {
            Some(script) => Some((SmolStr::new(basename(script)), 2)),
            None => Some((SmolStr::new(first), 1)),
        };
    }

    if first == "ccache" {
        return match tokens.get(1) {
            Some(next) if !next.starts_with('-') && basename(next) != basename(source) => {
                Some((SmolStr::new(basename(next)), 2))
            }
            _ => Some((SmolStr::new("clang"), 1)),
        };
    }

    Some((SmolStr::new(first), 1))
}

/// Whether the driver compiles C++ by default.
pub fn is_cxx_driver(name: &str) -> bool {
    name.ends_with("++")
}

/// The C++ flavour of a C driver (`gcc` -> `g++`), if it has one.
pub fn cxx_variant(name: &str) -> Option<SmolStr> {
    for (c, cxx) in [("clang", "clang++"), ("gcc", "g++"), ("cc", "c++")] {
        if let Some(prefix) = name.strip_suffix(c) {
            if prefix.is_empty() || prefix.ends_with('-') {
                return Some(SmolStr::new(format!("{}{}", prefix, cxx)));
            }
        }
    }
    None
}

/// The C flavour of a C++ driver (`clang++` -> `clang`), if it has one.
pub fn c_variant(name: &str) -> Option<SmolStr> {
    for (c, cxx) in [("clang", "clang++"), ("gcc", "g++"), ("cc", "c++")] {
        if let Some(prefix) = name.strip_suffix(cxx) {
            if prefix.is_empty() || prefix.ends_with('-') {
                return Some(SmolStr::new(format!("{}{}", prefix, c)));
            }
        }
    }
    None
}
