//! compile_commands.json loading.
//!
//! The database is a flat JSON array. Each record names a working
//! directory, one input file and the tool invocation, either as a single
//! shell string (`command`) or pre-split (`arguments`). Build loggers also
//! record link, archive and install invocations in the same shape, one
//! record per input file.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single record from compile_commands.json.
///
/// Every field is optional: loggers emit `{}` for invocations they could
/// not attribute, and those records are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntry {
    /// The working directory of the invocation.
    #[serde(default)]
    pub directory: Option<String>,

    /// The input file path.
    #[serde(default)]
    pub file: Option<String>,

    /// The full command line as one shell string.
    #[serde(default)]
    pub command: Option<String>,

    /// The command line in array form.
    #[serde(default)]
    pub arguments: Option<Vec<String>>,

    /// Output file, when the logger recorded one.
    #[serde(default)]
    pub output: Option<String>,
}

impl RawEntry {
    /// Whether this record carries nothing to index.
    pub fn is_empty(&self) -> bool {
        self.file.is_none() || (self.command.is_none() && self.arguments.is_none())
    }

    /// The invocation as tokens. `arguments` wins over `command`.
    pub fn tokens(&self) -> Vec<String> {
        if let Some(args) = &self.arguments {
            return args.clone();
        }
        match &self.command {
            Some(cmd) => split_command_line(cmd),
            None => Vec::new(),
        }
    }
}

/// Split a command string with POSIX shell-word rules, falling back to
/// whitespace splitting when quotes are unbalanced.
pub fn split_command_line(cmd: &str) -> Vec<String> {
    match shlex::split(cmd) {
        Some(words) => words,
        None => {
            tracing::warn!("Unbalanced quoting, splitting on whitespace: {}", cmd);
            cmd.split_whitespace().map(|s| s.to_string()).collect()
        }
    }
}

/// Collection of records (from compile_commands.json).
#[derive(Debug, Clone, Default)]
pub struct CompilationDatabase {
    entries: Vec<RawEntry>,
    directory: Option<String>,
}

impl CompilationDatabase {
    /// Load records from a JSON file. The file's directory becomes the
    /// default project root.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(crate::BuildError::read(path))?;
        let mut db = Self::from_str(&content)?;
        let absolute = std::fs::canonicalize(path).map_err(crate::BuildError::read(path))?;
        db.directory = absolute
            .parent()
            .map(|dir| dir.to_string_lossy().into_owned());
        Ok(db)
    }

    /// Parse records from a JSON string.
    pub fn from_str(json: &str) -> crate::Result<Self> {
        let entries: Vec<RawEntry> = serde_json::from_str(json)?;
        Ok(Self {
            entries,
            directory: None,
        })
    }

    /// Set the directory relative records resolve against.
    pub fn with_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// Get all records.
    pub fn entries(&self) -> &[RawEntry] {
        &self.entries
    }

    /// Directory containing the database file, if loaded from disk.
    pub fn directory(&self) -> Option<&str> {
        self.directory.as_deref()
    }
}
