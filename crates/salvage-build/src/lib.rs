//! Input loading for salvage.
//!
//! This crate provides:
//! - compile_commands.json parsing (including link/install records)
//! - Run configuration format (`salvage.toml`)
//!
//! # Example
//!
//! ```toml
//! # salvage.toml
//! [project]
//! name = "gdb"
//! root = "/git/gdb"
//!
//! [probe]
//! mode = "compiler"
//!
//! [packages.libraries]
//! z = "ZLIB::ZLIB"
//! ```

mod compile_commands;
mod config;
mod error;

pub use compile_commands::{split_command_line, CompilationDatabase, RawEntry};
pub use config::{
    InstallConfig, PackageTables, PatternConfig, ProbeConfig, ProbeMode, ProjectConfig,
    SalvageConfig,
};
pub use error::{BuildError, Result};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_and_database_together() {
        let config: SalvageConfig = toml::from_str(
            r#"
[project]
root = "/git/gdb"
            "#,
        )
        .expect("Failed to parse config");
        let db = CompilationDatabase::from_str(r#"[{"directory": "/git/gdb", "file": "a.c", "command": "cc -c a.c"}]"#)
            .expect("Failed to parse database");

        assert_eq!(config.project.root.as_deref(), Some("/git/gdb"));
        assert_eq!(db.entries()[0].file.as_deref(), Some("a.c"));
    }
}
