//! Run configuration (salvage.toml format).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration. Every table is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SalvageConfig {
    /// Project metadata.
    pub project: ProjectConfig,

    /// Dependency probing.
    pub probe: ProbeConfig,

    /// Pattern inference limits.
    pub pattern: PatternConfig,

    /// Install layout.
    pub install: InstallConfig,

    /// External package tables consumed by renderers.
    pub packages: PackageTables,
}

/// Project metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Project name (default: name of the root directory).
    pub name: Option<String>,

    /// Project root (default: directory of the compilation database).
    pub root: Option<String>,

    /// Put every target into the root scope instead of one scope per
    /// working directory.
    pub single_scope: bool,
}

/// How missing dependencies are discovered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeMode {
    /// Never probe.
    #[default]
    None,
    /// Ask the recorded compiler for its dependency list.
    Compiler,
}

/// Dependency probe settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub mode: ProbeMode,

    /// Write `.deps/<stem>.Po` sidecars next to the working directory.
    pub cache: bool,
}

/// Pattern engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Upper bound on captured fields per template.
    pub max_fields: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self { max_fields: 1 }
    }
}

/// Install layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Prefix install destinations are reported relative to.
    pub prefix: String,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            prefix: "/usr/local".to_string(),
        }
    }
}

/// Static library/include to package tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageTables {
    /// Library name (as given to `-l`) to package reference.
    pub libraries: IndexMap<String, String>,

    /// Include directory to package reference.
    pub includes: IndexMap<String, String>,
}

impl SalvageConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(crate::BuildError::read(path))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> crate::Result<Self> {
        let config: SalvageConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> crate::Result<()> {
        if self.pattern.max_fields == 0 {
            return Err(crate::BuildError::Validation(
                "pattern.max_fields must be at least 1".to_string(),
            ));
        }
        if self.project.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(crate::BuildError::Validation(
                "project.name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Project name, falling back to the last component of `root`.
    pub fn project_name(&self, root: &str) -> String {
        if let Some(name) = &self.project.name {
            return name.clone();
        }
        let trimmed = root.trim_end_matches('/');
        match trimmed.rsplit('/').next() {
            Some(last) if !last.is_empty() => last.to_string(),
            _ => "project".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_from_empty_config() {
        let config = SalvageConfig::from_str("").unwrap();
        assert_eq!(config.pattern.max_fields, 1);
        assert_eq!(config.probe.mode, ProbeMode::None);
        assert_eq!(config.install.prefix, "/usr/local");
        assert!(!config.project.single_scope);
        assert_eq!(config.project_name("/git/gdb/"), "gdb");
        assert_eq!(config.project_name("/"), "project");
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
[project]
name = "goldendict"
root = "/git/goldendict"
single_scope = true

[probe]
mode = "compiler"
cache = true

[pattern]
max_fields = 2

[packages.libraries]
z = "ZLIB::ZLIB"
hunspell = "PkgConfig::HUNSPELL"

[packages.includes]
"/usr/include/qt5" = "Qt5::Core"
        "#;

        let config = SalvageConfig::from_str(toml).expect("Failed to parse config");
        assert_eq!(config.project_name("/ignored"), "goldendict");
        assert_eq!(config.project.root.as_deref(), Some("/git/goldendict"));
        assert_eq!(config.probe.mode, ProbeMode::Compiler);
        assert!(config.probe.cache);
        assert_eq!(config.pattern.max_fields, 2);
        assert_eq!(config.packages.libraries.len(), 2);
        assert_eq!(config.packages.libraries["hunspell"], "PkgConfig::HUNSPELL");
        assert_eq!(config.packages.includes["/usr/include/qt5"], "Qt5::Core");
    }

    #[test]
    fn test_validation_rejects_zero_fields() {
        let err = SalvageConfig::from_str("[pattern]\nmax_fields = 0\n").unwrap_err();
        assert!(matches!(err, crate::BuildError::Validation(_)));

        let err = SalvageConfig::from_str("[project]\nname = \" \"\n").unwrap_err();
        assert!(matches!(err, crate::BuildError::Validation(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "[install]\nprefix = \"/opt\"").unwrap();

        let config = SalvageConfig::from_file(file.path()).unwrap();
        assert_eq!(config.install.prefix, "/opt");

        let missing = file.path().with_extension("missing");
        let err = SalvageConfig::from_file(&missing).unwrap_err();
        assert!(matches!(err, crate::BuildError::ReadInput { .. }));
    }
}
