//! External package resolution.

use salvage_build::PackageTables;
use salvage_common::OrderedMap;

/// Maps libraries and include directories to the external packages that
/// provide them.
pub trait PackageResolver {
    /// Package reference for a library given to `-l`.
    fn resolve_library(&self, name: &str) -> Option<String>;

    /// Package reference for an include directory.
    fn resolve_include(&self, path: &str) -> Option<String>;
}

/// Resolver backed by the `[packages]` tables of the config file.
#[derive(Debug, Clone, Default)]
pub struct TablePackageResolver {
    libraries: OrderedMap<String, String>,
    includes: OrderedMap<String, String>,
}

impl TablePackageResolver {
    pub fn new(tables: &PackageTables) -> Self {
        Self {
            libraries: tables.libraries.clone(),
            includes: tables
                .includes
                .iter()
                .map(|(dir, package)| (dir.trim_end_matches('/').to_string(), package.clone()))
                .collect(),
        }
    }
}

impl PackageResolver for TablePackageResolver {
    fn resolve_library(&self, name: &str) -> Option<String> {
        let name = name.strip_prefix("-l").unwrap_or(name);
        self.libraries.get(name).cloned()
    }

    /// The deepest table directory containing `path` wins.
    fn resolve_include(&self, path: &str) -> Option<String> {
        let path = path.trim_end_matches('/');
        self.includes
            .iter()
            .filter(|(dir, _)| {
                path == dir.as_str()
                    || path
                        .strip_prefix(dir.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .max_by_key(|(dir, _)| dir.len())
            .map(|(_, package)| package.clone())
    }
}
