//! Canonical path handling.
//!
//! Every graph key is a canonical path: absolute, lexically normalised
//! (no `.`/`..`/duplicate separators, no trailing slash) and case-folded
//! on platforms with case-insensitive file systems. Normalisation never
//! touches the file system, so symlinks are kept as written.

/// Lexically normalise `path`.
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            _ => parts.push(part),
        }
    }

    let joined = parts.join("/");
    let normalized = if absolute {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    };

    if cfg!(windows) {
        normalized.to_lowercase()
    } else {
        normalized
    }
}

/// Resolve `path` against `cwd` into canonical form. An empty path
/// resolves to `cwd` itself.
pub fn resolve(path: &str, cwd: &str) -> String {
    if path.is_empty() {
        normalize(cwd)
    } else if path.starts_with('/') {
        normalize(path)
    } else {
        normalize(&format!("{}/{}", cwd, path))
    }
}

/// Relative path from `base` to `path`, both taken as absolute.
pub fn relative_to(path: &str, base: &str) -> String {
    let path = normalize(path);
    let base = normalize(base);
    let p: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let b: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();

    let common = p.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let mut parts: Vec<&str> = std::iter::repeat("..").take(b.len() - common).collect();
    parts.extend(&p[common..]);

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Final component of `path` (empty when `path` ends with a separator).
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Everything before the final separator.
pub fn dirname(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some(("", _)) => "/",
        Some((dir, _)) => dir,
        None => "",
    }
}

/// The project root all project-relative paths are expressed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRoot {
    directory: String,
}

impl ProjectRoot {
    pub fn new(directory: impl AsRef<str>) -> Self {
        let directory = directory.as_ref();
        Self {
            directory: if directory.is_empty() {
                String::new()
            } else {
                normalize(directory)
            },
        }
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// Resolve `path` against `cwd`, or against the root when no working
    /// directory is known.
    pub fn resolve(&self, path: &str, cwd: Option<&str>) -> String {
        resolve(path, cwd.unwrap_or(&self.directory))
    }

    /// Whether `path` lies inside the project tree.
    pub fn contains(&self, path: &str) -> bool {
        if self.directory.is_empty() {
            return false;
        }
        if self.directory == "/" {
            return path.starts_with('/');
        }
        path == self.directory
            || path
                .strip_prefix(self.directory.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Project-relative form of `path` when it lies inside the tree.
    pub fn strip(&self, path: &str) -> Option<String> {
        self.contains(path).then(|| relative_to(path, &self.directory))
    }

    /// Display form: relative when `path` sits under the root or under
    /// the root's parent, unchanged otherwise.
    pub fn relpath(&self, path: &str) -> String {
        if self.directory.is_empty() {
            return path.to_string();
        }
        let parent = dirname(&self.directory);
        let under_parent = parent.len() > 1
            && path
                .strip_prefix(parent)
                .is_some_and(|rest| rest.starts_with('/'));
        if self.contains(path) || under_parent {
            relative_to(path, &self.directory)
        } else {
            path.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_relative_notations() {
        assert_eq!(normalize("/git/gdb/./config/../gdb//x.c"), "/git/gdb/gdb/x.c");
        assert_eq!(normalize("/git/gdb/"), "/git/gdb");
        assert_eq!(normalize("/.."), "/");
        assert_eq!(normalize("../a/./b"), "../a/b");
        assert_eq!(normalize("a/.."), ".");
    }

    #[test]
    fn test_resolve_against_cwd() {
        assert_eq!(resolve("config", "/git/gdb"), "/git/gdb/config");
        assert_eq!(resolve("..", "/git/gdb"), "/git");
        assert_eq!(resolve("/usr/include", "/git/gdb"), "/usr/include");
        assert_eq!(resolve("", "/git/gdb/"), "/git/gdb");
        assert_eq!(
            resolve("../gdb/dictionary.c", "/git/gdb"),
            resolve("./dictionary.c", "/git/gdb/")
        );
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(relative_to("/git/gdb/doc/gdb.1", "/git/gdb"), "doc/gdb.1");
        assert_eq!(relative_to("/git/redist", "/git/gdb/Release"), "../../redist");
        assert_eq!(relative_to("/git/gdb", "/git/gdb"), ".");
    }

    #[test]
    fn test_basename_dirname() {
        assert_eq!(basename("/a/b/c.qm"), "c.qm");
        assert_eq!(basename("/a/b/"), "");
        assert_eq!(dirname("/a/b/c.qm"), "/a/b");
        assert_eq!(dirname("/c"), "/");
        assert_eq!(dirname("c"), "");
    }

    #[test]
    fn test_project_root_relpath() {
        let root = ProjectRoot::new("/git/goldendict/Release/");
        assert_eq!(root.directory(), "/git/goldendict/Release");
        assert!(root.contains("/git/goldendict/Release/main.o"));
        assert!(!root.contains("/git/goldendict/Releases/main.o"));
        assert_eq!(root.relpath("/git/goldendict/Release/main.o"), "main.o");
        assert_eq!(root.relpath("/git/goldendict/locale/ar.qm"), "../locale/ar.qm");
        assert_eq!(root.relpath("/usr/include"), "/usr/include");
        assert_eq!(root.strip("/usr/include"), None);
        assert_eq!(root.strip("/git/goldendict/Release/a/b.h").as_deref(), Some("a/b.h"));
    }
}
