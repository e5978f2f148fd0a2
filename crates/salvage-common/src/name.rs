//! Target-name derivation from artifact paths.

use crate::path::{basename, relative_to};

/// Characters allowed to survive in a target name: `[A-Za-z0-9_.+-]`.
pub fn is_allowed_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '+' | '-')
}

fn is_name_separator(c: char) -> bool {
    matches!(c, '-' | '_' | '.')
}

/// Basename without its last extension, with disallowed characters
/// replaced by `_` and a leading `lib` removed.
pub fn sanitize_target_name(path: &str) -> String {
    let base = basename(path);
    let stem = base.rsplit_once('.').map_or(base, |(stem, _)| stem);
    let name: String = stem
        .chars()
        .map(|c| if is_allowed_name_char(c) { c } else { '_' })
        .collect();

    match name.strip_prefix("lib") {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => name,
    }
}

/// Name a group of files after their common string prefix. Falls back
/// to the root-relative prefix when the prefix ends on a directory.
pub fn name_by_common_prefix<S: AsRef<str>>(files: &[S], root: &str) -> String {
    let prefix = common_prefix(files);
    if prefix.is_empty() {
        return String::new();
    }

    let name: String = basename(prefix.trim_end_matches(is_name_separator))
        .chars()
        .filter(|c| is_allowed_name_char(*c))
        .collect();
    if !name.is_empty() {
        return name;
    }

    let relative = relative_to(&prefix, root);
    let mut relative = relative.as_str();
    while let Some(rest) = relative.strip_prefix("../") {
        relative = rest;
    }
    relative
        .trim_end_matches(is_name_separator)
        .replace(|c| c == '/' || c == '.', "_")
        .chars()
        .filter(|c| is_allowed_name_char(*c))
        .collect()
}

fn common_prefix<S: AsRef<str>>(items: &[S]) -> String {
    let Some(first) = items.first().map(AsRef::as_ref) else {
        return String::new();
    };

    let mut len = first.len();
    for item in &items[1..] {
        let common = first
            .bytes()
            .zip(item.as_ref().bytes())
            .take_while(|(a, b)| a == b)
            .count();
        len = len.min(common);
    }
    while !first.is_char_boundary(len) {
        len -= 1;
    }
    first[..len].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_target_name() {
        assert_eq!(sanitize_target_name("/git/gdb/libbfd.a"), "bfd");
        assert_eq!(sanitize_target_name("/git/gdb/x86_64-pc-linux-gdb"), "x86_64-pc-linux-gdb");
        assert_eq!(sanitize_target_name("/a/libfoo.so.1"), "foo.so");
        assert_eq!(sanitize_target_name("/a/my prog@2.exe"), "my_prog_2");
        assert_eq!(sanitize_target_name("/a/lib.a"), "lib");
    }

    #[test]
    fn test_name_by_common_prefix() {
        let root = "/git/NLP/goldendict/Release";
        let paths = [
            "/git/NLP/goldendict/redist/goldendict.appdata.xml",
            "/git/NLP/goldendict/redist/icons/goldendict.png",
        ];
        assert_eq!(name_by_common_prefix(&paths, root), "redist");

        let root = "/git/Tools/gdb/";
        let paths = ["/git/Tools/gdb/contrib/xdx", "/git/Tools/gdb/contrib/gdb-add-index.sh"];
        assert_eq!(name_by_common_prefix(&paths, root), "contrib");

        let paths = ["/git/Tools/gdb/contrib/gdx", "/git/Tools/gdb/contrib/gdb-add-index.sh"];
        assert_eq!(name_by_common_prefix(&paths, root), "gd");

        let single = ["/git/Tools/gdb/doc/gdb.1"];
        assert_eq!(name_by_common_prefix(&single, root), "gdb.1");
    }
}
