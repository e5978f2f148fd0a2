//! Per-tool command-line grammars.
//!
//! Every grammar is total: a token no rule claims is kept verbatim as an
//! option (or ignored when it is a plain input file). Parsing never fails.

use crate::command::{Command, InstallKind, Linkage, PROJECT_ROOT_VAR, THREAD_LIBS};
use crate::tool::{c_variant, cxx_variant, identify, is_cxx_driver, Tool};
use salvage_common::{basename, dirname, resolve, ProjectRoot};
use std::path::Path;

/// Result of parsing one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub tool: Tool,
    pub command: Command,
    /// Absolute output path, when the invocation names one.
    pub target: Option<String>,
}

/// `-Wl,` keys whose value is a file.
const LINKER_FILE_KEYS: &[&str] = &[
    "-c",
    "--mri-script",
    "-T",
    "--script",
    "--default-script",
    "--retain-symbols-file",
    "--version-script",
    "--dynamic-list",
    "-h",
    "-soname",
    "--soname",
];

type Words<'a> = std::slice::Iter<'a, String>;

fn next_arg(words: &mut Words<'_>) -> String {
    words.next().cloned().unwrap_or_default()
}

/// Parse a tokenised invocation of any supported tool.
///
/// `source` and `cwd` may be relative; `source` is resolved against `cwd`,
/// and `cwd` against the project root.
pub fn parse_command(tokens: &[String], source: &str, cwd: &str, root: &ProjectRoot) -> Parsed {
    let cwd = root.resolve(cwd, None);
    let source = resolve(source, &cwd);

    let Some((name, consumed)) = identify(tokens, &source) else {
        return Parsed {
            tool: Tool::Cxx,
            command: Command::new("", cwd, Linkage::Executable),
            target: None,
        };
    };

    let tool = Tool::from_name(&name);
    let mut parser = Parser {
        command: Command::new(name, cwd.clone(), initial_linkage(tool)),
        source: &source,
        root,
        target: None,
    };
    let mut words = tokens[consumed..].iter();

    match tool {
        Tool::Cxx => parser.parse_cxx(&mut words),
        Tool::Archiver => parser.parse_archiver(&mut words),
        Tool::Installer => parser.parse_install(&mut words),
        Tool::Qmake => parser.parse_qmake(&mut words),
        Tool::Qt(_) => parser.parse_qt(&mut words),
        Tool::Lrelease => parser.parse_output_flag(&mut words, "-qm"),
        Tool::Msgfmt => parser.parse_output_flag(&mut words, "-o"),
        Tool::GenMarshal => parser.parse_output_flag(&mut words, "--output"),
        Tool::DbusBindingTool => parser.parse_output_flag(&mut words, "--output"),
        Tool::Git => parser.parse_git(&mut words),
    }

    let Parser {
        mut command,
        target,
        ..
    } = parser;
    if is_cxx_driver(&command.tool) && source.ends_with(".c") {
        command.compile_c_as_cxx = true;
    }

    let target = match (tool, target) {
        (_, Some(target)) => Some(target),
        (Tool::Cxx, None) => Some(default_target(&command, &source)),
        (_, None) => None,
    };
    let target = target.map(|t| resolve(&t, &cwd));

    Parsed {
        tool,
        command,
        target,
    }
}

fn initial_linkage(tool: Tool) -> Linkage {
    match tool {
        Tool::Cxx => Linkage::Executable,
        Tool::Archiver => Linkage::Static,
        Tool::Installer | Tool::Qmake => Linkage::Install,
        Tool::Lrelease | Tool::Msgfmt => Linkage::Locale,
        Tool::Qt(_) | Tool::GenMarshal | Tool::DbusBindingTool | Tool::Git => Linkage::Source,
    }
}

/// Output name a compiler picks when `-o` is absent.
fn default_target(command: &Command, source: &str) -> String {
    if command.linkage == Linkage::Object {
        let base = basename(source);
        let stem = base.rsplit_once('.').map_or(base, |(stem, _)| stem);
        format!("{}.o", stem)
    } else {
        "a.out".to_string()
    }
}

/// Split an install argument into `(target, destination)`.
///
/// An existing directory receives the source under its own basename. An
/// argument that repeats the source's basename installs into its parent.
/// Anything else is both the installed file and the destination.
pub fn resolve_destination(path: &str, cwd: &str, source: &str) -> (String, String) {
    let target = resolve(path, cwd);
    if Path::new(&target).is_dir() {
        let file = format!("{}/{}", target.trim_end_matches('/'), basename(source));
        return (file, target);
    }
    if basename(&target) == basename(source) {
        let destination = dirname(&target).to_string();
        (target, destination)
    } else {
        (target.clone(), target)
    }
}

/// `NAME=VALUE` defines keep their value quoted; bare names pass through.
fn normalize_define(define: &str) -> String {
    match define.split_once('=') {
        Some((name, value)) if !name.is_empty() => {
            let value = value.trim_matches(|c| c == '"' || c == '\'');
            if value.is_empty() {
                define.to_string()
            } else {
                format!("{}=\"{}\"", name, value)
            }
        }
        _ => define.to_string(),
    }
}

/// Octal or symbolic install mode granting execute permission.
fn is_executable_mode(mode: &str) -> bool {
    if mode.chars().all(|c| c.is_ascii_digit()) {
        mode.chars()
            .filter_map(|c| c.to_digit(8))
            .any(|bits| bits & 1 == 1)
    } else {
        mode.contains('x')
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

struct Parser<'a> {
    command: Command,
    source: &'a str,
    root: &'a ProjectRoot,
    target: Option<String>,
}

impl Parser<'_> {
    fn resolve(&self, path: &str) -> String {
        resolve(path, &self.command.cwd)
    }

    fn add_include(&mut self, dir: &str) {
        let dir = self.resolve(dir);
        push_unique(&mut self.command.includes, dir);
    }

    fn add_define(&mut self, define: &str) {
        self.command.definitions.push(normalize_define(define));
    }

    /// Switch between the C and C++ flavour of the driver after `-x`.
    fn set_language(&mut self, lang: &str) {
        let switched = match lang {
            "c++" | "c++-header" => cxx_variant(&self.command.tool),
            "c" | "c-header" => c_variant(&self.command.tool),
            _ => None,
        };
        if let Some(tool) = switched {
            self.command.tool = tool;
        }
        self.command.options.push(format!("-x {}", lang));
    }

    fn parse_cxx(&mut self, words: &mut Words<'_>) {
        let mut object = false;
        let mut shared = false;

        while let Some(word) = words.next() {
            let word = word.as_str();
            match word {
                "-o" => self.target = Some(next_arg(words)),
                "-c" => object = true,
                "-shared" => shared = true,
                "-pthread" => {
                    self.command.libs.insert(THREAD_LIBS.to_string());
                    self.command.use_thread = true;
                }
                "-I" => {
                    let dir = next_arg(words);
                    self.add_include(&dir);
                }
                "-D" => {
                    let define = next_arg(words);
                    self.add_define(&define);
                }
                "-isystem" => {
                    let dir = self.resolve(&next_arg(words));
                    push_unique(&mut self.command.system_includes, dir);
                }
                "-iquote" => {
                    let dir = self.resolve(&next_arg(words));
                    push_unique(&mut self.command.iquote_includes, dir);
                }
                "-x" => {
                    let lang = next_arg(words);
                    self.set_language(&lang);
                }
                "-arch" | "-include" => {
                    let value = next_arg(words);
                    self.command.options.push(format!("{} {}", word, value));
                }
                "-z" | "-Xlinker" => {
                    let value = next_arg(words);
                    self.command.link_options.push(format!("{} {}", word, value));
                }
                "-MT" | "-MF" | "-MQ" | "-ccc-gcc-name" => {
                    words.next();
                }
                "-L" => {
                    let dir = next_arg(words);
                    self.command.libs.insert(format!("-L{}", dir));
                }
                "-l" => {
                    let lib = next_arg(words);
                    self.command.libs.insert(lib);
                }
                "-g" | "-O" | "-O1" | "-O2" | "-O3" => {}
                _ if word.starts_with("-M") => {}
                _ if word.starts_with("-Wl,") => self.parse_link_option(word),
                _ if word.starts_with("-isystem") => {
                    let dir = self.resolve(&word["-isystem".len()..]);
                    push_unique(&mut self.command.system_includes, dir);
                }
                _ if word.starts_with("-iquote") => {
                    let dir = self.resolve(&word["-iquote".len()..]);
                    push_unique(&mut self.command.iquote_includes, dir);
                }
                _ if word.starts_with("-I") => self.add_include(&word[2..]),
                _ if word.starts_with("-D") => self.add_define(&word[2..]),
                _ if word.starts_with("-L") => {
                    self.command.libs.insert(word.to_string());
                }
                _ if word.starts_with("-l") => {
                    self.command.libs.insert(word[2..].to_string());
                }
                _ if word.starts_with("-x") => self.set_language(&word[2..]),
                _ if word.starts_with("-m") => {
                    self.command.options.push(word.to_string());
                    self.command.libs.insert(word.to_string());
                }
                _ if word.starts_with('-') => self.command.options.push(word.to_string()),
                _ => {}
            }
        }

        if object {
            self.command.linkage = Linkage::Object;
        } else if shared {
            self.command.linkage = Linkage::Shared;
        }
    }

    /// `-Wl,KEY=VALUE` and `-Wl,KEY,VALUE`.
    fn parse_link_option(&mut self, word: &str) {
        let body = &word["-Wl,".len()..];
        let pair = body.split_once('=').or_else(|| {
            let mut parts = body.splitn(3, ',');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(key), Some(value), None) if LINKER_FILE_KEYS.contains(&key) => {
                    Some((key, value))
                }
                _ => None,
            }
        });

        if let Some((key, value)) = pair {
            if LINKER_FILE_KEYS.contains(&key) {
                let file = self.resolve(value);
                if matches!(key, "-h" | "-soname" | "--soname") && self.target.is_none() {
                    self.target = Some(file.clone());
                }
                let file = match self.root.strip(&file) {
                    Some(relative) => format!("{}/{}", PROJECT_ROOT_VAR, relative),
                    None => file,
                };
                self.command.link_options.push(format!("-Wl,{}={}", key, file));
                return;
            }
        }

        if body.starts_with("-O") || body == "-g" {
            return;
        }
        self.command.link_options.push(word.to_string());
    }

    fn parse_archiver(&mut self, words: &mut Words<'_>) {
        let mut seen_operation = false;
        while let Some(word) = words.next() {
            let creates = word.contains('c') || word.contains('q');
            if word.starts_with('-') {
                if creates {
                    self.target = Some(next_arg(words));
                    return;
                }
                self.command.options.push(word.clone());
            } else if !seen_operation {
                seen_operation = true;
                if creates {
                    self.target = Some(next_arg(words));
                    return;
                }
                self.command.options.push(word.clone());
            }
        }
    }

    fn is_source(&self, word: &str) -> bool {
        self.resolve(word) == self.source
    }

    fn set_install_target(&mut self, word: &str) {
        let (target, destination) = resolve_destination(word, &self.command.cwd, self.source);
        self.target = Some(target);
        self.command.destination = Some(destination);
    }

    fn parse_install(&mut self, words: &mut Words<'_>) {
        let mut kind = InstallKind::Files;
        let mut directory = None;

        while let Some(word) = words.next() {
            match word.as_str() {
                "-m" | "--mode" => {
                    let mode = next_arg(words);
                    if is_executable_mode(&mode) {
                        kind = InstallKind::Programs;
                    }
                    self.command.options.push(format!("-m {}", mode));
                }
                "-o" | "-g" | "--owner" | "--group" => {
                    let value = next_arg(words);
                    self.command.options.push(format!("{} {}", word, value));
                }
                "-t" | "--target-directory" => directory = Some(next_arg(words)),
                w if w.starts_with('-') => self.command.options.push(w.to_string()),
                w if self.is_source(w) => {}
                w => self.set_install_target(w),
            }
        }

        if let Some(dir) = directory {
            let dir = self.resolve(&dir);
            self.target = Some(format!("{}/{}", dir, basename(self.source)));
            self.command.destination = Some(dir);
        }
        self.command.install_kind = Some(kind);
    }

    fn parse_qmake(&mut self, words: &mut Words<'_>) {
        let mut kind = InstallKind::Files;
        while let Some(word) = words.next() {
            match word.as_str() {
                "-install" => {
                    let action = next_arg(words);
                    self.command.options.push(format!("-install {}", action));
                }
                "-exe" => {
                    kind = InstallKind::Programs;
                    self.command.options.push(word.clone());
                }
                w if w.starts_with('-') => self.command.options.push(w.to_string()),
                w if self.is_source(w) => {}
                w => self.set_install_target(w),
            }
        }
        self.command.install_kind = Some(kind);
    }

    fn parse_qt(&mut self, words: &mut Words<'_>) {
        while let Some(word) = words.next() {
            let word = word.as_str();
            match word {
                "" => {}
                "-o" => self.target = Some(next_arg(words)),
                "--include" => {
                    let header = self.resolve(&next_arg(words));
                    self.command.missing_depends.insert(header);
                }
                "-I" => {
                    let dir = next_arg(words);
                    self.add_include(&dir);
                }
                "-D" => {
                    let define = next_arg(words);
                    self.add_define(&define);
                }
                "-name" => {
                    let value = next_arg(words);
                    self.command.options.push(format!("-name {}", value));
                }
                _ if word.starts_with("-I") => self.add_include(&word[2..]),
                _ if word.starts_with("-D") => self.add_define(&word[2..]),
                _ if word.starts_with('-') => self.command.options.push(word.to_string()),
                _ => {}
            }
        }
    }

    /// Tools whose only interesting syntax is one output flag, either
    /// split (`FLAG PATH`) or joined (`FLAG=PATH`).
    fn parse_output_flag(&mut self, words: &mut Words<'_>, flag: &str) {
        while let Some(word) = words.next() {
            let word = word.as_str();
            if word == flag {
                self.target = Some(next_arg(words));
            } else if let Some(path) = word
                .strip_prefix(flag)
                .and_then(|rest| rest.strip_prefix('='))
            {
                self.target = Some(path.to_string());
            } else if word.starts_with('-') {
                self.command.options.push(word.to_string());
            }
        }
    }

    fn parse_git(&mut self, words: &mut Words<'_>) {
        while let Some(word) = words.next() {
            if word == ">" {
                self.target = Some(next_arg(words));
            } else {
                self.command.options.push(word.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CXX_LINE: &[&str] = &[
        "/usr/bin/ccache", "-x", "c++", "-g", "-O2", "-I.", "-Iconfig",
        "-DLOCALEDIR=\"/usr/local/share/locale\"", "-DHAVE_CONFIG_H",
        "-I..", "-I.", "-I../include",
        "-Wall", "-Wpointer-arith", "-Wno-unused", "-Werror",
        "-c", "-o", "dictionary.o",
        "-MT", "dictionary.o", "-MMD", "-MP", "-MF", "./.deps/dictionary.Tpo",
        "dictionary.c",
    ];

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn split(line: &str) -> Vec<String> {
        shlex::split(line).expect("balanced quoting")
    }

    fn gdb_root() -> ProjectRoot {
        ProjectRoot::new("/git/gdb")
    }

    #[test]
    fn test_cxx_through_ccache() {
        let parsed = parse_command(&tokens(CXX_LINE), "/git/gdb/dictionary.c", "/git/gdb", &gdb_root());
        let command = &parsed.command;

        assert_eq!(parsed.tool, Tool::Cxx);
        assert_eq!(parsed.target.as_deref(), Some("/git/gdb/dictionary.o"));
        assert_eq!(command.tool, "clang++");
        assert_eq!(command.linkage, Linkage::Object);
        assert!(command.compile_c_as_cxx);
        assert_eq!(
            command.includes,
            vec!["/git/gdb", "/git/gdb/config", "/git", "/git/include"]
        );
        assert_eq!(
            command.definitions,
            vec![r#"LOCALEDIR="/usr/local/share/locale""#, "HAVE_CONFIG_H"]
        );
        assert_eq!(
            command.options,
            vec!["-x c++", "-Wall", "-Wpointer-arith", "-Wno-unused", "-Werror"]
        );
        assert!(command.libs.is_empty());

        // The shell-string form normalises to the same command.
        let again = parse_command(&split(&CXX_LINE.join(" ")), "dictionary.c", "/git/gdb", &gdb_root());
        assert_eq!(again.command.key(), parsed.command.key());
        assert_eq!(again.target, parsed.target);
    }

    #[test]
    fn test_c_without_language_switch() {
        let mut line = tokens(CXX_LINE);
        line.drain(1..3);
        let parsed = parse_command(&line, "/git/gdb/dictionary.c", "/git/gdb", &gdb_root());

        assert_eq!(parsed.command.tool, "clang");
        assert!(!parsed.command.compile_c_as_cxx);
        assert_eq!(parsed.command.options[0], "-Wall");
        assert_eq!(parsed.command.linkage, Linkage::Object);
    }

    #[test]
    fn test_link_grammar() {
        let line = split(
            "g++ -shared -o libbfd.so -Wl,--version-script=bfd.map -Wl,-soname,libbfd.so.1 \
             -Wl,-O1 -Wl,--as-needed -L../zlib -lz -l m -pthread -m64 -z now bfd.o",
        );
        let parsed = parse_command(&line, "bfd.o", "/git/gdb/bfd", &gdb_root());
        let command = &parsed.command;

        assert_eq!(command.linkage, Linkage::Shared);
        assert_eq!(parsed.target.as_deref(), Some("/git/gdb/bfd/libbfd.so"));
        assert_eq!(
            command.link_options,
            vec![
                "-Wl,--version-script=${CMAKE_SOURCE_DIR}/bfd/bfd.map",
                "-Wl,-soname=${CMAKE_SOURCE_DIR}/bfd/libbfd.so.1",
                "-Wl,--as-needed",
                "-z now",
            ]
        );
        assert_eq!(
            command.libs.iter().collect::<Vec<_>>(),
            vec!["-L../zlib", "z", "m", THREAD_LIBS, "-m64"]
        );
        assert!(command.use_thread);
        assert_eq!(command.options, vec!["-m64"]);
    }

    #[test]
    fn test_soname_names_unnamed_output() {
        let line = split("gcc -shared -Wl,-h,libfoo.so.2 foo.o");
        let parsed = parse_command(&line, "foo.o", "/git/gdb", &gdb_root());
        assert_eq!(parsed.target.as_deref(), Some("/git/gdb/libfoo.so.2"));

        let line = split("gcc main.o");
        let parsed = parse_command(&line, "main.o", "/git/gdb", &gdb_root());
        assert_eq!(parsed.target.as_deref(), Some("/git/gdb/a.out"));
        assert_eq!(parsed.command.linkage, Linkage::Executable);

        let line = split("gcc -c -shared util.c");
        let parsed = parse_command(&line, "util.c", "/git/gdb", &gdb_root());
        assert_eq!(parsed.target.as_deref(), Some("/git/gdb/util.o"));
        assert_eq!(parsed.command.linkage, Linkage::Object);
    }

    #[test]
    fn test_define_normalisation() {
        assert_eq!(normalize_define("NAME"), "NAME");
        assert_eq!(normalize_define("NAME="), "NAME=");
        assert_eq!(normalize_define("V=1.5"), r#"V="1.5""#);
        assert_eq!(normalize_define(r#"V="1.5""#), r#"V="1.5""#);
        assert_eq!(normalize_define("=x"), "=x");
    }

    #[test]
    fn test_archiver() {
        let line = split("/usr/bin/ar cru libbfd.a archive.o bfd.o");
        let parsed = parse_command(&line, "archive.o", "/git/gdb/bfd", &gdb_root());
        assert_eq!(parsed.tool, Tool::Archiver);
        assert_eq!(parsed.command.linkage, Linkage::Static);
        assert_eq!(parsed.target.as_deref(), Some("/git/gdb/bfd/libbfd.a"));

        let line = split("ar t libbfd.a");
        let parsed = parse_command(&line, "libbfd.a", "/git/gdb/bfd", &gdb_root());
        assert_eq!(parsed.target, None);
        assert_eq!(parsed.command.options, vec!["t"]);
    }

    #[test]
    fn test_install_into_named_path() {
        let line = split("/usr/bin/install -c -m 644 ../syscalls/gdb-syscalls.dtd syscalls");
        let parsed = parse_command(
            &line,
            "/git/gdb/syscalls/gdb-syscalls.dtd",
            "/git/gdb/data-directory",
            &gdb_root(),
        );
        let command = &parsed.command;

        assert_eq!(command.linkage, Linkage::Install);
        assert_eq!(command.options, vec!["-c", "-m 644"]);
        assert_eq!(command.install_kind, Some(InstallKind::Files));
        assert_eq!(parsed.target.as_deref(), Some("/git/gdb/data-directory/syscalls"));
        assert_eq!(command.destination.as_deref(), Some("/git/gdb/data-directory/syscalls"));

        let line = split("/usr/bin/install -c /git/gdb/gdb/gdbserver /usr/local/bin/x86_64-pc-linux-gdbserver");
        let parsed = parse_command(&line, "/git/gdb/gdb/gdbserver", "/git/gdb/gdbserver", &gdb_root());
        assert_eq!(parsed.command.options, vec!["-c"]);
        assert_eq!(parsed.target.as_deref(), Some("/usr/local/bin/x86_64-pc-linux-gdbserver"));

        let line = split("install -m 755 gdb /opt/bin/gdb");
        let parsed = parse_command(&line, "gdb", "/git/gdb", &gdb_root());
        assert_eq!(parsed.command.install_kind, Some(InstallKind::Programs));
        assert_eq!(parsed.command.destination.as_deref(), Some("/opt/bin"));
    }

    #[test]
    fn test_install_into_existing_directory() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let dest = dir.path().to_string_lossy().into_owned();
        let line = vec!["install".to_string(), "-c".to_string(), "gdb.1".to_string(), dest.clone()];
        let parsed = parse_command(&line, "gdb.1", "/git/gdb/doc", &gdb_root());

        let dest = salvage_common::normalize(&dest);
        assert_eq!(parsed.target, Some(format!("{}/gdb.1", dest)));
        assert_eq!(parsed.command.destination, Some(dest));
    }

    #[test]
    fn test_install_without_destination() {
        let line = split("install -d");
        let parsed = parse_command(&line, "gdb", "/git/gdb", &gdb_root());
        assert_eq!(parsed.target, None);
        assert_eq!(parsed.command.destination, None);
    }

    #[test]
    fn test_qmake_install() {
        let line = split("/usr/lib/qt5/bin/qmake -install qinstall -exe goldendict /usr/local/bin/goldendict");
        let root = ProjectRoot::new("/git/goldendict");
        let parsed = parse_command(&line, "goldendict", "/git/goldendict", &root);
        let command = &parsed.command;

        assert_eq!(parsed.tool, Tool::Qmake);
        assert_eq!(command.linkage, Linkage::Install);
        assert_eq!(command.install_kind, Some(InstallKind::Programs));
        assert_eq!(command.options, vec!["-install qinstall", "-exe"]);
        assert_eq!(parsed.target.as_deref(), Some("/usr/local/bin/goldendict"));
        assert_eq!(command.destination.as_deref(), Some("/usr/local/bin"));
    }

    #[test]
    fn test_moc() {
        let line = tokens(&[
            "/usr/lib/qt5/bin/moc", "", "-DHAVE_X11", "--include", "build/moc_predefs.h", "",
            "-DPROGRAM_VERSION=\"1.5.0-RC2+git\"", "-I/usr/include", "../mainwindow.hh",
            "-o", "build/moc_mainwindow.cpp",
        ]);
        let root = ProjectRoot::new("/git/goldendict");
        let parsed = parse_command(&line, "/git/goldendict/mainwindow.hh", "/git/goldendict", &root);
        let command = &parsed.command;

        assert_eq!(parsed.tool, Tool::Qt(crate::QtGenerator::Moc));
        assert_eq!(command.linkage, Linkage::Source);
        assert_eq!(parsed.target.as_deref(), Some("/git/goldendict/build/moc_mainwindow.cpp"));
        assert_eq!(command.definitions, vec!["HAVE_X11", r#"PROGRAM_VERSION="1.5.0-RC2+git""#]);
        assert_eq!(command.includes, vec!["/usr/include"]);
        assert!(command.missing_depends.contains("/git/goldendict/build/moc_predefs.h"));
        assert!(command.options.is_empty());
    }

    #[test]
    fn test_single_output_tools() {
        let root = ProjectRoot::new("/git/goldendict");
        let cases = [
            ("lrelease locale/ar_SA.ts -qm locale/ar_SA.qm", Linkage::Locale, "/git/goldendict/locale/ar_SA.qm"),
            ("msgfmt -c -o po/de.gmo po/de.po", Linkage::Locale, "/git/goldendict/po/de.gmo"),
            ("glib-genmarshal --body --output marshal.c marshal.list", Linkage::Source, "/git/goldendict/marshal.c"),
            ("dbus-binding-tool --mode=glib-server --output=server.h api.xml", Linkage::Source, "/git/goldendict/server.h"),
            ("git rev-parse --short HEAD > version.txt", Linkage::Source, "/git/goldendict/version.txt"),
        ];

        for (line, linkage, target) in cases {
            let parsed = parse_command(&split(line), "input", "/git/goldendict", &root);
            assert_eq!(parsed.command.linkage, linkage, "{}", line);
            assert_eq!(parsed.target.as_deref(), Some(target), "{}", line);
        }

        let parsed = parse_command(&split("lrelease a.ts"), "a.ts", "/git/goldendict", &root);
        assert_eq!(parsed.target, None);
    }

    #[test]
    fn test_unknown_flags_pass_through() {
        let line = split("cc -frobnicate --weird=1 -c a.c");
        let parsed = parse_command(&line, "a.c", "/git/gdb", &gdb_root());
        assert_eq!(parsed.command.options, vec!["-frobnicate", "--weird=1"]);
        assert_eq!(parsed.command.linkage, Linkage::Object);
    }
}
