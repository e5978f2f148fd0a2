//! Tool-invocation parsing for salvage.
//!
//! A compilation database records each tool run as a flat token list.
//! This crate turns one such list into a [`Command`]: the tool identity,
//! what it produces ([`Linkage`]) and every flag sorted into the bucket a
//! renderer needs (defines, the three include lists, link options,
//! libraries). Dispatch is one grammar per [`Tool`]; unknown tools use
//! the C/C++ driver grammar.
//!
//! ```
//! use salvage_command::{parse_command, Linkage};
//! use salvage_common::ProjectRoot;
//!
//! let tokens: Vec<String> = ["cc", "-c", "-Iconfig", "-DHAVE_CONFIG_H", "dictionary.c"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//! let parsed = parse_command(&tokens, "dictionary.c", "/git/gdb", &ProjectRoot::new("/git/gdb"));
//!
//! assert_eq!(parsed.command.linkage, Linkage::Object);
//! assert_eq!(parsed.command.includes, vec!["/git/gdb/config"]);
//! assert_eq!(parsed.target.as_deref(), Some("/git/gdb/dictionary.o"));
//! ```

mod command;
mod parse;
mod tool;

pub use command::{Command, CommandKey, InstallKind, Linkage, PROJECT_ROOT_VAR, THREAD_LIBS};
pub use parse::{parse_command, resolve_destination, Parsed};
pub use tool::{identify, QtGenerator, Tool};
