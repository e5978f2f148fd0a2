//! Template inference for families of near-identical rules.
//!
//! Install and generation steps often repeat one rule over many files
//! (`locale/ar_SA.qm`, `locale/ay_WI.qm`, ...). [`PatternEngine`] diffs each
//! new `(target, source)` pair against existing groups and, when the varying
//! parts line up, rewrites the group as a `%(N)s` template pair:
//!
//! ```
//! use salvage_pattern::infer_groups;
//!
//! let groups = infer_groups(
//!     [
//!         ("/usr/local/bin/x86_64-pc-linux-gdb", "/git/gdb/gdb"),
//!         ("/usr/local/bin/x86_64-pc-linux-gcore", "/git/gdb/gcore"),
//!     ],
//!     1,
//! );
//! assert_eq!(groups[0].src_pattern, "/git/gdb/%(0)s");
//! assert_eq!(groups[0].dest_pattern, "/usr/local/bin/x86_64-pc-linux-%(0)s");
//! ```
//!
//! Pairs no group can explain become groups of one.

mod diff;
mod engine;
mod template;

pub use engine::{infer_groups, PatternEngine, PatternGroup, PatternMember};
pub use template::{placeholder, Template};
