mod interner;
mod name;
mod path;

pub use interner::{CommandId, Interner};
pub use name::{is_allowed_name_char, name_by_common_prefix, sanitize_target_name};
pub use path::{basename, dirname, normalize, relative_to, resolve, ProjectRoot};

/// Insertion-ordered set used wherever first-seen order must survive.
pub type OrderedSet<T> = indexmap::IndexSet<T>;

/// Insertion-ordered map used for every graph index.
pub type OrderedMap<K, V> = indexmap::IndexMap<K, V>;
