//! Target naming.

use rustc_hash::{FxHashMap, FxHashSet};
use salvage_common::sanitize_target_name;

/// Unique target names for one run.
///
/// A key (normally the artifact path) always gets the same name back.
/// Distinct keys that want the same name get `_2`, `_3`, ... in the order
/// they asked.
#[derive(Debug, Default)]
pub struct NameRegistry {
    taken: FxHashSet<String>,
    by_key: FxHashMap<String, String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name for an artifact path, derived from its basename.
    pub fn name_for_path(&mut self, path: &str) -> String {
        if let Some(name) = self.by_key.get(path) {
            return name.clone();
        }
        self.claim(&sanitize_target_name(path), path)
    }

    /// Reserve `name` (or the first free suffixed form) for `key`.
    pub fn claim(&mut self, name: &str, key: &str) -> String {
        if let Some(existing) = self.by_key.get(key) {
            return existing.clone();
        }

        let base = if name.is_empty() { "target" } else { name };
        let mut candidate = base.to_string();
        let mut index = 2;
        while self.taken.contains(&candidate) {
            candidate = format!("{}_{}", base, index);
            index += 1;
        }

        self.taken.insert(candidate.clone());
        self.by_key.insert(key.to_string(), candidate.clone());
        candidate
    }

    pub fn len(&self) -> usize {
        self.taken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}
