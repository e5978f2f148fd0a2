use rustc_hash::FxHashMap;
use serde::Serialize;
use std::hash::Hash;

/// Stable index of a deduplicated command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CommandId(u32);

impl CommandId {
    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for CommandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Structural interner: values are keyed by a frozen form `K`, and the
/// first value seen for a key keeps its index forever.
#[derive(Debug)]
pub struct Interner<K, V> {
    map: FxHashMap<K, CommandId>,
    values: Vec<V>,
}

impl<K, V> Default for Interner<K, V> {
    fn default() -> Self {
        Self {
            map: FxHashMap::default(),
            values: Vec::new(),
        }
    }
}

impl<K: Hash + Eq, V> Interner<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `key`, storing `value` only when the key is new.
    /// The flag is `true` on first sight.
    pub fn intern(&mut self, key: K, value: V) -> (CommandId, bool) {
        if let Some(&id) = self.map.get(&key) {
            return (id, false);
        }

        let id = CommandId(self.values.len() as u32);
        self.values.push(value);
        self.map.insert(key, id);
        (id, true)
    }

    pub fn get(&self, id: CommandId) -> &V {
        &self.values[id.index()]
    }

    pub fn get_mut(&mut self, id: CommandId) -> &mut V {
        &mut self.values[id.index()]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CommandId, &V)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (CommandId(i as u32), v))
    }
}
