//! Dictionary values received on a stream, keyed by dictionary id.

use std::collections::HashMap;

use arrow::array::ArrayData;

/// Dictionary values received so far, keyed by dictionary id.
#[derive(Debug, Clone, Default)]
pub struct DictionaryStore {
    values: HashMap<i64, ArrayData>,
}

impl DictionaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the values for `id`, replacing any earlier dictionary.
    /// Returns `true` if a dictionary was replaced.
    pub fn insert(&mut self, id: i64, values: ArrayData) -> bool {
        self.values.insert(id, values).is_some()
    }

    pub fn get(&self, id: i64) -> Option<&ArrayData> {
        self.values.get(&id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.values.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
