use std::collections::HashMap;

/// The in-memory index: every mutation that has reached the intent log but
/// not yet a segment. A delete is plain removal; no tombstones are kept.
///
/// Key order is irrelevant (segments are written unsorted and scanned
/// linearly), so the map is a `HashMap` rather than an ordered tree.
#[derive(Debug, Default)]
pub struct MemIndex {
    map: HashMap<Vec<u8>, Vec<u8>>,
}

impl MemIndex {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Insert-or-replace.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.map.insert(key, value);
    }

    /// Removes the key, returning whether it was present.
    pub fn delete(&mut self, key: &[u8]) -> bool {
        self.map.remove(key).is_some()
    }

    pub fn get(&self, key: &[u8]) -> Option<&Vec<u8>> {
        self.map.get(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Takes every entry out, leaving the index empty. Used by flush to
    /// snapshot the unflushed state in one move.
    pub fn drain(&mut self) -> HashMap<Vec<u8>, Vec<u8>> {
        std::mem::take(&mut self.map)
    }
}
