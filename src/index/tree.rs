use std::collections::BTreeMap;

use super::IndexBackend;
use crate::storage::{Key, Tuple};

/// Ordered backend over a balanced search tree. In-order iteration yields
/// ascending key order.
pub struct TreeIndex {
    map: BTreeMap<Key, Tuple>,
}

impl TreeIndex {
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }
}

impl Default for TreeIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexBackend for TreeIndex {
    fn put(&mut self, key: Key, tuple: Tuple) {
        self.map.insert(key, tuple);
    }

    fn get(&self, key: &Key) -> Option<&Tuple> {
        self.map.get(key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn iter<'a>(&'a self) -> Box<dyn Iterator<Item = (&'a Key, &'a Tuple)> + 'a> {
        Box::new(self.map.iter())
    }
}
