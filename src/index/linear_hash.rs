use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use log::debug;

use super::IndexBackend;
use crate::storage::{Key, Tuple};

/// Number of buckets before any split round has run.
const INITIAL_BUCKETS: usize = 4;

/// Nominal slots per bucket; growth triggers once the average occupancy
/// crosses [`LOAD_FACTOR`].
const BUCKET_SLOTS: usize = 4;

const LOAD_FACTOR: f64 = 0.75;

/// Hash index that grows by splitting one bucket at a time instead of
/// rehashing the whole table.
///
/// Addressing: `i = hash(key) % m` with `m = INITIAL_BUCKETS * 2^level`;
/// buckets below the split pointer have already been split this round and
/// are readdressed at `hash(key) % 2m`. Once all `m` home buckets are split
/// the round closes: the level rises and the pointer resets.
pub struct LinearHashIndex {
    buckets: Vec<Vec<(Key, Tuple)>>,

    /// Next bucket to split in the current round.
    split: usize,

    /// Completed split rounds. The table holds `INITIAL_BUCKETS << level`
    /// home buckets plus `split` already-split images.
    level: u32,

    count: usize,
}

// construction
impl LinearHashIndex {
    pub fn new() -> Self {
        Self {
            buckets: vec![Vec::new(); INITIAL_BUCKETS],
            split: 0,
            level: 0,
            count: 0,
        }
    }
}

impl Default for LinearHashIndex {
    fn default() -> Self {
        Self::new()
    }
}

// addressing
impl LinearHashIndex {
    fn mod_base(&self) -> usize {
        INITIAL_BUCKETS << self.level
    }

    fn hash(key: &Key) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish() as usize
    }

    fn address(&self, key: &Key) -> usize {
        let h = Self::hash(key);
        let m = self.mod_base();
        let mut i = h % m;
        if i < self.split {
            i = h % (2 * m);
        }
        i
    }

    fn load(&self) -> f64 {
        self.count as f64 / (self.buckets.len() * BUCKET_SLOTS) as f64
    }

    /// Split the bucket at the split pointer, redistributing its entries
    /// between the home bucket and its new image at `split + m`.
    fn split_next(&mut self) {
        let m = self.mod_base();
        self.buckets.push(Vec::new());

        let old = std::mem::take(&mut self.buckets[self.split]);
        for (key, tuple) in old {
            let i = Self::hash(&key) % (2 * m);
            self.buckets[i].push((key, tuple));
        }

        debug!(
            "linear hash split: bucket {} of {} (level {})",
            self.split, m, self.level
        );

        self.split += 1;
        if self.split == m {
            self.split = 0;
            self.level += 1;
        }
    }
}

impl IndexBackend for LinearHashIndex {
    fn put(&mut self, key: Key, tuple: Tuple) {
        let i = self.address(&key);
        let bucket = &mut self.buckets[i];
        if let Some(slot) = bucket.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = tuple;
            return;
        }
        bucket.push((key, tuple));
        self.count += 1;

        if self.load() > LOAD_FACTOR {
            self.split_next();
        }
    }

    fn get(&self, key: &Key) -> Option<&Tuple> {
        self.buckets[self.address(key)]
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, tuple)| tuple)
    }

    fn len(&self) -> usize {
        self.count
    }

    fn iter<'a>(&'a self) -> Box<dyn Iterator<Item = (&'a Key, &'a Tuple)> + 'a> {
        Box::new(
            self.buckets
                .iter()
                .flatten()
                .map(|(key, tuple)| (key, tuple)),
        )
    }
}
