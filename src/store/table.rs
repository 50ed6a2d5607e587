//! Separate-chaining hash table keyed by filename.
//!
//! Each bucket owns its entries directly. The table doubles its bucket count
//! once the load passes 75%.

use std::hash::{BuildHasher, RandomState};

const INITIAL_BUCKETS: usize = 16;
const MAX_LOAD_PERCENT: usize = 75;

#[derive(Debug, Clone)]
pub struct FileTable<V> {
    buckets: Vec<Vec<(String, V)>>,
    len: usize,
    hasher: RandomState,
}

impl<V> Default for FileTable<V> {
    fn default() -> Self {
        Self::with_buckets(INITIAL_BUCKETS)
    }
}

impl<V> FileTable<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_buckets(count: usize) -> Self {
        let count = count.max(1);
        Self {
            buckets: (0..count).map(|_| Vec::new()).collect(),
            len: 0,
            hasher: RandomState::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn index(&self, key: &str) -> usize {
        (self.hasher.hash_one(key) as usize) % self.buckets.len()
    }

    /// Insert or replace. Returns `true` when the key was already present.
    pub fn insert(&mut self, key: String, value: V) -> bool {
        let index = self.index(&key);
        let bucket = &mut self.buckets[index];
        if let Some(slot) = bucket.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
            return true;
        }
        bucket.push((key, value));
        self.len += 1;

        if self.len * 100 > self.buckets.len() * MAX_LOAD_PERCENT {
            self.resize(self.buckets.len() * 2);
        }
        false
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.buckets[self.index(key)]
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.buckets
            .iter()
            .flatten()
            .map(|(k, v)| (k.as_str(), v))
    }

    fn resize(&mut self, count: usize) {
        let old = std::mem::replace(
            &mut self.buckets,
            (0..count).map(|_| Vec::new()).collect(),
        );
        for (key, value) in old.into_iter().flatten() {
            let index = self.index(&key);
            self.buckets[index].push((key, value));
        }
    }
}
